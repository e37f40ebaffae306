use std::collections::HashMap;

use tracing::warn;

use super::VisibleSet;
use super::error::ViewportError;
use super::observer::{MarkerKey, ObservationEntry};
use super::prefetch;

/// A normalized observation entry, addressed by list index.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisibilityEvent {
    pub index: usize,
    pub is_intersecting: bool,
    pub intersection_ratio: f64,
}

/// What one batch produced.
#[derive(Debug, Default)]
pub struct BatchOutcome {
    /// Well-formed events in delivery order.
    pub events: Vec<VisibilityEvent>,
    pub load_more: bool,
}

/// Keeps the most recent event per marker and derives the visible set from it.
#[derive(Debug, Default)]
pub struct IntersectionTracker {
    latest: HashMap<MarkerKey, VisibilityEvent>,
    visible: VisibleSet,
}

impl IntersectionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn visible(&self) -> &VisibleSet {
        &self.visible
    }

    /// Normalizes a raw batch, recomputes the visible set and evaluates the
    /// prefetch predicate. Malformed entries are skipped.
    pub fn apply(
        &mut self,
        batch: &[ObservationEntry],
        item_count: usize,
        prefetch_distance: usize,
    ) -> BatchOutcome {
        let mut events = Vec::with_capacity(batch.len());
        for entry in batch {
            let Some(index) = parse_index(entry, item_count) else {
                let err = ViewportError::MalformedMarker {
                    target: entry.target,
                    raw: entry.data_index.clone(),
                };
                warn!(error = %err, "skipping observation entry");
                continue;
            };
            let event = VisibilityEvent {
                index,
                is_intersecting: entry.is_intersecting,
                intersection_ratio: entry.intersection_ratio.clamp(0.0, 1.0),
            };
            self.latest.insert(entry.target, event);
            events.push(event);
        }
        self.recompute();

        let load_more = prefetch::batch_triggers(&events, item_count, prefetch_distance);
        BatchOutcome { events, load_more }
    }

    /// Applies a new item list: forgets markers that are gone and moves the
    /// rest to their new positions.
    pub fn relist(&mut self, positions: &HashMap<MarkerKey, usize>) {
        self.latest.retain(|key, event| match positions.get(key) {
            Some(&index) => {
                event.index = index;
                true
            }
            None => false,
        });
        self.recompute();
    }

    /// Marks every listed marker as fully visible.
    pub fn fill(&mut self, positions: &HashMap<MarkerKey, usize>) {
        self.latest = positions
            .iter()
            .map(|(&key, &index)| {
                let event = VisibilityEvent {
                    index,
                    is_intersecting: true,
                    intersection_ratio: 1.0,
                };
                (key, event)
            })
            .collect();
        self.recompute();
    }

    /// Highest-ratio visible index, lowest index on ties.
    pub fn most_visible(&self) -> Option<usize> {
        self.latest
            .values()
            .filter(|e| e.is_intersecting)
            .max_by(|a, b| {
                a.intersection_ratio
                    .total_cmp(&b.intersection_ratio)
                    .then(b.index.cmp(&a.index))
            })
            .map(|e| e.index)
    }

    pub fn reset(&mut self) {
        self.latest.clear();
        self.visible.clear();
    }

    fn recompute(&mut self) {
        self.visible = self
            .latest
            .values()
            .filter(|e| e.is_intersecting)
            .map(|e| e.index)
            .collect();
    }
}

fn parse_index(entry: &ObservationEntry, item_count: usize) -> Option<usize> {
    entry
        .data_index
        .as_deref()?
        .trim()
        .parse::<usize>()
        .ok()
        .filter(|&index| index < item_count)
}
