use super::tracker::{IntersectionTracker, VisibilityEvent};

/// The most visible intersecting entry of a batch. Comparison is strict, so
/// among equal ratios the first in delivery order wins. Entries reporting a
/// ratio of zero are never selected.
pub fn select_current(events: &[VisibilityEvent]) -> Option<usize> {
    let mut highest_ratio = 0.0;
    let mut current = None;
    for event in events {
        if event.is_intersecting && event.intersection_ratio > highest_ratio {
            highest_ratio = event.intersection_ratio;
            current = Some(event.index);
        }
    }
    current
}

/// Holds the current index across batches.
///
/// A batch without an intersecting entry leaves the selection alone. The one
/// exception is a current item that has left a still non-empty visible set:
/// it is replaced by the most visible remaining item so the selection always
/// points at something on screen.
#[derive(Debug, Default)]
pub struct CurrentSelector {
    current: Option<usize>,
}

impl CurrentSelector {
    pub fn current(&self) -> Option<usize> {
        self.current
    }

    /// Returns the index to announce, if any.
    pub fn update(
        &mut self,
        events: &[VisibilityEvent],
        tracker: &IntersectionTracker,
    ) -> Option<usize> {
        if let Some(index) = select_current(events) {
            self.current = Some(index);
            return Some(index);
        }
        self.repair(tracker)
    }

    /// Re-points the selection after the item list changed. `moved` is the
    /// new position of the previously current item, if it is still listed.
    /// When it was removed, the selection falls to `neighbour`, the closest
    /// surviving item, and is announced even if the index did not change.
    pub fn relist(
        &mut self,
        moved: Option<usize>,
        neighbour: Option<usize>,
        tracker: &IntersectionTracker,
    ) -> Option<usize> {
        let before = self.current;
        let removed = before.is_some() && moved.is_none();
        self.current = moved.or(neighbour);
        let repaired = self.repair(tracker);
        match (before, self.current) {
            (Some(_), Some(new)) if removed => Some(new),
            (Some(old), Some(new)) if old != new => Some(new),
            (None, Some(new)) => Some(new),
            _ => repaired,
        }
    }

    pub fn reset(&mut self) {
        self.current = None;
    }

    fn repair(&mut self, tracker: &IntersectionTracker) -> Option<usize> {
        let visible = tracker.visible();
        if visible.is_empty() {
            return None;
        }
        if self.current.is_some_and(|index| visible.contains(&index)) {
            return None;
        }
        let replacement = tracker.most_visible()?;
        self.current = Some(replacement);
        Some(replacement)
    }
}
