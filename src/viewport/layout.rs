//! Layout-pass observation for row-based hosts.
//!
//! After every layout pass the host reports the viewport and the bounds of
//! each rendered marker in content rows. The observer compares each marker's
//! visible fraction with the last value it reported and emits an entry only
//! when a threshold was crossed or intersection started or stopped.

use std::collections::{HashMap, HashSet};

use super::error::ViewportError;
use super::observer::{MarkerKey, ObservationEntry, ObservationService, Observer, ObserverOptions};

/// A vertical span of rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RowRange {
    pub top: usize,
    pub height: usize,
}

impl RowRange {
    pub const fn new(top: usize, height: usize) -> Self {
        Self { top, height }
    }

    pub const fn bottom(&self) -> usize {
        self.top + self.height
    }

    /// Number of rows shared with `other`.
    pub fn overlap(&self, other: &RowRange) -> usize {
        let top = self.top.max(other.top);
        let bottom = self.bottom().min(other.bottom());
        bottom.saturating_sub(top)
    }

    fn expand(&self, margin: usize) -> RowRange {
        let top = self.top.saturating_sub(margin);
        RowRange {
            top,
            height: self.bottom() + margin - top,
        }
    }
}

/// A rendered marker: its identity, its index attribute and its bounds.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerLayout {
    pub key: MarkerKey,
    pub data_index: String,
    pub bounds: RowRange,
}

/// The result of one layout pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LayoutFrame {
    pub viewport: RowRange,
    pub markers: Vec<MarkerLayout>,
}

impl LayoutFrame {
    pub fn new(viewport: RowRange) -> Self {
        Self {
            viewport,
            markers: Vec::new(),
        }
    }

    pub fn with_marker(
        mut self,
        key: MarkerKey,
        data_index: impl Into<String>,
        bounds: RowRange,
    ) -> Self {
        self.markers.push(MarkerLayout {
            key,
            data_index: data_index.into(),
            bounds,
        });
        self
    }
}

#[derive(Debug, Clone)]
struct Reported {
    ratio: f64,
    intersecting: bool,
    data_index: String,
}

/// Number of thresholds at or below `ratio`.
fn threshold_bucket(thresholds: &[f64], ratio: f64) -> usize {
    thresholds.iter().filter(|&&t| ratio >= t).count()
}

fn measure_bounds(bounds: &RowRange, root: &RowRange) -> (f64, bool) {
    if bounds.height == 0 {
        return (0.0, false);
    }
    let overlap = bounds.overlap(root);
    let ratio = overlap as f64 / bounds.height as f64;
    (ratio, overlap > 0)
}

pub struct LayoutObserver {
    options: ObserverOptions,
    // None until the first measurement after observe().
    targets: HashMap<MarkerKey, Option<Reported>>,
    connected: bool,
}

impl LayoutObserver {
    pub fn new(options: ObserverOptions) -> Self {
        Self {
            options,
            targets: HashMap::new(),
            connected: true,
        }
    }
}

impl Observer for LayoutObserver {
    fn observe(&mut self, target: MarkerKey) {
        if self.connected {
            self.targets.entry(target).or_insert(None);
        }
    }

    fn unobserve(&mut self, target: MarkerKey) {
        self.targets.remove(&target);
    }

    fn disconnect(&mut self) {
        self.targets.clear();
        self.connected = false;
    }

    fn measure(&mut self, frame: &LayoutFrame) -> Vec<ObservationEntry> {
        if !self.connected {
            return Vec::new();
        }

        let root = frame.viewport.expand(usize::from(self.options.root_margin));
        let thresholds = &self.options.thresholds;
        let mut entries = Vec::new();
        let mut laid_out = HashSet::with_capacity(frame.markers.len());

        for marker in &frame.markers {
            laid_out.insert(marker.key);
            let Some(last) = self.targets.get_mut(&marker.key) else {
                continue;
            };
            let (ratio, intersecting) = measure_bounds(&marker.bounds, &root);
            let changed = match last {
                None => true,
                Some(prev) => {
                    prev.intersecting != intersecting
                        || threshold_bucket(thresholds, prev.ratio)
                            != threshold_bucket(thresholds, ratio)
                        || prev.data_index != marker.data_index
                }
            };
            if changed {
                *last = Some(Reported {
                    ratio,
                    intersecting,
                    data_index: marker.data_index.clone(),
                });
                entries.push(ObservationEntry {
                    target: marker.key,
                    data_index: Some(marker.data_index.clone()),
                    is_intersecting: intersecting,
                    intersection_ratio: ratio,
                });
            }
        }

        // Observed markers missing from the pass are no longer on screen.
        let mut vanished: Vec<_> = self
            .targets
            .iter_mut()
            .filter(|(key, _)| !laid_out.contains(*key))
            .filter_map(|(key, last)| match last {
                Some(prev) if prev.intersecting => {
                    prev.intersecting = false;
                    prev.ratio = 0.0;
                    Some(ObservationEntry {
                        target: *key,
                        data_index: Some(prev.data_index.clone()),
                        is_intersecting: false,
                        intersection_ratio: 0.0,
                    })
                }
                _ => None,
            })
            .collect();
        vanished.sort_by_key(|entry| entry.target);
        entries.extend(vanished);

        entries
    }
}

/// Creates [`LayoutObserver`]s.
#[derive(Debug, Default, Clone, Copy)]
pub struct LayoutObservationService;

impl ObservationService for LayoutObservationService {
    fn create_observer(
        &self,
        options: &ObserverOptions,
    ) -> Result<Box<dyn Observer>, ViewportError> {
        Ok(Box::new(LayoutObserver::new(options.clone())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cards(viewport: RowRange, count: u64, height: usize) -> LayoutFrame {
        (0..count).fold(LayoutFrame::new(viewport), |frame, i| {
            frame.with_marker(
                MarkerKey(i),
                i.to_string(),
                RowRange::new(i as usize * height, height),
            )
        })
    }

    fn observer_for(count: u64) -> LayoutObserver {
        let mut observer = LayoutObserver::new(ObserverOptions::default());
        for i in 0..count {
            observer.observe(MarkerKey(i));
        }
        observer
    }

    #[test]
    fn overlap_counts_shared_rows() {
        let a = RowRange::new(0, 10);
        assert_eq!(a.overlap(&RowRange::new(5, 10)), 5);
        assert_eq!(a.overlap(&RowRange::new(10, 3)), 0);
        assert_eq!(a.overlap(&RowRange::new(2, 3)), 3);
    }

    #[test]
    fn first_pass_reports_every_observed_marker() {
        let mut observer = observer_for(4);
        let entries = observer.measure(&cards(RowRange::new(0, 10), 4, 5));

        assert_eq!(entries.len(), 4);
        let intersecting: Vec<_> = entries
            .iter()
            .filter(|e| e.is_intersecting)
            .map(|e| e.target)
            .collect();
        assert_eq!(intersecting, vec![MarkerKey(0), MarkerKey(1)]);
        assert_eq!(entries[0].intersection_ratio, 1.0);
        assert_eq!(entries[0].data_index.as_deref(), Some("0"));
    }

    #[test]
    fn unchanged_pass_reports_nothing() {
        let mut observer = observer_for(4);
        let frame = cards(RowRange::new(0, 10), 4, 5);
        observer.measure(&frame);

        assert!(observer.measure(&frame).is_empty());
    }

    #[test]
    fn movement_within_a_threshold_band_is_silent() {
        let mut observer = observer_for(1);
        // 10 row card: 8 rows visible (0.8), then 9 rows (0.9). Both above 0.7.
        observer.measure(&cards(RowRange::new(2, 20), 1, 10));
        let entries = observer.measure(&cards(RowRange::new(1, 20), 1, 10));
        assert!(entries.is_empty());
    }

    #[test]
    fn crossing_a_threshold_notifies() {
        let mut observer = observer_for(1);
        observer.measure(&cards(RowRange::new(2, 20), 1, 10)); // 0.8
        let entries = observer.measure(&cards(RowRange::new(6, 20), 1, 10)); // 0.4

        assert_eq!(entries.len(), 1);
        assert!(entries[0].is_intersecting);
        assert!((entries[0].intersection_ratio - 0.4).abs() < f64::EPSILON);
    }

    #[test]
    fn leaving_the_viewport_notifies() {
        let mut observer = observer_for(2);
        observer.measure(&cards(RowRange::new(0, 5), 2, 5));
        let entries = observer.measure(&cards(RowRange::new(5, 5), 2, 5));

        let left = entries.iter().find(|e| e.target == MarkerKey(0)).unwrap();
        assert!(!left.is_intersecting);
        assert_eq!(left.intersection_ratio, 0.0);
        let entered = entries.iter().find(|e| e.target == MarkerKey(1)).unwrap();
        assert!(entered.is_intersecting);
    }

    #[test]
    fn root_margin_extends_the_viewport() {
        let mut observer = LayoutObserver::new(ObserverOptions::new(vec![0.1], 3));
        observer.observe(MarkerKey(1));
        // Card starts two rows below the viewport, margin reaches three rows.
        let frame = LayoutFrame::new(RowRange::new(0, 10)).with_marker(
            MarkerKey(1),
            "1",
            RowRange::new(12, 5),
        );
        let entries = observer.measure(&frame);
        assert!(entries[0].is_intersecting);
        assert!((entries[0].intersection_ratio - 0.2).abs() < f64::EPSILON);
    }

    #[test]
    fn unobserved_markers_are_ignored() {
        let mut observer = observer_for(1);
        let entries = observer.measure(&cards(RowRange::new(0, 20), 3, 5));
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].target, MarkerKey(0));
    }

    #[test]
    fn markers_missing_from_the_pass_lose_intersection() {
        let mut observer = observer_for(2);
        observer.measure(&cards(RowRange::new(0, 10), 2, 5));
        let entries = observer.measure(&cards(RowRange::new(0, 10), 1, 5));

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].target, MarkerKey(1));
        assert!(!entries[0].is_intersecting);
        assert_eq!(entries[0].data_index.as_deref(), Some("1"));
    }

    #[test]
    fn index_attribute_change_is_reported() {
        let mut observer = observer_for(1);
        observer.measure(&cards(RowRange::new(0, 10), 1, 5));
        let frame = LayoutFrame::new(RowRange::new(0, 10)).with_marker(
            MarkerKey(0),
            "3",
            RowRange::new(0, 5),
        );
        let entries = observer.measure(&frame);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].data_index.as_deref(), Some("3"));
    }

    #[test]
    fn disconnected_observer_stays_silent() {
        let mut observer = observer_for(2);
        observer.disconnect();
        observer.observe(MarkerKey(0));
        assert!(observer.measure(&cards(RowRange::new(0, 10), 2, 5)).is_empty());
    }

    #[test]
    fn zero_height_marker_never_intersects() {
        let mut observer = observer_for(1);
        let frame = LayoutFrame::new(RowRange::new(0, 10)).with_marker(
            MarkerKey(0),
            "0",
            RowRange::new(3, 0),
        );
        let entries = observer.measure(&frame);
        assert!(!entries[0].is_intersecting);
    }
}
