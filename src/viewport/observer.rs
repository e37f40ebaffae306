use super::error::ViewportError;
use super::layout::LayoutFrame;

/// Stable identity of a rendered marker, independent of its position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MarkerKey(pub u64);

/// Observation settings for one observer instance.
#[derive(Debug, Clone, PartialEq)]
pub struct ObserverOptions {
    /// Visibility ratios at which a fresh notification is delivered.
    pub thresholds: Vec<f64>,
    /// Rows added above and below the viewport before intersecting.
    pub root_margin: u16,
}

impl ObserverOptions {
    pub const DEFAULT_THRESHOLDS: [f64; 3] = [0.1, 0.5, 0.7];

    pub fn new(thresholds: impl Into<Vec<f64>>, root_margin: u16) -> Self {
        Self {
            thresholds: normalize_thresholds(thresholds.into()),
            root_margin,
        }
    }
}

impl Default for ObserverOptions {
    fn default() -> Self {
        Self::new(Self::DEFAULT_THRESHOLDS, 0)
    }
}

/// Clamp to `[0, 1]`, drop NaN, sort ascending and dedupe.
fn normalize_thresholds(mut thresholds: Vec<f64>) -> Vec<f64> {
    thresholds.retain(|t| !t.is_nan());
    for t in &mut thresholds {
        *t = t.clamp(0.0, 1.0);
    }
    thresholds.sort_by(f64::total_cmp);
    thresholds.dedup();
    thresholds
}

/// One raw notification for a single marker.
#[derive(Debug, Clone, PartialEq)]
pub struct ObservationEntry {
    pub target: MarkerKey,
    /// The marker's index attribute as rendered, unparsed.
    pub data_index: Option<String>,
    pub is_intersecting: bool,
    pub intersection_ratio: f64,
}

/// A live observation of a set of markers.
pub trait Observer {
    fn observe(&mut self, target: MarkerKey);
    fn unobserve(&mut self, target: MarkerKey);
    /// Stops all observation. A disconnected observer never reports again.
    fn disconnect(&mut self);
    /// Called after each layout pass. Returns the batch of entries whose
    /// targets crossed a threshold, in delivery order.
    fn measure(&mut self, frame: &LayoutFrame) -> Vec<ObservationEntry>;
}

/// Host capability that creates observers.
pub trait ObservationService {
    fn create_observer(
        &self,
        options: &ObserverOptions,
    ) -> Result<Box<dyn Observer>, ViewportError>;
}

/// A host without any visibility primitive.
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledObservationService;

impl ObservationService for DisabledObservationService {
    fn create_observer(
        &self,
        _options: &ObserverOptions,
    ) -> Result<Box<dyn Observer>, ViewportError> {
        Err(ViewportError::CapabilityAbsent)
    }
}
