//! Feed viewport controller.
//!
//! Turns layout-level visibility of feed cards into index-based events: which
//! items are visible, which single item is "current", and when the feed should
//! load another page. The observation primitive is injected through
//! [`ObservationService`]; the controller itself performs no I/O.

mod controller;
mod error;
mod layout;
mod observer;
mod prefetch;
mod selector;
mod tracker;

use std::collections::BTreeSet;

pub use controller::{FeedItem, FeedViewport, MountId, ViewportCallbacks};
pub use layout::{LayoutFrame, LayoutObservationService, RowRange};
pub use observer::{DisabledObservationService, MarkerKey, ObservationService, ObserverOptions};
pub use prefetch::{DEFAULT_PREFETCH_DISTANCE, should_prefetch};

/// Indices of the items currently intersecting the viewport.
pub type VisibleSet = BTreeSet<usize>;
