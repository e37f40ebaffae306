use std::collections::{HashMap, HashSet};

use anyhow::Result;
use tracing::{debug, trace, warn};

use super::VisibleSet;
use super::error::ViewportError;
use super::layout::LayoutFrame;
use super::observer::{MarkerKey, ObservationEntry, ObservationService, Observer, ObserverOptions};
use super::prefetch::DEFAULT_PREFETCH_DISTANCE;
use super::selector::CurrentSelector;
use super::tracker::IntersectionTracker;

/// Anything the feed can list. Only the marker key is ever inspected.
pub trait FeedItem {
    fn marker_key(&self) -> MarkerKey;
}

impl FeedItem for MarkerKey {
    fn marker_key(&self) -> MarkerKey {
        *self
    }
}

/// Identifies one mount cycle. Batches tagged with an older mount are dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MountId(u64);

impl MountId {
    pub fn get(self) -> u64 {
        self.0
    }
}

type VisibilityCallback = Box<dyn FnMut(&VisibleSet) -> Result<()>>;
type IndexCallback = Box<dyn FnMut(usize) -> Result<()>>;
type LoadMoreCallback = Box<dyn FnMut() -> Result<()>>;

/// Consumer callbacks. An `Err` is logged and the pipeline carries on with
/// the rest of the batch.
///
/// Panics are not caught: a callback that panics unwinds through
/// [`FeedViewport`] and takes the caller down with it. Callbacks report
/// failure by returning an error.
pub struct ViewportCallbacks {
    on_visibility_change: VisibilityCallback,
    on_current_index_change: IndexCallback,
    on_load_more: LoadMoreCallback,
}

impl Default for ViewportCallbacks {
    fn default() -> Self {
        Self {
            on_visibility_change: Box::new(|_| Ok(())),
            on_current_index_change: Box::new(|_| Ok(())),
            on_load_more: Box::new(|| Ok(())),
        }
    }
}

impl ViewportCallbacks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_visibility_change(
        mut self,
        callback: impl FnMut(&VisibleSet) -> Result<()> + 'static,
    ) -> Self {
        self.on_visibility_change = Box::new(callback);
        self
    }

    pub fn on_current_index_change(
        mut self,
        callback: impl FnMut(usize) -> Result<()> + 'static,
    ) -> Self {
        self.on_current_index_change = Box::new(callback);
        self
    }

    /// Called once per batch that brings an item near the end of the list
    /// into view. Must tolerate repeated calls.
    pub fn on_load_more(mut self, callback: impl FnMut() -> Result<()> + 'static) -> Self {
        self.on_load_more = Box::new(callback);
        self
    }
}

enum Lifecycle {
    Unmounted,
    Active {
        mount: MountId,
        observer: Box<dyn Observer>,
    },
    /// Mounted without an observation capability: every item counts as visible.
    Degraded { mount: MountId },
}

/// Owns the observer lifecycle and turns observation batches into
/// visibility, current-item and load-more callbacks.
pub struct FeedViewport {
    service: Box<dyn ObservationService>,
    options: ObserverOptions,
    prefetch_distance: usize,
    callbacks: ViewportCallbacks,
    lifecycle: Lifecycle,
    next_mount: u64,
    keys: Vec<MarkerKey>,
    attached: HashSet<MarkerKey>,
    tracker: IntersectionTracker,
    selector: CurrentSelector,
}

impl FeedViewport {
    pub fn new(
        service: Box<dyn ObservationService>,
        options: ObserverOptions,
        callbacks: ViewportCallbacks,
    ) -> Self {
        Self {
            service,
            options,
            prefetch_distance: DEFAULT_PREFETCH_DISTANCE,
            callbacks,
            lifecycle: Lifecycle::Unmounted,
            next_mount: 1,
            keys: Vec::new(),
            attached: HashSet::new(),
            tracker: IntersectionTracker::new(),
            selector: CurrentSelector::default(),
        }
    }

    pub fn with_prefetch_distance(mut self, distance: usize) -> Self {
        self.prefetch_distance = distance;
        self
    }

    /// Creates a fresh observer and attaches every item. Mounting while
    /// already mounted unmounts first.
    pub fn mount<T: FeedItem>(&mut self, items: &[T]) -> MountId {
        if !matches!(self.lifecycle, Lifecycle::Unmounted) {
            self.unmount();
        }

        let mount = MountId(self.next_mount);
        self.next_mount += 1;
        self.keys.clear();
        self.attached.clear();
        self.tracker.reset();
        self.selector.reset();

        self.lifecycle = match self.service.create_observer(&self.options) {
            Ok(observer) => {
                debug!(mount = mount.0, "viewport mounted");
                Lifecycle::Active { mount, observer }
            }
            Err(err) => {
                warn!(error = %err, mount = mount.0, "treating every item as visible");
                Lifecycle::Degraded { mount }
            }
        };
        self.set_items(items);
        mount
    }

    /// Disconnects the observer. Later batches are ignored.
    pub fn unmount(&mut self) {
        match std::mem::replace(&mut self.lifecycle, Lifecycle::Unmounted) {
            Lifecycle::Active {
                mount,
                mut observer,
            } => {
                observer.disconnect();
                debug!(mount = mount.0, "viewport unmounted");
            }
            Lifecycle::Degraded { mount } => {
                debug!(mount = mount.0, "degraded viewport unmounted");
            }
            Lifecycle::Unmounted => return,
        }
        self.attached.clear();
        self.tracker.reset();
        self.selector.reset();
    }

    /// Re-derives observation for a new item list: new markers are observed,
    /// removed ones unobserved, survivors keep their registration.
    pub fn set_items<T: FeedItem>(&mut self, items: &[T]) {
        let keys: Vec<MarkerKey> = items.iter().map(FeedItem::marker_key).collect();
        let positions: HashMap<MarkerKey, usize> = keys
            .iter()
            .enumerate()
            .rev()
            .map(|(index, &key)| (key, index))
            .collect();
        let previous = std::mem::replace(&mut self.keys, keys);
        let current_before = self.selector.current();
        let current_key = current_before.and_then(|index| previous.get(index).copied());
        let neighbour =
            current_before.and_then(|index| nearest_survivor(&previous, index, &positions));

        match &mut self.lifecycle {
            Lifecycle::Unmounted => return,
            Lifecycle::Active { observer, .. } => {
                let mut removed: Vec<_> = self
                    .attached
                    .iter()
                    .filter(|key| !positions.contains_key(key))
                    .copied()
                    .collect();
                removed.sort();
                for key in removed {
                    observer.unobserve(key);
                    self.attached.remove(&key);
                }
                for &key in &self.keys {
                    if self.attached.insert(key) {
                        observer.observe(key);
                    }
                }
                self.tracker.relist(&positions);
            }
            Lifecycle::Degraded { .. } => self.tracker.fill(&positions),
        }
        trace!(items = self.keys.len(), attached = self.attached.len(), "items relisted");

        let visible_before = self.tracker.visible().clone();
        let moved = current_key.and_then(|key| positions.get(&key).copied());
        let announce = self.selector.relist(moved, neighbour, &self.tracker);
        if self.tracker.visible() != &visible_before || self.keys.len() != previous.len() {
            self.emit_visibility();
        }
        if let Some(index) = announce {
            self.emit_current(index);
        }
    }

    /// Feeds a layout pass to the active observer and processes the batch
    /// it produces. Passes reported against an older mount are ignored.
    pub fn on_layout(&mut self, mount: MountId, frame: &LayoutFrame) {
        let batch = match &mut self.lifecycle {
            Lifecycle::Active {
                mount: active,
                observer,
            } if *active == mount => observer.measure(frame),
            _ => {
                trace!(mount = mount.0, "ignoring layout pass for inactive mount");
                return;
            }
        };
        if !batch.is_empty() {
            self.deliver(mount, batch);
        }
    }

    /// Processes one batch to completion. Batches for a mount that is no
    /// longer active are dropped.
    pub fn deliver(&mut self, mount: MountId, batch: Vec<ObservationEntry>) {
        match self.lifecycle {
            Lifecycle::Active { mount: active, .. } if active == mount => {}
            _ => {
                trace!(mount = mount.0, "dropping batch for inactive mount");
                return;
            }
        }

        let outcome = self
            .tracker
            .apply(&batch, self.keys.len(), self.prefetch_distance);
        self.emit_visibility();
        if let Some(index) = self.selector.update(&outcome.events, &self.tracker) {
            self.emit_current(index);
        }
        if outcome.load_more {
            self.emit_load_more();
        }
    }

    pub fn visible(&self) -> &VisibleSet {
        self.tracker.visible()
    }

    pub fn current_index(&self) -> Option<usize> {
        self.selector.current()
    }

    pub fn mount_id(&self) -> Option<MountId> {
        match self.lifecycle {
            Lifecycle::Active { mount, .. } | Lifecycle::Degraded { mount } => Some(mount),
            Lifecycle::Unmounted => None,
        }
    }

    #[cfg_attr(not(test), allow(dead_code))]
    pub fn is_mounted(&self) -> bool {
        self.mount_id().is_some()
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self.lifecycle, Lifecycle::Degraded { .. })
    }

    pub fn prefetch_distance(&self) -> usize {
        self.prefetch_distance
    }

    pub fn item_count(&self) -> usize {
        self.keys.len()
    }

    pub fn attached_count(&self) -> usize {
        self.attached.len()
    }

    fn emit_visibility(&mut self) {
        if let Err(source) = (self.callbacks.on_visibility_change)(self.tracker.visible()) {
            report(ViewportError::CallbackFailed {
                callback: "on_visibility_change",
                source,
            });
        }
    }

    fn emit_current(&mut self, index: usize) {
        if let Err(source) = (self.callbacks.on_current_index_change)(index) {
            report(ViewportError::CallbackFailed {
                callback: "on_current_index_change",
                source,
            });
        }
    }

    fn emit_load_more(&mut self) {
        if let Err(source) = (self.callbacks.on_load_more)() {
            report(ViewportError::CallbackFailed {
                callback: "on_load_more",
                source,
            });
        }
    }
}

impl Drop for FeedViewport {
    fn drop(&mut self) {
        self.unmount();
    }
}

/// New position of the closest item after `index` that is still listed,
/// falling back to the closest one before it.
fn nearest_survivor(
    previous: &[MarkerKey],
    index: usize,
    positions: &HashMap<MarkerKey, usize>,
) -> Option<usize> {
    let split = (index + 1).min(previous.len());
    let before = &previous[..index.min(previous.len())];
    previous[split..]
        .iter()
        .chain(before.iter().rev())
        .find_map(|key| positions.get(key).copied())
}

fn report(err: ViewportError) {
    warn!(error = %err, "viewport callback failed");
}
