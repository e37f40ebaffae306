use super::tracker::VisibilityEvent;

/// How close to the end of the loaded list an intersecting item must be
/// before another page is requested.
pub const DEFAULT_PREFETCH_DISTANCE: usize = 2;

/// `index >= item_count - distance`, without underflow.
pub fn should_prefetch(index: usize, item_count: usize, distance: usize) -> bool {
    index + distance >= item_count
}

/// True when any intersecting event in the batch is near the end. Callers
/// fire at most one load-more per batch.
pub fn batch_triggers(events: &[VisibilityEvent], item_count: usize, distance: usize) -> bool {
    events
        .iter()
        .any(|e| e.is_intersecting && should_prefetch(e.index, item_count, distance))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(index: usize, is_intersecting: bool) -> VisibilityEvent {
        VisibilityEvent {
            index,
            is_intersecting,
            intersection_ratio: if is_intersecting { 0.5 } else { 0.0 },
        }
    }

    #[test]
    fn triggers_within_two_of_the_end() {
        assert!(should_prefetch(8, 10, 2));
        assert!(should_prefetch(9, 10, 2));
        assert!(!should_prefetch(7, 10, 2));
    }

    #[test]
    fn short_lists_always_trigger() {
        assert!(should_prefetch(0, 1, 2));
        assert!(should_prefetch(0, 2, 2));
    }

    #[test]
    fn only_intersecting_events_count() {
        assert!(!batch_triggers(&[event(9, false)], 10, 2));
        assert!(batch_triggers(&[event(3, true), event(8, true)], 10, 2));
        assert!(!batch_triggers(&[event(7, true)], 10, 2));
    }

    #[test]
    fn distance_is_configurable() {
        assert!(batch_triggers(&[event(5, true)], 10, 5));
        assert!(!batch_triggers(&[event(5, true)], 10, 4));
    }
}
