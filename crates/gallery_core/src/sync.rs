//! Scroll synchronization between the pager and the thumbnail strip
//!
//! Each side reports where it came to rest; the synchronizer moves the other
//! side there. Events are handled one at a time from a queue, so an event
//! raised by a command (the pager reporting the page it was just told to
//! show) is handled after the current transition and finds `current_index`
//! already at its target.

use crate::pager::PagedViewer;
use crate::strip::ThumbnailStrip;
use std::collections::VecDeque;

/// Events consumed by the synchronizer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncEvent {
    /// Pager settled on a page
    PageSelected(usize),
    /// User started dragging the strip
    StripDragStarted,
    /// Strip came to rest with this thumb nearest its centre
    StripSettled(usize),
    /// Strip returned to idle
    StripIdle,
    /// User tapped a thumb
    ThumbTapped(usize),
}

/// Which side triggered the last cross-controller command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncOrigin {
    #[default]
    None,
    PagedViewer,
    ThumbnailStrip,
}

/// Synchronizer state. `current_index` always equals the selected thumb.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncState {
    pub current_index: usize,
    pub last_origin: SyncOrigin,
}

/// Why an event was discarded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    /// The popup was dismissed
    TornDown,
    /// The index is outside the item list
    OutOfBounds(usize),
}

/// Outcome of handling one event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// `current_index` moved
    Applied { index: usize, origin: SyncOrigin },
    /// Already at the target
    Ignored,
    /// Pager swipe locked for a strip drag
    Locked,
    Unlocked,
    /// A thumb tap was handed to the pager
    Forwarded(usize),
    Dropped(DropReason),
}

/// Keeps the pager and the strip on the same item
pub struct ScrollSynchronizer<P, S> {
    pager: P,
    strip: S,
    state: SyncState,
    len: usize,
    alive: bool,
    queue: VecDeque<SyncEvent>,
}

impl<P: PagedViewer, S: ThumbnailStrip> ScrollSynchronizer<P, S> {
    /// Start on the strip's selection, selecting thumb 0 if there is none
    pub fn new(mut pager: P, mut strip: S) -> Self {
        let len = pager.page_count();
        let current_index = match strip.selected_index() {
            Some(index) => index,
            None => {
                strip.change_selected_item(0);
                0
            }
        };
        // Startup alignment is not a transition: its event is discarded
        let _ = pager.go_to(current_index);

        Self {
            pager,
            strip,
            state: SyncState {
                current_index,
                last_origin: SyncOrigin::None,
            },
            len,
            alive: true,
            queue: VecDeque::new(),
        }
    }

    pub fn state(&self) -> SyncState {
        self.state
    }

    pub fn current_index(&self) -> usize {
        self.state.current_index
    }

    pub fn is_alive(&self) -> bool {
        self.alive
    }

    pub fn pager(&self) -> &P {
        &self.pager
    }

    pub fn pager_mut(&mut self) -> &mut P {
        &mut self.pager
    }

    pub fn strip(&self) -> &S {
        &self.strip
    }

    pub fn strip_mut(&mut self) -> &mut S {
        &mut self.strip
    }

    /// Release the controllers. Later events are dropped.
    pub fn teardown(&mut self) {
        if self.alive {
            tracing::debug!("Synchronizer torn down at {}", self.state.current_index);
        }
        self.alive = false;
        self.queue.clear();
    }

    /// Handle `event` and every event its commands raise, in order
    pub fn dispatch(&mut self, event: SyncEvent) -> Vec<Dispatch> {
        self.dispatch_all([event])
    }

    /// Handle a batch of events from one gesture, in order
    pub fn dispatch_all<I>(&mut self, events: I) -> Vec<Dispatch>
    where
        I: IntoIterator<Item = SyncEvent>,
    {
        self.queue.extend(events);
        let mut outcomes = Vec::new();
        while let Some(event) = self.queue.pop_front() {
            outcomes.push(self.handle(event));
        }
        outcomes
    }

    fn handle(&mut self, event: SyncEvent) -> Dispatch {
        if !self.alive {
            tracing::debug!("Dropped {:?}: synchronizer torn down", event);
            return Dispatch::Dropped(DropReason::TornDown);
        }

        match event {
            SyncEvent::PageSelected(index) => {
                self.transition(index, SyncOrigin::PagedViewer, |sync, i| {
                    sync.strip.center_on(i);
                })
            }
            SyncEvent::StripSettled(index) => {
                self.transition(index, SyncOrigin::ThumbnailStrip, |sync, i| {
                    if let Some(follow_up) = sync.pager.go_to(i) {
                        sync.queue.push_back(follow_up);
                    }
                })
            }
            SyncEvent::ThumbTapped(index) => {
                if let Some(drop) = self.check_bounds(index) {
                    return drop;
                }
                match self.pager.go_to(index) {
                    Some(follow_up) => {
                        self.queue.push_back(follow_up);
                        Dispatch::Forwarded(index)
                    }
                    None => Dispatch::Ignored,
                }
            }
            SyncEvent::StripDragStarted => {
                self.pager.lock();
                Dispatch::Locked
            }
            SyncEvent::StripIdle => {
                self.pager.unlock();
                Dispatch::Unlocked
            }
        }
    }

    fn check_bounds(&self, index: usize) -> Option<Dispatch> {
        if index >= self.len {
            tracing::debug!("Dropped index {}: list has {} items", index, self.len);
            return Some(Dispatch::Dropped(DropReason::OutOfBounds(index)));
        }
        None
    }

    /// Move `current_index` to `index`, commanding the other side with `drive`
    fn transition<F>(&mut self, index: usize, origin: SyncOrigin, drive: F) -> Dispatch
    where
        F: FnOnce(&mut Self, usize),
    {
        if let Some(drop) = self.check_bounds(index) {
            return drop;
        }
        if index == self.state.current_index {
            tracing::trace!("{:?} at {} already current", origin, index);
            return Dispatch::Ignored;
        }

        tracing::debug!(
            "Sync {:?}: {} -> {}",
            origin,
            self.state.current_index,
            index
        );
        self.state.last_origin = origin;
        drive(self, index);
        self.strip.change_selected_item(index);
        self.state.current_index = index;

        Dispatch::Applied { index, origin }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Pager fake recording commands
    #[derive(Default)]
    struct FakePager {
        count: usize,
        page: usize,
        locked: bool,
        go_to_calls: Vec<usize>,
    }

    impl PagedViewer for FakePager {
        fn page_count(&self) -> usize {
            self.count
        }
        fn active_page(&self) -> usize {
            self.page
        }
        fn go_to(&mut self, index: usize) -> Option<SyncEvent> {
            self.go_to_calls.push(index);
            if index == self.page {
                return None;
            }
            self.page = index;
            Some(SyncEvent::PageSelected(index))
        }
        fn lock(&mut self) {
            self.locked = true;
        }
        fn unlock(&mut self) {
            self.locked = false;
        }
        fn is_locked(&self) -> bool {
            self.locked
        }
    }

    /// Strip fake recording commands
    #[derive(Default)]
    struct FakeStrip {
        selected: Option<usize>,
        center_calls: Vec<usize>,
        select_calls: Vec<usize>,
    }

    impl ThumbnailStrip for FakeStrip {
        fn center_on(&mut self, index: usize) {
            self.center_calls.push(index);
        }
        fn change_selected_item(&mut self, index: usize) {
            self.select_calls.push(index);
            self.selected = Some(index);
        }
        fn selected_index(&self) -> Option<usize> {
            self.selected
        }
    }

    fn sync(count: usize) -> ScrollSynchronizer<FakePager, FakeStrip> {
        let pager = FakePager { count, ..Default::default() };
        let mut sync = ScrollSynchronizer::new(pager, FakeStrip::default());
        sync.strip_mut().select_calls.clear();
        sync.pager_mut().go_to_calls.clear();
        sync
    }

    #[test]
    fn test_new_selects_first() {
        let sync = sync(4);
        assert_eq!(sync.current_index(), 0);
        assert_eq!(sync.strip().selected, Some(0));
        assert_eq!(sync.state().last_origin, SyncOrigin::None);
    }

    #[test]
    fn test_page_selected_centres_strip_once() {
        let mut sync = sync(4);
        let outcomes = sync.dispatch(SyncEvent::PageSelected(2));

        assert_eq!(
            outcomes,
            vec![Dispatch::Applied { index: 2, origin: SyncOrigin::PagedViewer }]
        );
        assert_eq!(sync.strip().center_calls, vec![2]);
        assert_eq!(sync.strip().select_calls, vec![2]);
        assert!(sync.pager().go_to_calls.is_empty());
        assert_eq!(sync.current_index(), 2);
    }

    #[test]
    fn test_repeated_event_is_noop() {
        let mut sync = sync(4);
        sync.dispatch(SyncEvent::PageSelected(1));
        assert_eq!(sync.dispatch(SyncEvent::PageSelected(1)), vec![Dispatch::Ignored]);
        assert_eq!(sync.dispatch(SyncEvent::StripSettled(1)), vec![Dispatch::Ignored]);
        assert_eq!(sync.strip().center_calls, vec![1]);
    }

    #[test]
    fn test_strip_settle_moves_pager_without_echo() {
        let mut sync = sync(4);
        let outcomes = sync.dispatch(SyncEvent::StripSettled(3));

        // The pager's own page-selected event comes back and is ignored
        assert_eq!(
            outcomes,
            vec![
                Dispatch::Applied { index: 3, origin: SyncOrigin::ThumbnailStrip },
                Dispatch::Ignored,
            ]
        );
        assert_eq!(sync.pager().go_to_calls, vec![3]);
        assert!(sync.strip().center_calls.is_empty());
        assert_eq!(sync.state().last_origin, SyncOrigin::ThumbnailStrip);
    }

    #[test]
    fn test_drag_locks_and_idle_unlocks() {
        let mut sync = sync(4);
        assert_eq!(sync.dispatch(SyncEvent::StripDragStarted), vec![Dispatch::Locked]);
        assert!(sync.pager().is_locked());
        sync.dispatch_all([SyncEvent::StripSettled(2), SyncEvent::StripIdle]);
        assert!(!sync.pager().is_locked());
        assert_eq!(sync.current_index(), 2);
    }

    #[test]
    fn test_thumb_tap_goes_through_pager() {
        let mut sync = sync(4);
        let outcomes = sync.dispatch(SyncEvent::ThumbTapped(1));
        assert_eq!(
            outcomes,
            vec![
                Dispatch::Forwarded(1),
                Dispatch::Applied { index: 1, origin: SyncOrigin::PagedViewer },
            ]
        );
        assert_eq!(sync.strip().center_calls, vec![1]);
    }

    #[test]
    fn test_out_of_bounds_dropped() {
        let mut sync = sync(4);
        assert_eq!(
            sync.dispatch(SyncEvent::StripSettled(4)),
            vec![Dispatch::Dropped(DropReason::OutOfBounds(4))]
        );
        assert_eq!(sync.current_index(), 0);
    }

    #[test]
    fn test_events_after_teardown_dropped() {
        let mut sync = sync(4);
        sync.teardown();
        assert_eq!(
            sync.dispatch(SyncEvent::PageSelected(2)),
            vec![Dispatch::Dropped(DropReason::TornDown)]
        );
        assert!(sync.strip().center_calls.is_empty());
        assert_eq!(sync.current_index(), 0);
        assert!(!sync.is_alive());
    }
}
