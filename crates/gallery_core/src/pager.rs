//! Paged image viewer
//!
//! The pager shows one image per page. It reports a page only once a swipe
//! has settled, and a programmatic move to the page already showing is silent.

use crate::config::ScaleMode;
use crate::item::ItemSource;
use crate::sync::SyncEvent;

/// Command surface of the primary viewer
pub trait PagedViewer {
    fn page_count(&self) -> usize;

    fn active_page(&self) -> usize;

    /// Move to `index`. Returns the page-selected event when the page changed.
    fn go_to(&mut self, index: usize) -> Option<SyncEvent>;

    /// Reject user swipes until [`PagedViewer::unlock`]
    fn lock(&mut self);

    fn unlock(&mut self);

    fn is_locked(&self) -> bool;
}

/// Pager state
#[derive(Debug, Clone)]
pub struct PagerController {
    page_count: usize,
    active_page: usize,
    swipe_locked: bool,
}

impl PagerController {
    pub fn new(page_count: usize) -> Self {
        Self {
            page_count,
            active_page: 0,
            swipe_locked: false,
        }
    }

    /// A user swipe settled on `index`.
    ///
    /// Rejected while locked: the strip owns the gesture.
    pub fn user_swipe(&mut self, index: usize) -> Option<SyncEvent> {
        if self.swipe_locked {
            tracing::debug!("Pager swipe to {} rejected: swipe locked", index);
            return None;
        }
        self.go_to(index)
    }
}

impl PagedViewer for PagerController {
    fn page_count(&self) -> usize {
        self.page_count
    }

    fn active_page(&self) -> usize {
        self.active_page
    }

    fn go_to(&mut self, index: usize) -> Option<SyncEvent> {
        if index >= self.page_count {
            tracing::warn!("Pager go_to({}) out of range ({} pages)", index, self.page_count);
            return None;
        }
        if index == self.active_page {
            return None;
        }
        self.active_page = index;
        Some(SyncEvent::PageSelected(index))
    }

    fn lock(&mut self) {
        self.swipe_locked = true;
    }

    fn unlock(&mut self) {
        self.swipe_locked = false;
    }

    fn is_locked(&self) -> bool {
        self.swipe_locked
    }
}

/// What the rendering collaborator needs to draw one page
#[derive(Debug, Clone, PartialEq)]
pub struct PageSpec {
    pub source: ItemSource,
    pub scale_mode: ScaleMode,
    pub zoomable: bool,
    pub placeholder: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_go_to_is_idempotent() {
        let mut pager = PagerController::new(4);
        assert_eq!(pager.go_to(0), None);
        assert_eq!(pager.go_to(2), Some(SyncEvent::PageSelected(2)));
        assert_eq!(pager.go_to(2), None);
        assert_eq!(pager.active_page(), 2);
    }

    #[test]
    fn test_go_to_out_of_range() {
        let mut pager = PagerController::new(2);
        assert_eq!(pager.go_to(5), None);
        assert_eq!(pager.active_page(), 0);
    }

    #[test]
    fn test_locked_swipe_rejected() {
        let mut pager = PagerController::new(3);
        pager.lock();
        assert_eq!(pager.user_swipe(1), None);
        assert_eq!(pager.active_page(), 0);

        // Programmatic moves still go through
        assert_eq!(pager.go_to(1), Some(SyncEvent::PageSelected(1)));

        pager.unlock();
        assert_eq!(pager.user_swipe(2), Some(SyncEvent::PageSelected(2)));
    }
}
