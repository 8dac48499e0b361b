//! Tab strip mode
//!
//! Without thumbnails the popup shows one tab per page. The tabs follow the
//! pager; tapping a tab moves the pager.

use crate::config::DEFAULT_INDICATOR;
use crate::pager::PagedViewer;
use crate::sync::SyncEvent;

#[derive(Debug, Clone)]
pub struct TabStrip {
    count: usize,
    selected: usize,
    indicator: String,
}

impl TabStrip {
    pub fn new(count: usize, indicator: impl Into<String>) -> Self {
        Self {
            count,
            selected: 0,
            indicator: indicator.into(),
        }
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    /// Per-tab background drawable, when a custom indicator was configured
    pub fn tab_background(&self) -> Option<&str> {
        (self.indicator != DEFAULT_INDICATOR).then_some(self.indicator.as_str())
    }

    /// Follow the pager. Returns true when the highlighted tab changed.
    pub fn on_page_selected(&mut self, index: usize) -> bool {
        if index >= self.count || index == self.selected {
            return false;
        }
        self.selected = index;
        true
    }

    /// Forward pager events; everything else is not for the tabs
    pub fn apply(&mut self, event: SyncEvent) -> bool {
        match event {
            SyncEvent::PageSelected(index) => self.on_page_selected(index),
            _ => false,
        }
    }

    /// A tab was tapped: move the pager and follow it
    pub fn tap<P: PagedViewer>(&mut self, index: usize, pager: &mut P) -> bool {
        match pager.go_to(index) {
            Some(event) => self.apply(event),
            None => false,
        }
    }
}
