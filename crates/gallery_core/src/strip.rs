//! Thumbnail strip
//!
//! A horizontal strip of equally sized thumbs. The strip reports where it
//! came to rest (the thumb nearest its horizontal centre) and can centre a
//! thumb on request.

use crate::config::{EdgeSettlePolicy, StripLayout};
use crate::item::ItemList;
use crate::sync::SyncEvent;

/// Offsets closer than this are considered equal
const OFFSET_EPSILON: f32 = 0.5;

/// Command surface of the secondary strip
pub trait ThumbnailStrip {
    /// Bring thumb `index` to the horizontal centre
    fn center_on(&mut self, index: usize);

    /// Move the selection flag to `index`. No scrolling.
    fn change_selected_item(&mut self, index: usize);

    fn selected_index(&self) -> Option<usize>;
}

/// Scroll state of the strip
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScrollState {
    #[default]
    Idle,
    Dragging,
    Settling,
}

/// Strip state and geometry
#[derive(Debug, Clone)]
pub struct StripController {
    items: ItemList,
    layout: StripLayout,
    edge_policy: EdgeSettlePolicy,
    viewport_width: f32,
    offset: f32,
    state: ScrollState,
    /// Target offset of the smooth scroll in flight
    pending_target: Option<f32>,
    /// Thumb to centre on the next layout pass
    pending_center: Option<usize>,
    /// The current scroll was commanded, not dragged: its settle is not reported
    programmatic: bool,
}

impl StripController {
    /// Create the strip. The first thumb starts selected.
    pub fn new(mut items: ItemList, layout: StripLayout, edge_policy: EdgeSettlePolicy) -> Self {
        items.activate_selection();
        Self {
            items,
            layout,
            edge_policy,
            viewport_width: 0.0,
            offset: 0.0,
            state: ScrollState::Idle,
            pending_target: None,
            pending_center: None,
            programmatic: false,
        }
    }

    pub fn items(&self) -> &ItemList {
        &self.items
    }

    pub fn offset(&self) -> f32 {
        self.offset
    }

    pub fn scroll_state(&self) -> ScrollState {
        self.state
    }

    pub fn viewport_width(&self) -> f32 {
        self.viewport_width
    }

    pub fn is_measured(&self) -> bool {
        self.viewport_width > 0.0
    }

    fn stride(&self) -> f32 {
        self.layout.thumb_width + self.layout.spacing
    }

    fn item_left(&self, index: usize) -> f32 {
        index as f32 * self.stride()
    }

    fn item_mid(&self, index: usize) -> f32 {
        self.item_left(index) + self.layout.thumb_width / 2.0
    }

    pub fn content_width(&self) -> f32 {
        self.items.len() as f32 * self.stride() - self.layout.spacing
    }

    fn max_offset(&self) -> f32 {
        (self.content_width() - self.viewport_width).max(0.0)
    }

    fn clamp_offset(&self, offset: f32) -> f32 {
        offset.clamp(0.0, self.max_offset())
    }

    fn intersects(&self, index: usize, from: f32, to: f32) -> bool {
        let left = self.item_left(index);
        left < to && left + self.layout.thumb_width > from
    }

    /// First and last thumb with any visible pixel
    pub fn visible_range(&self) -> Option<(usize, usize)> {
        let from = self.offset;
        let to = self.offset + self.viewport_width;
        let mut visible = (0..self.items.len()).filter(|&i| self.intersects(i, from, to));
        let first = visible.next()?;
        let last = visible.last().unwrap_or(first);
        Some((first, last))
    }

    /// Is thumb `index` laid out (visible or inside the cache margin)?
    pub fn is_realized(&self, index: usize) -> bool {
        if !self.is_measured() || !self.items.contains_index(index) {
            return false;
        }
        let margin = self.layout.cache_margin;
        self.intersects(index, self.offset - margin, self.offset + self.viewport_width + margin)
    }

    /// Thumb whose midpoint is nearest the strip's horizontal centre
    pub fn center_index(&self) -> usize {
        let center = self.offset + self.viewport_width / 2.0;
        let raw = ((center - self.layout.thumb_width / 2.0) / self.stride()).round();
        (raw.max(0.0) as usize).min(self.items.last_index())
    }

    /// Layout pass with the measured viewport width.
    ///
    /// Applies a centring request that could not run while the thumb was not
    /// realized.
    pub fn layout(&mut self, viewport_width: f32) {
        self.viewport_width = viewport_width.max(0.0);
        self.offset = self.clamp_offset(self.offset);
        if let Some(target) = self.pending_target {
            self.pending_target = Some(self.clamp_offset(target));
        }
        if let Some(index) = self.pending_center.take() {
            tracing::debug!("Strip layout pass: centring deferred thumb {}", index);
            self.smooth_center(index);
        }
    }

    /// Jump without animation so that thumb `index` is fully visible
    fn scroll_to_position(&mut self, index: usize) {
        let left = self.item_left(index);
        let right = left + self.layout.thumb_width;
        if left < self.offset {
            self.offset = self.clamp_offset(left);
        } else if right > self.offset + self.viewport_width {
            self.offset = self.clamp_offset(right - self.viewport_width);
        }
    }

    fn smooth_center(&mut self, index: usize) {
        let target = self.clamp_offset(self.item_mid(index) - self.viewport_width / 2.0);
        if (target - self.offset).abs() < OFFSET_EPSILON {
            return;
        }
        self.pending_target = Some(target);
        self.state = ScrollState::Settling;
        self.programmatic = true;
    }

    /// User tapped a thumb
    pub fn tap(&self, index: usize) -> Option<SyncEvent> {
        self.items
            .contains_index(index)
            .then_some(SyncEvent::ThumbTapped(index))
    }

    /// Finger down on the strip
    pub fn begin_drag(&mut self) -> Vec<SyncEvent> {
        if self.state == ScrollState::Dragging {
            return Vec::new();
        }
        self.pending_target = None;
        self.programmatic = false;
        self.state = ScrollState::Dragging;
        vec![SyncEvent::StripDragStarted]
    }

    /// Finger moved by `dx` pixels of content
    pub fn drag_by(&mut self, dx: f32) {
        if self.state == ScrollState::Dragging {
            self.offset = self.clamp_offset(self.offset + dx);
        }
    }

    /// Finger up. A non-zero fling keeps the strip moving until
    /// [`StripController::finish_scroll`].
    pub fn release(&mut self, fling_dx: f32) -> Vec<SyncEvent> {
        if self.state != ScrollState::Dragging {
            return Vec::new();
        }
        let target = self.clamp_offset(self.offset + fling_dx);
        if (target - self.offset).abs() < OFFSET_EPSILON {
            return self.settle();
        }
        self.pending_target = Some(target);
        self.state = ScrollState::Settling;
        Vec::new()
    }

    /// The running scroll animation reached its target
    pub fn finish_scroll(&mut self) -> Vec<SyncEvent> {
        if self.state != ScrollState::Settling {
            return Vec::new();
        }
        if let Some(target) = self.pending_target.take() {
            self.offset = target;
        }
        self.settle()
    }

    /// Stop any animation without reporting a settle
    pub fn cancel(&mut self) {
        self.pending_target = None;
        self.pending_center = None;
        self.programmatic = false;
        self.state = ScrollState::Idle;
    }

    /// Transition to idle: report the centred thumb, then the idle state.
    ///
    /// A commanded scroll only reports idle. Near the list ends it stops short
    /// of centring its thumb, and reporting its centre would pull the pager
    /// off the page that commanded it.
    fn settle(&mut self) -> Vec<SyncEvent> {
        self.state = ScrollState::Idle;
        if std::mem::take(&mut self.programmatic) {
            return vec![SyncEvent::StripIdle];
        }
        let mut events = Vec::with_capacity(2);

        let center = self.center_index();
        if self.should_report(center) {
            events.push(SyncEvent::StripSettled(center));
        } else {
            tracing::trace!("Strip settle on {} not reported", center);
        }
        events.push(SyncEvent::StripIdle);
        events
    }

    fn should_report(&self, center: usize) -> bool {
        let previous = match self.items.selected_index() {
            Some(previous) => previous,
            None => return true,
        };
        if center == previous {
            return false;
        }
        match self.edge_policy {
            EdgeSettlePolicy::NearestCenter => true,
            EdgeSettlePolicy::Legacy => {
                let Some((first, last)) = self.visible_range() else {
                    return true;
                };
                (first != 0 || center < previous)
                    && (last != self.items.last_index() || center > previous)
            }
        }
    }
}

impl ThumbnailStrip for StripController {
    fn center_on(&mut self, index: usize) {
        if !self.items.contains_index(index) {
            return;
        }
        if self.is_realized(index) {
            self.smooth_center(index);
        } else {
            tracing::debug!("Thumb {} not realized, jumping", index);
            self.pending_target = None;
            if self.state == ScrollState::Settling {
                self.state = ScrollState::Idle;
            }
            self.scroll_to_position(index);
            self.pending_center = Some(index);
            self.programmatic = true;
        }
    }

    fn change_selected_item(&mut self, index: usize) {
        self.items.select(index);
    }

    fn selected_index(&self) -> Option<usize> {
        self.items.selected_index()
    }
}
