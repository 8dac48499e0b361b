//! Popup assembly
//!
//! [`PopupConfig::new`] validates the caller's list and options once; a
//! [`PopupDialog`] built from it wires the pager to either the thumbnail
//! strip (through the [`ScrollSynchronizer`]) or the tab strip, and talks to
//! the window system and the image loader through traits.

use crate::config::{Color, PopupOptions, ScaleMode};
use crate::error::{PopupError, Result};
use crate::item::{normalize, ItemList, RawItem};
use crate::loader::{ImageLoader, TargetId};
use crate::pager::{PageSpec, PagedViewer, PagerController};
use crate::strip::StripController;
use crate::sync::{Dispatch, DropReason, ScrollSynchronizer, SyncOrigin};
use crate::tabs::TabStrip;
use std::collections::HashSet;

/// Resolves layout references into views
pub trait ViewInflater {
    fn inflate(&self, layout: &str) -> Option<PlaceholderView>;
}

/// Inflated loading placeholder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaceholderView {
    pub layout: String,
}

/// Window size in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizeSpec {
    pub width: u32,
    pub height: u32,
}

/// The window system hosting the popup
pub trait PresentationShell {
    fn display_size(&self) -> SizeSpec;

    fn present(&mut self, content: &ContentView, size: SizeSpec, background: Color);

    fn close(&mut self);
}

/// Navigation shown under the pager
#[derive(Debug, Clone, PartialEq)]
pub enum NavigationView {
    Thumbnails,
    Tabs {
        count: usize,
        tab_background: Option<String>,
    },
}

/// Everything the shell draws
#[derive(Debug, Clone, PartialEq)]
pub struct ContentView {
    pub header_color: Color,
    pub close_icon: String,
    pub dialog_style: String,
    pub navigation: NavigationView,
    pub pages: Vec<PageSpec>,
    pub cancelable: bool,
}

/// Validated, immutable popup configuration
#[derive(Debug, Clone)]
pub struct PopupConfig {
    items: ItemList,
    options: PopupOptions,
    background: Color,
    header: Color,
    placeholder: Option<PlaceholderView>,
}

impl PopupConfig {
    /// Validate `raw` and `options`.
    ///
    /// Fails with `InvalidInput` for an empty or mixed list, `Config` for a
    /// malformed colour or strip geometry, and `ViewInflation` when the
    /// loading placeholder cannot be inflated.
    pub fn new<I>(raw: I, options: PopupOptions, inflater: &dyn ViewInflater) -> Result<Self>
    where
        I: IntoIterator,
        I::Item: Into<RawItem>,
    {
        let items = normalize(raw)?;
        let background = Color::parse(&options.background_color)?;
        let header = Color::parse(&options.header_color)?;
        options.validate_strip()?;

        let placeholder = match &options.loading_placeholder {
            Some(layout) => Some(inflater.inflate(layout).ok_or_else(|| {
                PopupError::ViewInflation(format!("View could not be inflated: {}", layout))
            })?),
            None => None,
        };

        Ok(Self {
            items,
            options,
            background,
            header,
            placeholder,
        })
    }

    pub fn items(&self) -> &ItemList {
        &self.items
    }

    pub fn options(&self) -> &PopupOptions {
        &self.options
    }

    pub fn background(&self) -> Color {
        self.background
    }

    pub fn header(&self) -> Color {
        self.header
    }

    pub fn placeholder(&self) -> Option<&PlaceholderView> {
        self.placeholder.as_ref()
    }

    pub fn page_specs(&self) -> Vec<PageSpec> {
        self.items
            .iter()
            .map(|item| PageSpec {
                source: item.source.clone(),
                scale_mode: self.options.scale_mode,
                zoomable: self.options.zoom_enabled,
                placeholder: self.placeholder.as_ref().map(|p| p.layout.clone()),
            })
            .collect()
    }
}

/// Fluent surface over [`PopupOptions`]
#[derive(Debug, Clone, Default)]
pub struct PopupDialogBuilder {
    items: Vec<RawItem>,
    options: PopupOptions,
}

impl PopupDialogBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from options loaded elsewhere
    pub fn with_options(options: PopupOptions) -> Self {
        Self {
            items: Vec::new(),
            options,
        }
    }

    pub fn list<I>(mut self, items: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<RawItem>,
    {
        self.items = items.into_iter().map(Into::into).collect();
        self
    }

    pub fn dialog_background_color(mut self, color: &str) -> Self {
        self.options.background_color = color.to_string();
        self
    }

    pub fn header_background_color(mut self, color: &str) -> Self {
        self.options.header_color = color.to_string();
        self
    }

    pub fn close_drawable(mut self, icon: &str) -> Self {
        self.options.close_icon = icon.to_string();
        self
    }

    pub fn slider_scale_mode(mut self, mode: ScaleMode) -> Self {
        self.options.scale_mode = mode;
        self
    }

    pub fn loading_view(mut self, layout: &str) -> Self {
        self.options.loading_placeholder = Some(layout.to_string());
        self
    }

    pub fn dialog_style(mut self, style: &str) -> Self {
        self.options.dialog_style = style.to_string();
        self
    }

    pub fn selector_indicator(mut self, indicator: &str) -> Self {
        self.options.selector_indicator = indicator.to_string();
        self
    }

    pub fn zoomable(mut self, zoomable: bool) -> Self {
        self.options.zoom_enabled = zoomable;
        self
    }

    pub fn show_thumb_slider(mut self, show: bool) -> Self {
        self.options.thumb_strip_enabled = show;
        self
    }

    /// Validate into a [`PopupConfig`]
    pub fn config(self, inflater: &dyn ViewInflater) -> Result<PopupConfig> {
        PopupConfig::new(self.items, self.options, inflater)
    }

    /// Validate and assemble the popup
    pub fn build<S, L>(self, inflater: &dyn ViewInflater, shell: S, loader: L) -> Result<PopupDialog<S, L>>
    where
        S: PresentationShell,
        L: ImageLoader,
    {
        Ok(PopupDialog::new(self.config(inflater)?, shell, loader))
    }
}

enum Navigation {
    Thumbnails(ScrollSynchronizer<PagerController, StripController>),
    Tabs {
        pager: PagerController,
        tabs: TabStrip,
    },
}

/// A modal image popup
pub struct PopupDialog<S: PresentationShell, L: ImageLoader> {
    config: PopupConfig,
    shell: S,
    loader: L,
    navigation: Navigation,
    /// Targets with a live image request
    requested: HashSet<TargetId>,
    showing: bool,
    dismissed: bool,
}

impl<S: PresentationShell, L: ImageLoader> PopupDialog<S, L> {
    pub fn new(config: PopupConfig, shell: S, loader: L) -> Self {
        let count = config.items().len();
        let pager = PagerController::new(count);
        let options = config.options();

        let navigation = if options.thumb_strip_enabled {
            let strip = StripController::new(config.items().clone(), options.strip, options.edge_settle);
            Navigation::Thumbnails(ScrollSynchronizer::new(pager, strip))
        } else {
            Navigation::Tabs {
                pager,
                tabs: TabStrip::new(count, options.selector_indicator.clone()),
            }
        };

        Self {
            config,
            shell,
            loader,
            navigation,
            requested: HashSet::new(),
            showing: false,
            dismissed: false,
        }
    }

    pub fn config(&self) -> &PopupConfig {
        &self.config
    }

    pub fn shell(&self) -> &S {
        &self.shell
    }

    pub fn loader(&self) -> &L {
        &self.loader
    }

    pub fn is_showing(&self) -> bool {
        self.showing
    }

    pub fn is_dismissed(&self) -> bool {
        self.dismissed
    }

    pub fn synchronizer(&self) -> Option<&ScrollSynchronizer<PagerController, StripController>> {
        match &self.navigation {
            Navigation::Thumbnails(sync) => Some(sync),
            Navigation::Tabs { .. } => None,
        }
    }

    pub fn tabs(&self) -> Option<&TabStrip> {
        match &self.navigation {
            Navigation::Thumbnails(_) => None,
            Navigation::Tabs { tabs, .. } => Some(tabs),
        }
    }

    pub fn pager(&self) -> &PagerController {
        match &self.navigation {
            Navigation::Thumbnails(sync) => sync.pager(),
            Navigation::Tabs { pager, .. } => pager,
        }
    }

    /// Item shown by the pager
    pub fn current_index(&self) -> usize {
        match &self.navigation {
            Navigation::Thumbnails(sync) => sync.current_index(),
            Navigation::Tabs { pager, .. } => pager.active_page(),
        }
    }

    pub fn requested_targets(&self) -> &HashSet<TargetId> {
        &self.requested
    }

    fn content_view(&self) -> ContentView {
        let options = self.config.options();
        let navigation = match &self.navigation {
            Navigation::Thumbnails(_) => NavigationView::Thumbnails,
            Navigation::Tabs { tabs, .. } => NavigationView::Tabs {
                count: tabs.count(),
                tab_background: tabs.tab_background().map(str::to_string),
            },
        };
        ContentView {
            header_color: self.config.header(),
            close_icon: options.close_icon.clone(),
            dialog_style: options.dialog_style.clone(),
            navigation,
            pages: self.config.page_specs(),
            cancelable: true,
        }
    }

    /// Present the popup full screen
    pub fn show(&mut self) {
        if self.dismissed {
            tracing::warn!("show() on a dismissed popup");
            return;
        }
        if self.showing {
            return;
        }
        let size = self.shell.display_size();
        let content = self.content_view();
        self.shell.present(&content, size, self.config.background());
        self.showing = true;
        tracing::info!(
            "Popup shown: {} items, {}x{}",
            self.config.items().len(),
            size.width,
            size.height
        );
        self.refresh_requests();
    }

    /// Tear down both controllers, cancel image requests and close the window.
    /// Later gestures and late animation callbacks are dropped.
    pub fn dismiss(&mut self) {
        if self.dismissed {
            return;
        }
        self.dismissed = true;
        self.showing = false;

        if let Navigation::Thumbnails(sync) = &mut self.navigation {
            sync.strip_mut().cancel();
            sync.teardown();
        }
        for target in self.requested.drain() {
            self.loader.cancel(target);
        }
        self.shell.close();
        tracing::info!("Popup dismissed at {}", self.current_index());
    }

    /// The header's close button
    pub fn on_close_pressed(&mut self) {
        self.dismiss();
    }

    fn dropped(&self) -> Option<Vec<Dispatch>> {
        self.dismissed
            .then(|| vec![Dispatch::Dropped(DropReason::TornDown)])
    }

    /// Layout pass with the strip's measured width
    pub fn layout(&mut self, strip_width: f32) {
        if self.dismissed {
            return;
        }
        if let Navigation::Thumbnails(sync) = &mut self.navigation {
            sync.strip_mut().layout(strip_width);
        }
        self.refresh_requests();
    }

    /// A pager swipe settled on `index`
    pub fn swipe_to(&mut self, index: usize) -> Vec<Dispatch> {
        if let Some(dropped) = self.dropped() {
            return dropped;
        }
        let outcomes = match &mut self.navigation {
            Navigation::Thumbnails(sync) => match sync.pager_mut().user_swipe(index) {
                Some(event) => sync.dispatch(event),
                None => vec![Dispatch::Ignored],
            },
            Navigation::Tabs { pager, tabs } => match pager.user_swipe(index) {
                Some(event) if tabs.apply(event) => vec![Dispatch::Applied {
                    index,
                    origin: SyncOrigin::PagedViewer,
                }],
                _ => vec![Dispatch::Ignored],
            },
        };
        self.refresh_requests();
        outcomes
    }

    /// A thumb was tapped
    pub fn tap_thumb(&mut self, index: usize) -> Vec<Dispatch> {
        self.strip_gesture(|strip| strip.tap(index).into_iter().collect())
    }

    /// Finger down on the strip
    pub fn begin_strip_drag(&mut self) -> Vec<Dispatch> {
        self.strip_gesture(StripController::begin_drag)
    }

    /// Finger moved on the strip
    pub fn drag_strip_by(&mut self, dx: f32) -> Vec<Dispatch> {
        self.strip_gesture(|strip| {
            strip.drag_by(dx);
            Vec::new()
        })
    }

    /// Finger up on the strip, with the fling distance
    pub fn release_strip(&mut self, fling_dx: f32) -> Vec<Dispatch> {
        self.strip_gesture(|strip| strip.release(fling_dx))
    }

    /// The strip's scroll animation ended
    pub fn finish_strip_scroll(&mut self) -> Vec<Dispatch> {
        self.strip_gesture(StripController::finish_scroll)
    }

    fn strip_gesture<F>(&mut self, gesture: F) -> Vec<Dispatch>
    where
        F: FnOnce(&mut StripController) -> Vec<crate::sync::SyncEvent>,
    {
        if let Some(dropped) = self.dropped() {
            return dropped;
        }
        let outcomes = match &mut self.navigation {
            Navigation::Thumbnails(sync) => {
                let events = gesture(sync.strip_mut());
                sync.dispatch_all(events)
            }
            Navigation::Tabs { .. } => {
                tracing::debug!("Strip gesture ignored in tab mode");
                Vec::new()
            }
        };
        self.refresh_requests();
        outcomes
    }

    /// A tab was tapped. Returns true when the page changed.
    pub fn tap_tab(&mut self, index: usize) -> bool {
        if self.dismissed {
            return false;
        }
        let changed = match &mut self.navigation {
            Navigation::Tabs { pager, tabs } => tabs.tap(index, pager),
            Navigation::Thumbnails(_) => false,
        };
        self.refresh_requests();
        changed
    }

    /// Pages next to the active one and realized thumbs
    fn wanted_targets(&self) -> Vec<TargetId> {
        let last = self.config.items().last_index();
        let active = self.pager().active_page();
        let mut wanted = Vec::new();

        if let Navigation::Thumbnails(sync) = &self.navigation {
            let strip = sync.strip();
            wanted.extend((0..=last).filter(|&i| strip.is_realized(i)).map(TargetId::Thumb));
        }
        let neighbours = active.saturating_sub(1)..=(active + 1).min(last);
        wanted.extend(neighbours.filter(|&i| i != active).map(TargetId::Page));
        // Loaded first by the newest-first loader
        wanted.push(TargetId::Page(active));
        wanted
    }

    fn refresh_requests(&mut self) {
        if !self.showing {
            return;
        }
        let wanted = self.wanted_targets();
        let wanted_set: HashSet<TargetId> = wanted.iter().copied().collect();

        for target in self.requested.difference(&wanted_set) {
            self.loader.cancel(*target);
        }
        for target in &wanted {
            if self.requested.contains(target) {
                continue;
            }
            let index = match target {
                TargetId::Page(i) | TargetId::Thumb(i) => *i,
            };
            if let Some(item) = self.config.items().get(index) {
                self.loader.request(&item.source, *target);
            }
        }
        self.requested = wanted_set;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::ItemSource;
    use std::cell::RefCell;

    struct Inflater;

    impl ViewInflater for Inflater {
        fn inflate(&self, layout: &str) -> Option<PlaceholderView> {
            (layout == "progress").then(|| PlaceholderView { layout: layout.to_string() })
        }
    }

    #[derive(Default)]
    struct Shell {
        presented: Vec<(ContentView, SizeSpec, Color)>,
        closed: usize,
    }

    impl PresentationShell for Shell {
        fn display_size(&self) -> SizeSpec {
            SizeSpec { width: 1080, height: 1920 }
        }
        fn present(&mut self, content: &ContentView, size: SizeSpec, background: Color) {
            self.presented.push((content.clone(), size, background));
        }
        fn close(&mut self) {
            self.closed += 1;
        }
    }

    #[derive(Default)]
    struct Loader {
        requests: RefCell<Vec<(ItemSource, TargetId)>>,
        cancels: RefCell<Vec<TargetId>>,
    }

    impl ImageLoader for Loader {
        fn request(&self, source: &ItemSource, target: TargetId) {
            self.requests.borrow_mut().push((source.clone(), target));
        }
        fn cancel(&self, target: TargetId) {
            self.cancels.borrow_mut().push(target);
        }
    }

    fn popup(builder: PopupDialogBuilder) -> PopupDialog<Shell, Loader> {
        builder
            .build(&Inflater, Shell::default(), Loader::default())
            .unwrap()
    }

    #[test]
    fn test_config_errors() {
        let err = PopupDialogBuilder::new().config(&Inflater).unwrap_err();
        assert!(matches!(err, PopupError::InvalidInput(_)));

        let err = PopupDialogBuilder::new()
            .list(["a.png"])
            .loading_view("missing_layout")
            .config(&Inflater)
            .unwrap_err();
        assert!(matches!(err, PopupError::ViewInflation(_)));

        let err = PopupDialogBuilder::new()
            .list(["a.png"])
            .dialog_background_color("black")
            .config(&Inflater)
            .unwrap_err();
        assert!(matches!(err, PopupError::Config(_)));
    }

    #[test]
    fn test_page_specs_carry_options() {
        let config = PopupDialogBuilder::new()
            .list([1u32, 2])
            .slider_scale_mode(ScaleMode::CenterCrop)
            .zoomable(true)
            .loading_view("progress")
            .config(&Inflater)
            .unwrap();
        let specs = config.page_specs();
        assert_eq!(specs.len(), 2);
        assert_eq!(specs[1].source, ItemSource::Drawable(2));
        assert_eq!(specs[1].scale_mode, ScaleMode::CenterCrop);
        assert!(specs[1].zoomable);
        assert_eq!(specs[1].placeholder.as_deref(), Some("progress"));
    }

    #[test]
    fn test_show_presents_full_screen() {
        let mut dialog = popup(
            PopupDialogBuilder::new()
                .list(["a", "b", "c"])
                .dialog_background_color("#80112233"),
        );
        assert!(dialog.shell().presented.is_empty());

        dialog.show();
        dialog.show();
        let presented = &dialog.shell().presented;
        assert_eq!(presented.len(), 1);
        let (content, size, background) = &presented[0];
        assert_eq!(*size, SizeSpec { width: 1080, height: 1920 });
        assert_eq!(*background, Color(0x8011_2233));
        assert_eq!(content.navigation, NavigationView::Thumbnails);
        assert_eq!(content.pages.len(), 3);
        assert!(content.cancelable);
    }

    #[test]
    fn test_requests_follow_pager() {
        let mut dialog = popup(PopupDialogBuilder::new().list(["a", "b", "c", "d"]));
        dialog.show();
        // Not laid out yet: no thumbs, pages 0 and 1, active last
        let targets: Vec<TargetId> = dialog.loader().requests.borrow().iter().map(|r| r.1).collect();
        assert_eq!(targets, vec![TargetId::Page(1), TargetId::Page(0)]);

        dialog.swipe_to(3);
        assert!(dialog.requested_targets().contains(&TargetId::Page(3)));
        assert!(dialog.requested_targets().contains(&TargetId::Page(2)));
        assert!(!dialog.requested_targets().contains(&TargetId::Page(0)));
        assert!(dialog.loader().cancels.borrow().contains(&TargetId::Page(0)));
    }

    #[test]
    fn test_layout_requests_realized_thumbs() {
        let mut dialog = popup(PopupDialogBuilder::new().list(["a", "b", "c", "d"]));
        dialog.show();
        dialog.layout(100.0);
        let requested = dialog.requested_targets();
        assert!(requested.contains(&TargetId::Thumb(0)));
        assert!(requested.contains(&TargetId::Thumb(2)));
        assert!(!requested.contains(&TargetId::Thumb(3)));
    }

    #[test]
    fn test_swipe_to_last_page_survives_strip_settle() {
        let mut options = PopupOptions::default();
        options.edge_settle = crate::config::EdgeSettlePolicy::NearestCenter;
        let mut dialog = popup(PopupDialogBuilder::with_options(options).list(["a", "b", "c", "d"]));
        dialog.show();
        dialog.layout(200.0);

        assert_eq!(
            dialog.swipe_to(3),
            vec![Dispatch::Applied { index: 3, origin: SyncOrigin::PagedViewer }]
        );
        assert_eq!(dialog.finish_strip_scroll(), vec![Dispatch::Unlocked]);
        assert_eq!(dialog.current_index(), 3);
        assert_eq!(dialog.pager().active_page(), 3);
    }

    #[test]
    fn test_tab_mode() {
        let mut dialog = popup(
            PopupDialogBuilder::new()
                .list(["a", "b", "c"])
                .show_thumb_slider(false)
                .selector_indicator("dots"),
        );
        assert!(dialog.synchronizer().is_none());
        dialog.show();
        let content = &dialog.shell().presented[0].0;
        assert_eq!(
            content.navigation,
            NavigationView::Tabs { count: 3, tab_background: Some("dots".into()) }
        );

        assert_eq!(
            dialog.swipe_to(2),
            vec![Dispatch::Applied { index: 2, origin: SyncOrigin::PagedViewer }]
        );
        assert_eq!(dialog.tabs().unwrap().selected(), 2);

        assert!(dialog.tap_tab(0));
        assert_eq!(dialog.current_index(), 0);
        assert!(dialog.begin_strip_drag().is_empty());
    }

    #[test]
    fn test_dismiss_tears_down() {
        let mut dialog = popup(PopupDialogBuilder::new().list(["a", "b", "c", "d"]));
        dialog.show();
        dialog.layout(100.0);
        dialog.swipe_to(2);
        let live = dialog.requested_targets().len();
        assert!(live > 0);

        dialog.on_close_pressed();
        dialog.dismiss();
        assert!(dialog.is_dismissed());
        assert_eq!(dialog.shell().closed, 1);
        assert!(dialog.requested_targets().is_empty());
        assert!(dialog.loader().cancels.borrow().len() >= live);

        // Late animation end and new gestures are dropped
        let dropped = vec![Dispatch::Dropped(DropReason::TornDown)];
        assert_eq!(dialog.finish_strip_scroll(), dropped);
        assert_eq!(dialog.swipe_to(0), dropped);
        assert_eq!(dialog.current_index(), 2);
        assert!(!dialog.synchronizer().unwrap().is_alive());

        dialog.show();
        assert_eq!(dialog.shell().presented.len(), 1);
    }
}
