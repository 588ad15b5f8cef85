//! Full-screen detail view engine.
//!
//! [`DetailView`] owns the carousel, zoom, overlay and prefetch state for one
//! visit to the detail screen. Gesture methods are synchronous and never wait
//! on I/O; decoded images arrive through [`DetailView::poll_images`] or
//! [`DetailView::next_image`].

pub mod carousel;
pub mod overlay;
pub mod zoom;

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info};

use crate::config::{CarouselConfig, OverlayConfig, ZoomConfig};
use crate::gallery::{AssetStore, PhotoRef, TargetSize};
use crate::geometry::{Insets, Size, Vec2};
use crate::tasks::prefetch::{PrefetchBuffer, Slot, SlotImage};

use carousel::{Carousel, Direction, Release, SettleAnimation, StepOutcome};
use overlay::{Overlay, OverlaySnap};
use zoom::{ZoomState, ZoomTarget};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DetailError {
    #[error("detail view needs at least one photo")]
    EmptyGallery,
    #[error("start index {index} outside gallery of {len}")]
    IndexOutOfRange { index: usize, len: usize },
}

/// Everything the detail view needs besides the photos and the store.
#[derive(Debug, Clone, Default)]
pub struct DetailOptions {
    pub carousel: CarouselConfig,
    pub zoom: ZoomConfig,
    pub overlay: OverlayConfig,
    pub target: TargetSize,
    pub viewport: Size,
    pub insets: Insets,
}

/// Which machine a photo drag was handed to when it began.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragRoute {
    Ignored,
    Swipe,
    Pan,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DragResult {
    Ignored,
    Swipe(Release),
    Pan(ZoomTarget),
}

/// Result of a finished slide animation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransitionDone {
    pub direction: Direction,
    pub index: usize,
    /// A queued step that started immediately after this commit.
    pub chained: Option<(Direction, SettleAnimation)>,
}

pub struct DetailView {
    photos: Arc<[PhotoRef]>,
    carousel: Carousel,
    zoom: ZoomState,
    overlay: Overlay,
    prefetch: PrefetchBuffer,
    route: DragRoute,
}

impl DetailView {
    pub fn new(
        photos: Arc<[PhotoRef]>,
        start: usize,
        store: Arc<dyn AssetStore>,
        options: DetailOptions,
    ) -> Result<Self, DetailError> {
        if photos.is_empty() {
            return Err(DetailError::EmptyGallery);
        }
        if start >= photos.len() {
            return Err(DetailError::IndexOutOfRange {
                index: start,
                len: photos.len(),
            });
        }
        let carousel = Carousel::new(
            photos.len(),
            start,
            options.viewport.width,
            options.carousel,
        );
        let prefetch = PrefetchBuffer::new(store, Arc::clone(&photos), options.target);
        Ok(Self {
            carousel,
            zoom: ZoomState::new(options.zoom),
            overlay: Overlay::new(&options.overlay, options.viewport, options.insets),
            prefetch,
            photos,
            route: DragRoute::Ignored,
        })
    }

    /// First appearance: fetch the current photo and its neighbours.
    pub fn mount(&mut self) {
        info!(
            index = self.carousel.index(),
            count = self.photos.len(),
            "detail view mounted"
        );
        self.prefetch.load_around(self.carousel.index());
    }

    /// Leaving the detail view: stop fetching and drop transient gesture state.
    pub fn dismiss(&mut self) {
        debug!(index = self.carousel.index(), "detail view dismissed");
        self.prefetch.cancel_all();
        self.carousel.cancel_drag();
        self.carousel.clear_pending();
        self.route = DragRoute::Ignored;
    }

    #[must_use]
    pub fn index(&self) -> usize {
        self.carousel.index()
    }

    #[must_use]
    pub fn current_photo(&self) -> &PhotoRef {
        &self.photos[self.carousel.index()]
    }

    #[must_use]
    pub fn photos(&self) -> &[PhotoRef] {
        &self.photos
    }

    #[must_use]
    pub fn carousel(&self) -> &Carousel {
        &self.carousel
    }

    #[must_use]
    pub fn zoom(&self) -> &ZoomState {
        &self.zoom
    }

    #[must_use]
    pub fn overlay(&self) -> &Overlay {
        &self.overlay
    }

    #[must_use]
    pub fn prefetch(&self) -> &PrefetchBuffer {
        &self.prefetch
    }

    #[must_use]
    pub fn slot(&self, slot: Slot) -> &SlotImage {
        self.prefetch.slot(slot)
    }

    pub fn resize(&mut self, viewport: Size, insets: Insets) {
        self.carousel.set_page_width(viewport.width);
        self.overlay.set_viewport(viewport, insets);
    }

    /// A one-finger drag started on the photo. Zoomed photos pan; others swipe.
    pub fn drag_began(&mut self) -> DragRoute {
        self.route = if self.zoom.begin_pan() {
            DragRoute::Pan
        } else if self.carousel.begin_drag(self.zoom.is_zoomed()) {
            DragRoute::Swipe
        } else {
            DragRoute::Ignored
        };
        self.route
    }

    pub fn drag_changed(&mut self, translation: Vec2) {
        match self.route {
            DragRoute::Swipe => self.carousel.drag_changed(translation.x),
            DragRoute::Pan => self.zoom.pan_changed(translation),
            DragRoute::Ignored => {}
        }
    }

    pub fn drag_ended(&mut self, translation: Vec2, predicted_end: Vec2) -> DragResult {
        let route = std::mem::replace(&mut self.route, DragRoute::Ignored);
        match route {
            DragRoute::Swipe => {
                DragResult::Swipe(self.carousel.end_drag(translation.x, predicted_end.x))
            }
            DragRoute::Pan => DragResult::Pan(self.zoom.pan_ended(translation)),
            DragRoute::Ignored => DragResult::Ignored,
        }
    }

    /// A pinch takes over from any swipe that was being tracked.
    pub fn pinch_changed(&mut self, factor: f32) {
        if self.route == DragRoute::Swipe {
            self.carousel.cancel_drag();
            self.route = DragRoute::Ignored;
        }
        self.zoom.pinch_changed(factor);
    }

    pub fn pinch_ended(&mut self, factor: f32) -> ZoomTarget {
        self.zoom.pinch_ended(factor)
    }

    pub fn double_tap(&mut self) -> ZoomTarget {
        self.zoom.double_tap()
    }

    /// Programmatic one-photo navigation, serialized behind any in-flight commit.
    pub fn step(&mut self, direction: Direction) -> StepOutcome {
        if self.zoom.is_zoomed() {
            return StepOutcome::Rejected;
        }
        self.carousel.request_step(direction)
    }

    /// The host finished the commit slide. Moves the index, resets zoom and
    /// rotates the prefetch slots.
    pub fn transition_finished(&mut self) -> Option<TransitionDone> {
        let committed = self.carousel.finish_transition()?;
        self.zoom.reset();
        self.prefetch.shift(committed.direction);
        let chained = self.carousel.start_pending();
        Some(TransitionDone {
            direction: committed.direction,
            index: committed.index,
            chained,
        })
    }

    pub fn overlay_drag_changed(&mut self, translation: Vec2) {
        self.overlay.drag_changed(translation);
    }

    pub fn overlay_drag_ended(&mut self, translation: Vec2) -> OverlaySnap {
        self.overlay.drag_ended(translation)
    }

    /// Apply fetch results that have already arrived.
    pub fn poll_images(&mut self) -> Vec<Slot> {
        self.prefetch.poll_completions()
    }

    /// Wait for the next slot to resolve. `None` when nothing is in flight.
    pub async fn next_image(&mut self) -> Option<Slot> {
        self.prefetch.next_completion().await
    }

    /// Wait until every slot has resolved.
    pub async fn settle_images(&mut self) {
        self.prefetch.settle().await;
    }
}
