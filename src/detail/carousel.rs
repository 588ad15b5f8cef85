use std::collections::VecDeque;
use std::time::Duration;

use tracing::debug;

use crate::config::CarouselConfig;

/// Travel direction of a committed navigation. `Forward` moves to the next photo.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CarouselPhase {
    Idle,
    Dragging { offset: f32 },
    /// The slide animation is in flight; the index changes when it finishes.
    Committing { direction: Direction },
}

/// Horizontal offset animation the host should run after a release.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SettleAnimation {
    pub from: f32,
    pub to: f32,
    pub duration: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Release {
    /// No swipe was being tracked.
    Ignored,
    Commit {
        direction: Direction,
        animation: SettleAnimation,
    },
    Rollback { animation: SettleAnimation },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StepOutcome {
    Started {
        direction: Direction,
        animation: SettleAnimation,
    },
    /// Waiting behind the commit currently in flight.
    Queued,
    /// Already at the first/last photo, or a drag is in progress.
    Rejected,
}

/// Emitted when a commit animation completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Committed {
    pub direction: Direction,
    pub index: usize,
}

/// Index/offset state machine for the horizontal photo pager.
#[derive(Debug)]
pub struct Carousel {
    len: usize,
    index: usize,
    phase: CarouselPhase,
    pending: VecDeque<Direction>,
    page_width: f32,
    config: CarouselConfig,
}

impl Carousel {
    /// `len` must be non-zero and `index < len`; the detail view checks both.
    pub fn new(len: usize, index: usize, page_width: f32, config: CarouselConfig) -> Self {
        debug_assert!(index < len);
        Self {
            len,
            index,
            phase: CarouselPhase::Idle,
            pending: VecDeque::new(),
            page_width,
            config,
        }
    }

    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[must_use]
    pub fn phase(&self) -> CarouselPhase {
        self.phase
    }

    /// Live drag offset; zero outside a drag.
    #[must_use]
    pub fn drag_offset(&self) -> f32 {
        match self.phase {
            CarouselPhase::Dragging { offset } => offset,
            _ => 0.0,
        }
    }

    #[must_use]
    pub fn is_transitioning(&self) -> bool {
        matches!(self.phase, CarouselPhase::Committing { .. })
    }

    pub fn set_page_width(&mut self, page_width: f32) {
        self.page_width = page_width;
    }

    /// Start tracking a swipe. Refused while zoomed or while a commit is in flight.
    pub fn begin_drag(&mut self, zoomed: bool) -> bool {
        if zoomed || self.phase != CarouselPhase::Idle {
            return false;
        }
        self.phase = CarouselPhase::Dragging { offset: 0.0 };
        true
    }

    /// Track raw horizontal translation. Boundaries still move (rubber-band).
    pub fn drag_changed(&mut self, translation: f32) {
        if let CarouselPhase::Dragging { offset } = &mut self.phase {
            *offset = translation;
        }
    }

    /// Abandon a drag without animation, e.g. when a pinch takes over.
    pub fn cancel_drag(&mut self) {
        if matches!(self.phase, CarouselPhase::Dragging { .. }) {
            self.phase = CarouselPhase::Idle;
        }
    }

    /// Decide commit or rollback for a released swipe.
    ///
    /// `predicted_end` is where the host projects the gesture would come to
    /// rest; `predicted_end - translation` stands in for release velocity.
    pub fn end_drag(&mut self, translation: f32, predicted_end: f32) -> Release {
        if !matches!(self.phase, CarouselPhase::Dragging { .. }) {
            return Release::Ignored;
        }
        let velocity = predicted_end - translation;
        let distance = self.config.commit_distance;
        let fling = self.config.commit_velocity;

        let wants_forward = translation <= -distance || velocity <= -fling;
        let wants_backward = translation >= distance || velocity >= fling;
        let can_forward = wants_forward && self.index + 1 < self.len;
        let can_backward = wants_backward && self.index > 0;

        let direction = match (can_forward, can_backward) {
            (true, true) if predicted_end > 0.0 => Some(Direction::Backward),
            (true, _) => Some(Direction::Forward),
            (false, true) => Some(Direction::Backward),
            (false, false) => None,
        };

        match direction {
            Some(direction) => {
                debug!(?direction, translation, velocity, index = self.index, "swipe commit");
                self.phase = CarouselPhase::Committing { direction };
                Release::Commit {
                    direction,
                    animation: self.commit_animation(direction, translation),
                }
            }
            None => {
                debug!(translation, velocity, index = self.index, "swipe rollback");
                self.phase = CarouselPhase::Idle;
                Release::Rollback {
                    animation: SettleAnimation {
                        from: translation,
                        to: 0.0,
                        duration: self.config.rollback_duration,
                    },
                }
            }
        }
    }

    /// Navigate one photo without a drag. Serialized behind an in-flight commit.
    pub fn request_step(&mut self, direction: Direction) -> StepOutcome {
        match self.phase {
            CarouselPhase::Committing { .. } => {
                self.pending.push_back(direction);
                StepOutcome::Queued
            }
            CarouselPhase::Dragging { .. } => StepOutcome::Rejected,
            CarouselPhase::Idle => match self.start_commit(direction) {
                Some(animation) => StepOutcome::Started {
                    direction,
                    animation,
                },
                None => StepOutcome::Rejected,
            },
        }
    }

    /// Complete the in-flight slide: move the index and return to idle.
    pub fn finish_transition(&mut self) -> Option<Committed> {
        let CarouselPhase::Committing { direction } = self.phase else {
            return None;
        };
        self.index = match direction {
            Direction::Forward => self.index + 1,
            Direction::Backward => self.index - 1,
        };
        self.phase = CarouselPhase::Idle;
        debug!(?direction, index = self.index, "carousel committed");
        Some(Committed {
            direction,
            index: self.index,
        })
    }

    /// Start the next queued step, skipping any that would cross a boundary.
    pub fn start_pending(&mut self) -> Option<(Direction, SettleAnimation)> {
        if self.phase != CarouselPhase::Idle {
            return None;
        }
        while let Some(direction) = self.pending.pop_front() {
            if let Some(animation) = self.start_commit(direction) {
                return Some((direction, animation));
            }
            debug!(?direction, index = self.index, "dropping queued step at boundary");
        }
        None
    }

    /// Forget queued steps, e.g. when the detail view goes away.
    pub fn clear_pending(&mut self) {
        self.pending.clear();
    }

    fn start_commit(&mut self, direction: Direction) -> Option<SettleAnimation> {
        let allowed = match direction {
            Direction::Forward => self.index + 1 < self.len,
            Direction::Backward => self.index > 0,
        };
        if !allowed {
            return None;
        }
        self.phase = CarouselPhase::Committing { direction };
        Some(self.commit_animation(direction, 0.0))
    }

    fn commit_animation(&self, direction: Direction, from: f32) -> SettleAnimation {
        let to = match direction {
            Direction::Forward => -self.page_width,
            Direction::Backward => self.page_width,
        };
        SettleAnimation {
            from,
            to,
            duration: self.config.commit_duration,
        }
    }
}
