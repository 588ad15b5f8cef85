//! Floating player widget: free drag, then dock to an edge or top corner on release.
//!
//! Offsets are the widget's top-left corner in viewport coordinates. Docking
//! decisions look at where the widget's center would land.

use std::time::Duration;

use tracing::debug;

use crate::config::OverlayConfig;
use crate::geometry::{Insets, Size, Vec2};

/// Docking geometry derived from [`OverlayConfig`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SnapRules {
    pub widget: Size,
    pub edge_margin: f32,
    pub corner_margin: f32,
    pub dock_padding: f32,
}

impl From<&OverlayConfig> for SnapRules {
    fn from(cfg: &OverlayConfig) -> Self {
        Self {
            widget: Size::new(cfg.widget_width, cfg.widget_height),
            edge_margin: cfg.edge_margin,
            corner_margin: cfg.corner_margin,
            dock_padding: cfg.dock_padding,
        }
    }
}

struct DockLines {
    left: f32,
    right: f32,
    top: f32,
    bottom: f32,
}

impl SnapRules {
    fn dock_lines(&self, viewport: Size, insets: Insets) -> DockLines {
        DockLines {
            left: insets.left + self.dock_padding,
            right: viewport.width - insets.right - self.dock_padding - self.widget.width,
            top: insets.top + self.dock_padding,
            bottom: viewport.height - insets.bottom - self.dock_padding - self.widget.height,
        }
    }

    /// Resting spot before the user has moved the widget: bottom-docked, centered.
    #[must_use]
    pub fn default_position(&self, viewport: Size, insets: Insets) -> Vec2 {
        let lines = self.dock_lines(viewport, insets);
        let usable = viewport.width - insets.left - insets.right;
        Vec2::new(
            insets.left + (usable - self.widget.width) / 2.0,
            lines.bottom,
        )
    }

    /// Where a widget released at `candidate` comes to rest.
    ///
    /// Top corners dock both axes at once and win over the per-axis edge rules.
    #[must_use]
    pub fn compute_snap(&self, viewport: Size, insets: Insets, candidate: Vec2) -> Vec2 {
        let lines = self.dock_lines(viewport, insets);
        let center = Vec2::new(
            candidate.x + self.widget.width / 2.0,
            candidate.y + self.widget.height / 2.0,
        );
        let from_left = center.x - insets.left;
        let from_right = viewport.width - insets.right - center.x;
        let from_top = center.y - insets.top;
        let from_bottom = viewport.height - insets.bottom - center.y;

        if from_top <= self.corner_margin {
            if from_left <= self.corner_margin {
                return Vec2::new(lines.left, lines.top);
            }
            if from_right <= self.corner_margin {
                return Vec2::new(lines.right, lines.top);
            }
        }

        let x = if from_left <= self.edge_margin {
            lines.left
        } else if from_right <= self.edge_margin {
            lines.right
        } else {
            candidate.x
        };
        let y = if from_top <= self.edge_margin {
            lines.top
        } else if from_bottom <= self.edge_margin {
            lines.bottom
        } else {
            candidate.y
        };
        Vec2::new(x, y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OverlayPhase {
    Settled,
    Dragging { live: Vec2 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlaySnap {
    pub from: Vec2,
    pub to: Vec2,
    pub duration: Duration,
}

/// Position state of the floating widget. Independent of carousel transitions.
#[derive(Debug, Clone)]
pub struct Overlay {
    settled: Vec2,
    phase: OverlayPhase,
    rules: SnapRules,
    viewport: Size,
    insets: Insets,
    snap_duration: Duration,
}

impl Overlay {
    pub fn new(config: &OverlayConfig, viewport: Size, insets: Insets) -> Self {
        let rules = SnapRules::from(config);
        Self {
            settled: rules.default_position(viewport, insets),
            phase: OverlayPhase::Settled,
            rules,
            viewport,
            insets,
            snap_duration: config.snap_duration,
        }
    }

    #[must_use]
    pub fn settled_offset(&self) -> Vec2 {
        self.settled
    }

    #[must_use]
    pub fn phase(&self) -> OverlayPhase {
        self.phase
    }

    #[must_use]
    pub fn is_dragging(&self) -> bool {
        matches!(self.phase, OverlayPhase::Dragging { .. })
    }

    /// Render position: settled offset plus any live drag.
    #[must_use]
    pub fn position(&self) -> Vec2 {
        match self.phase {
            OverlayPhase::Settled => self.settled,
            OverlayPhase::Dragging { live } => self.settled + live,
        }
    }

    /// Follow the pointer exactly; no snapping while dragging.
    pub fn drag_changed(&mut self, translation: Vec2) {
        self.phase = OverlayPhase::Dragging { live: translation };
    }

    pub fn drag_ended(&mut self, translation: Vec2) -> OverlaySnap {
        let from = self.settled + translation;
        let to = self.rules.compute_snap(self.viewport, self.insets, from);
        debug!(?from, ?to, "overlay snapped");
        self.settled = to;
        self.phase = OverlayPhase::Settled;
        OverlaySnap {
            from,
            to,
            duration: self.snap_duration,
        }
    }

    /// Viewport or safe area changed; re-dock the settled position against it.
    pub fn set_viewport(&mut self, viewport: Size, insets: Insets) {
        self.viewport = viewport;
        self.insets = insets;
        self.settled = self.rules.compute_snap(viewport, insets, self.settled);
    }

    pub fn reset(&mut self) {
        self.settled = self.rules.default_position(self.viewport, self.insets);
        self.phase = OverlayPhase::Settled;
    }
}
