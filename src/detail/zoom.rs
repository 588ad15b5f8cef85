use std::time::Duration;

use tracing::debug;

use crate::config::ZoomConfig;
use crate::geometry::Vec2;

/// Pan tracking is kept apart from pinches so a pinch landing mid-pan does
/// not lose the pan's origin.
#[derive(Debug, Clone, Copy, PartialEq)]
enum PanGesture {
    Idle,
    /// `origin` is the settled pan the drag started from.
    Active { origin: Vec2 },
}

/// Target the host should move the image to, animated when `duration` is set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoomTarget {
    pub scale: f32,
    pub pan: Vec2,
    pub duration: Option<Duration>,
}

/// Scale and pan of the photo currently on screen.
///
/// Zoomed-ness is derived from `scale`, never stored.
#[derive(Debug, Clone)]
pub struct ZoomState {
    scale: f32,
    base_scale: f32,
    pan: Vec2,
    pan_gesture: PanGesture,
    config: ZoomConfig,
}

impl ZoomState {
    pub fn new(config: ZoomConfig) -> Self {
        Self {
            scale: config.min_scale,
            base_scale: config.min_scale,
            pan: Vec2::ZERO,
            pan_gesture: PanGesture::Idle,
            config,
        }
    }

    #[must_use]
    pub fn scale(&self) -> f32 {
        self.scale
    }

    /// Committed scale the next pinch composes with.
    #[must_use]
    pub fn base_scale(&self) -> f32 {
        self.base_scale
    }

    #[must_use]
    pub fn pan(&self) -> Vec2 {
        self.pan
    }

    #[must_use]
    pub fn is_zoomed(&self) -> bool {
        self.scale > self.config.min_scale
    }

    #[must_use]
    pub fn is_panning(&self) -> bool {
        matches!(self.pan_gesture, PanGesture::Active { .. })
    }

    /// Live pinch update; `factor` is relative to the start of the pinch.
    pub fn pinch_changed(&mut self, factor: f32) {
        let factor = sanitize(factor);
        self.scale = (self.base_scale * factor)
            .clamp(self.config.elastic_min_scale, self.config.max_scale);
    }

    /// Settle a pinch: below the minimum resets, above the maximum clamps.
    pub fn pinch_ended(&mut self, factor: f32) -> ZoomTarget {
        let factor = sanitize(factor);
        let proposed = self.base_scale * factor;
        if proposed < self.config.min_scale {
            debug!(proposed, "pinch below minimum; resetting zoom");
            self.reset();
            return self.target(Some(self.config.reset_duration));
        }
        let committed = proposed.min(self.config.max_scale);
        self.scale = committed;
        self.base_scale = committed;
        self.pan = self.pan.clamp_abs(self.config.pan_limit);
        debug!(scale = committed, "pinch committed");
        self.target(None)
    }

    /// Start panning the zoomed image. Refused at identity.
    pub fn begin_pan(&mut self) -> bool {
        if !self.is_zoomed() {
            return false;
        }
        self.pan_gesture = PanGesture::Active { origin: self.pan };
        true
    }

    pub fn pan_changed(&mut self, translation: Vec2) {
        if let PanGesture::Active { origin } = self.pan_gesture {
            self.pan = origin + translation;
        }
    }

    /// Finish a pan; the result is hard-clamped per axis.
    pub fn pan_ended(&mut self, translation: Vec2) -> ZoomTarget {
        if let PanGesture::Active { origin } = self.pan_gesture {
            self.pan = origin + translation;
        }
        self.pan_gesture = PanGesture::Idle;
        if self.is_zoomed() {
            self.pan = self.pan.clamp_abs(self.config.pan_limit);
        } else {
            self.pan = Vec2::ZERO;
        }
        self.target(None)
    }

    /// Toggle between identity and the double-tap scale.
    pub fn double_tap(&mut self) -> ZoomTarget {
        self.pan_gesture = PanGesture::Idle;
        if self.is_zoomed() {
            self.reset();
        } else {
            self.scale = self.config.double_tap_scale;
            self.base_scale = self.config.double_tap_scale;
            self.pan = Vec2::ZERO;
        }
        self.target(Some(self.config.reset_duration))
    }

    /// Back to identity, immediately.
    pub fn reset(&mut self) {
        self.scale = self.config.min_scale;
        self.base_scale = self.config.min_scale;
        self.pan = Vec2::ZERO;
        self.pan_gesture = PanGesture::Idle;
    }

    fn target(&self, duration: Option<Duration>) -> ZoomTarget {
        ZoomTarget {
            scale: self.scale,
            pan: self.pan,
            duration,
        }
    }
}

fn sanitize(factor: f32) -> f32 {
    if factor.is_finite() && factor > 0.0 {
        factor
    } else {
        1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn zoom() -> ZoomState {
        ZoomState::new(ZoomConfig::default())
    }

    #[test]
    fn live_pinch_is_soft_clamped() {
        let mut z = zoom();
        z.pinch_changed(0.2);
        assert_eq!(z.scale(), 0.5);
        z.pinch_changed(9.0);
        assert_eq!(z.scale(), 5.0);
    }

    #[test]
    fn pinch_below_one_resets_to_identity() {
        let mut z = zoom();
        z.pinch_ended(3.0);
        assert!(z.begin_pan());
        z.pan_ended(Vec2::new(40.0, -20.0));

        z.pinch_changed(0.2);
        let target = z.pinch_ended(0.2);
        assert_eq!(target.scale, 1.0);
        assert_eq!(target.pan, Vec2::ZERO);
        assert!(target.duration.is_some());
        assert!(!z.is_zoomed());
        assert_eq!(z.base_scale(), 1.0);
    }

    #[test]
    fn pinch_composes_multiplicatively_and_hard_clamps() {
        let mut z = zoom();
        z.pinch_ended(2.0);
        assert_eq!(z.base_scale(), 2.0);
        z.pinch_ended(1.5);
        assert_eq!(z.scale(), 3.0);
        z.pinch_ended(4.0);
        assert_eq!(z.scale(), 5.0);
        assert_eq!(z.base_scale(), 5.0);
    }

    #[test]
    fn committed_scale_stays_in_range_for_any_sequence() {
        let mut z = zoom();
        for factor in [0.7, 1.3, 8.0, 0.1, 2.2, 0.9, 3.3, f32::NAN, 0.0, 1.01] {
            z.pinch_changed(factor);
            z.pinch_ended(factor);
            assert!((1.0..=5.0).contains(&z.scale()), "scale {}", z.scale());
            if z.scale() == 1.0 {
                assert_eq!(z.pan(), Vec2::ZERO);
            }
        }
    }

    #[test]
    fn pan_requires_zoom_and_clamps_on_release() {
        let mut z = zoom();
        assert!(!z.begin_pan());

        z.double_tap();
        assert_eq!(z.scale(), 2.0);
        assert!(z.begin_pan());
        z.pan_changed(Vec2::new(250.0, -30.0));
        assert_eq!(z.pan(), Vec2::new(250.0, -30.0), "live pan is unclamped");
        z.pan_ended(Vec2::new(250.0, -30.0));
        assert_eq!(z.pan(), Vec2::new(100.0, -30.0));

        assert!(z.begin_pan());
        z.pan_ended(Vec2::new(-50.0, -500.0));
        assert_eq!(z.pan(), Vec2::new(50.0, -100.0));
    }

    #[test]
    fn pinch_mid_pan_keeps_origin_and_clamp() {
        let mut z = zoom();
        z.double_tap();
        assert!(z.begin_pan());
        z.pan_changed(Vec2::new(300.0, -250.0));

        z.pinch_changed(1.1);
        let pinched = z.pinch_ended(1.1);
        assert!(pinched.pan.x <= 100.0 && pinched.pan.y >= -100.0);
        assert!(z.is_panning(), "pan survives the pinch");

        z.pan_changed(Vec2::new(320.0, -260.0));
        let released = z.pan_ended(Vec2::new(320.0, -260.0));
        assert_eq!(released.pan, Vec2::new(100.0, -100.0));
        assert!((released.scale - 2.2).abs() < 1e-5);
        assert!(!z.is_panning());
    }

    #[test]
    fn pan_released_after_pinch_reset_stays_centered() {
        let mut z = zoom();
        z.double_tap();
        assert!(z.begin_pan());
        z.pan_changed(Vec2::new(60.0, 0.0));
        z.pinch_ended(0.3);
        let released = z.pan_ended(Vec2::new(80.0, 10.0));
        assert_eq!(released.scale, 1.0);
        assert_eq!(released.pan, Vec2::ZERO);
    }

    #[test]
    fn double_tap_toggles() {
        let mut z = zoom();
        let zoomed = z.double_tap();
        assert_eq!(zoomed.scale, 2.0);
        let back = z.double_tap();
        assert_eq!(back.scale, 1.0);
        assert_eq!(back.pan, Vec2::ZERO);
        assert!(!z.is_zoomed());
    }
}
