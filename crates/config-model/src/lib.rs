use std::time::Duration;

use anyhow::{Result, ensure};
use serde::Deserialize;

pub use carousel::CarouselConfig;
pub use overlay::OverlayConfig;
pub use playback::{CatalogTrackConfig, PlaybackConfig};
pub use zoom::ZoomConfig;

mod carousel {
    use super::*;

    /// Swipe commit thresholds and settle animation timing for the detail carousel.
    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
    pub struct CarouselConfig {
        /// Horizontal translation (logical units) past which a release commits.
        pub commit_distance: f32,
        /// Projected release velocity (units/second) past which a release commits.
        pub commit_velocity: f32,
        /// Duration of the slide that precedes an index commit.
        #[serde(with = "humantime_serde")]
        pub commit_duration: Duration,
        /// Duration of the slide back to rest after a rollback.
        #[serde(with = "humantime_serde")]
        pub rollback_duration: Duration,
    }

    impl CarouselConfig {
        const DEFAULT_COMMIT_DISTANCE: f32 = 100.0;
        const DEFAULT_COMMIT_VELOCITY: f32 = 500.0;

        pub fn validate(&self) -> Result<()> {
            ensure!(
                self.commit_distance.is_finite() && self.commit_distance > 0.0,
                "carousel.commit-distance must be positive"
            );
            ensure!(
                self.commit_velocity.is_finite() && self.commit_velocity > 0.0,
                "carousel.commit-velocity must be positive"
            );
            ensure!(
                !self.commit_duration.is_zero(),
                "carousel.commit-duration must be greater than zero"
            );
            Ok(())
        }
    }

    impl Default for CarouselConfig {
        fn default() -> Self {
            Self {
                commit_distance: Self::DEFAULT_COMMIT_DISTANCE,
                commit_velocity: Self::DEFAULT_COMMIT_VELOCITY,
                commit_duration: Duration::from_millis(300),
                rollback_duration: Duration::from_millis(250),
            }
        }
    }
}

mod zoom {
    use super::*;

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
    pub struct ZoomConfig {
        /// Smallest committed scale; anything below snaps back to identity.
        pub min_scale: f32,
        /// Largest committed scale.
        pub max_scale: f32,
        /// Floor for the live scale while a pinch is still in progress.
        pub elastic_min_scale: f32,
        /// Scale applied by a double tap on an unzoomed photo.
        pub double_tap_scale: f32,
        /// Per-axis pan clamp (logical units from center) once a pan settles.
        pub pan_limit: f32,
        #[serde(with = "humantime_serde")]
        pub reset_duration: Duration,
    }

    impl ZoomConfig {
        pub fn validate(&self) -> Result<()> {
            ensure!(
                self.elastic_min_scale.is_finite() && self.elastic_min_scale > 0.0,
                "zoom.elastic-min-scale must be positive"
            );
            ensure!(
                self.elastic_min_scale <= self.min_scale,
                "zoom.elastic-min-scale must not exceed zoom.min-scale"
            );
            ensure!(
                self.min_scale.is_finite() && self.max_scale.is_finite(),
                "zoom scale bounds must be finite"
            );
            ensure!(
                self.min_scale < self.max_scale,
                "zoom.min-scale must be less than zoom.max-scale"
            );
            ensure!(
                self.double_tap_scale > self.min_scale && self.double_tap_scale <= self.max_scale,
                "zoom.double-tap-scale must lie within (min-scale, max-scale]"
            );
            ensure!(
                self.pan_limit.is_finite() && self.pan_limit >= 0.0,
                "zoom.pan-limit must be non-negative"
            );
            Ok(())
        }
    }

    impl Default for ZoomConfig {
        fn default() -> Self {
            Self {
                min_scale: 1.0,
                max_scale: 5.0,
                elastic_min_scale: 0.5,
                double_tap_scale: 2.0,
                pan_limit: 100.0,
                reset_duration: Duration::from_millis(350),
            }
        }
    }
}

mod overlay {
    use super::*;

    /// Geometry of the floating player widget and its docking rules.
    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
    pub struct OverlayConfig {
        pub widget_width: f32,
        pub widget_height: f32,
        /// Distance from an edge within which the widget center docks to that edge.
        pub edge_margin: f32,
        /// Distance from a top corner within which both axes dock together.
        pub corner_margin: f32,
        /// Gap kept between a docked widget and the safe area.
        pub dock_padding: f32,
        #[serde(with = "humantime_serde")]
        pub snap_duration: Duration,
    }

    impl OverlayConfig {
        pub fn validate(&self) -> Result<()> {
            ensure!(
                self.widget_width > 0.0 && self.widget_height > 0.0,
                "overlay widget dimensions must be positive"
            );
            ensure!(
                self.edge_margin >= 0.0,
                "overlay.edge-margin must be non-negative"
            );
            ensure!(
                self.corner_margin >= self.edge_margin,
                "overlay.corner-margin must be at least overlay.edge-margin"
            );
            ensure!(
                self.dock_padding >= 0.0,
                "overlay.dock-padding must be non-negative"
            );
            Ok(())
        }
    }

    impl Default for OverlayConfig {
        fn default() -> Self {
            Self {
                widget_width: 280.0,
                widget_height: 64.0,
                edge_margin: 100.0,
                corner_margin: 150.0,
                dock_padding: 16.0,
                snap_duration: Duration::from_millis(250),
            }
        }
    }
}

mod playback {
    use super::*;

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
    pub struct PlaybackConfig {
        /// Keywords the random-track picker chooses from.
        pub topics: Vec<String>,
        /// Maximum number of catalog results requested per random pick.
        pub search_limit: usize,
    }

    impl PlaybackConfig {
        const DEFAULT_TOPICS: &'static [&'static str] = &[
            "pop",
            "rock",
            "jazz",
            "electronic",
            "indie",
            "classic",
            "alternative",
            "dance",
        ];

        pub fn validate(&self) -> Result<()> {
            ensure!(
                !self.topics.is_empty(),
                "playback.topics must name at least one keyword"
            );
            for topic in &self.topics {
                ensure!(
                    !topic.trim().is_empty(),
                    "playback.topics entries must not be blank"
                );
            }
            ensure!(
                self.search_limit > 0,
                "playback.search-limit must be greater than zero"
            );
            Ok(())
        }
    }

    impl Default for PlaybackConfig {
        fn default() -> Self {
            Self {
                topics: Self::DEFAULT_TOPICS
                    .iter()
                    .map(|topic| (*topic).to_owned())
                    .collect(),
                search_limit: 25,
            }
        }
    }

    /// One entry of the locally configured track catalog.
    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "kebab-case", deny_unknown_fields)]
    pub struct CatalogTrackConfig {
        pub id: String,
        pub title: String,
        pub artist: String,
        #[serde(default)]
        pub tags: Vec<String>,
    }
}
