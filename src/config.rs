use std::path::{Path, PathBuf};

use anyhow::{Context, Result, ensure};
use serde::Deserialize;

pub use config_model::{
    CarouselConfig, CatalogTrackConfig, OverlayConfig, PlaybackConfig, ZoomConfig,
};

use crate::detail::DetailOptions;
use crate::gallery::TargetSize;
use crate::geometry::{Insets, Size};
use crate::playback::LocalCatalog;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct Configuration {
    /// Root directory scanned recursively for photos.
    pub photo_library_path: PathBuf,
    /// How many of the newest photos the gallery lists.
    pub recent_limit: usize,
    /// Longest edge, in pixels, of images decoded for the detail view.
    /// Unset decodes at native resolution.
    pub detail_max_dimension: Option<u32>,
    pub carousel: CarouselConfig,
    pub zoom: ZoomConfig,
    pub overlay: OverlayConfig,
    pub playback: PlaybackConfig,
    /// Tracks offered by the built-in catalog.
    pub catalog: Vec<CatalogTrackConfig>,
}

impl Configuration {
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let s = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        Ok(serde_yaml::from_str(&s)?)
    }

    /// Validate runtime invariants that cannot be expressed via serde defaults alone.
    pub fn validated(self) -> Result<Self> {
        ensure!(
            self.recent_limit > 0,
            "recent-limit must be greater than zero"
        );
        if let Some(max) = self.detail_max_dimension {
            ensure!(max > 0, "detail-max-dimension must be greater than zero");
        }
        self.carousel
            .validate()
            .context("invalid carousel configuration")?;
        self.zoom.validate().context("invalid zoom configuration")?;
        self.overlay
            .validate()
            .context("invalid overlay configuration")?;
        self.playback
            .validate()
            .context("invalid playback configuration")?;
        for (i, track) in self.catalog.iter().enumerate() {
            ensure!(
                !track.id.trim().is_empty(),
                "catalog entry {i} has an empty id"
            );
        }
        Ok(self)
    }

    #[must_use]
    pub fn target_size(&self) -> TargetSize {
        match self.detail_max_dimension {
            Some(max_dimension) => TargetSize::Fit { max_dimension },
            None => TargetSize::Full,
        }
    }

    #[must_use]
    pub fn detail_options(&self, viewport: Size, insets: Insets) -> DetailOptions {
        DetailOptions {
            carousel: self.carousel.clone(),
            zoom: self.zoom.clone(),
            overlay: self.overlay.clone(),
            target: self.target_size(),
            viewport,
            insets,
        }
    }

    #[must_use]
    pub fn local_catalog(&self) -> LocalCatalog {
        LocalCatalog::from_config(&self.catalog)
    }
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            photo_library_path: PathBuf::new(),
            recent_limit: 100,
            detail_max_dimension: None,
            carousel: CarouselConfig::default(),
            zoom: ZoomConfig::default(),
            overlay: OverlayConfig::default(),
            playback: PlaybackConfig::default(),
            catalog: Vec::new(),
        }
    }
}
