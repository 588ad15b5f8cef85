//! Photo identities, decoded bitmaps and the asset-store seam.

use std::fmt;
use std::sync::Arc;
use std::time::SystemTime;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::OnceCell;

/// Stable identifier of a photo inside its asset store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PhotoId(Arc<str>);

impl PhotoId {
    pub fn new(id: impl Into<Arc<str>>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PhotoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

/// Metadata resolved on demand from the asset store.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PhotoMetadata {
    pub captured_at: Option<DateTime<Utc>>,
    pub location: Option<GeoPoint>,
    pub is_favorite: bool,
    pub pixel_size: Option<(u32, u32)>,
}

/// A photo in the gallery: identity plus lazily resolved metadata.
#[derive(Debug, Clone)]
pub struct PhotoRef {
    id: PhotoId,
    created_at: Option<SystemTime>,
    metadata: OnceCell<PhotoMetadata>,
}

impl PhotoRef {
    pub fn new(id: PhotoId, created_at: Option<SystemTime>) -> Self {
        Self {
            id,
            created_at,
            metadata: OnceCell::new(),
        }
    }

    #[must_use]
    pub fn id(&self) -> &PhotoId {
        &self.id
    }

    /// Listing timestamp used for newest-first ordering.
    #[must_use]
    pub fn created_at(&self) -> Option<SystemTime> {
        self.created_at
    }

    /// Metadata if it has already been resolved.
    #[must_use]
    pub fn metadata(&self) -> Option<&PhotoMetadata> {
        self.metadata.get()
    }

    /// Resolve metadata through `store` once; later calls return the memoized value.
    pub async fn resolve_metadata(&self, store: &dyn AssetStore) -> &PhotoMetadata {
        self.metadata
            .get_or_init(|| async { store.metadata(self).await })
            .await
    }
}

/// Requested decode resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TargetSize {
    /// Native resolution.
    #[default]
    Full,
    /// Downscale so the longer edge is at most `max_dimension`, preserving aspect.
    Fit { max_dimension: u32 },
}

/// RGBA8 pixels ready for upload.
#[derive(Clone, PartialEq, Eq)]
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl fmt::Debug for DecodedImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecodedImage")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.pixels.len())
            .finish()
    }
}

/// Device photo library as seen by the detail view.
///
/// `decode` must not fail loudly: `None` is the failure signal.
#[async_trait]
pub trait AssetStore: Send + Sync {
    async fn request_access(&self) -> bool;

    async fn list_recent(&self, limit: usize) -> Vec<PhotoRef>;

    async fn decode(&self, photo: &PhotoRef, target: TargetSize) -> Option<DecodedImage>;

    async fn metadata(&self, photo: &PhotoRef) -> PhotoMetadata;
}
