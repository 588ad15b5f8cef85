//! In-memory collaborators for exercising the detail engine without a photo library.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use tokio::sync::Notify;

use crate::gallery::{AssetStore, DecodedImage, PhotoId, PhotoMetadata, PhotoRef, TargetSize};

#[derive(Default)]
struct StubState {
    decode_calls: HashMap<PhotoId, usize>,
    unavailable: HashSet<PhotoId>,
    gates: HashMap<PhotoId, Arc<Notify>>,
}

/// Asset store over `photo-0..photo-N` that counts decodes per photo.
///
/// Decodes of a gated photo block until [`StubAssetStore::release`] is called.
pub struct StubAssetStore {
    photos: Vec<PhotoRef>,
    state: Mutex<StubState>,
}

impl StubAssetStore {
    pub fn with_photos(count: usize) -> Self {
        let photos = (0..count)
            .map(|i| PhotoRef::new(PhotoId::new(format!("photo-{i}")), None))
            .collect();
        Self {
            photos,
            state: Mutex::new(StubState::default()),
        }
    }

    pub fn photos(&self) -> Vec<PhotoRef> {
        self.photos.clone()
    }

    pub fn decode_count(&self, id: &str) -> usize {
        self.lock()
            .decode_calls
            .get(&PhotoId::new(id))
            .copied()
            .unwrap_or(0)
    }

    pub fn total_decodes(&self) -> usize {
        self.lock().decode_calls.values().sum()
    }

    pub fn mark_unavailable(&self, id: &str) {
        self.lock().unavailable.insert(PhotoId::new(id));
    }

    pub fn gate(&self, id: &str) {
        self.lock()
            .gates
            .insert(PhotoId::new(id), Arc::new(Notify::new()));
    }

    /// Let one pending (or the next) decode of `id` finish.
    pub fn release(&self, id: &str) {
        if let Some(gate) = self.lock().gates.get(&PhotoId::new(id)) {
            gate.notify_one();
        }
    }

    fn lock(&self) -> MutexGuard<'_, StubState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl AssetStore for StubAssetStore {
    async fn request_access(&self) -> bool {
        true
    }

    async fn list_recent(&self, limit: usize) -> Vec<PhotoRef> {
        self.photos.iter().take(limit).cloned().collect()
    }

    async fn decode(&self, photo: &PhotoRef, _target: TargetSize) -> Option<DecodedImage> {
        let (gate, unavailable) = {
            let mut state = self.lock();
            *state.decode_calls.entry(photo.id().clone()).or_default() += 1;
            (
                state.gates.get(photo.id()).cloned(),
                state.unavailable.contains(photo.id()),
            )
        };
        if let Some(gate) = gate {
            gate.notified().await;
        }
        if unavailable {
            return None;
        }
        let shade = photo.id().as_str().bytes().fold(0u8, u8::wrapping_add);
        Some(DecodedImage {
            width: 1,
            height: 1,
            pixels: vec![shade, shade, shade, 255],
        })
    }

    async fn metadata(&self, _photo: &PhotoRef) -> PhotoMetadata {
        PhotoMetadata {
            pixel_size: Some((1, 1)),
            ..PhotoMetadata::default()
        }
    }
}
