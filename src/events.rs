use std::sync::Arc;

use crate::gallery::{DecodedImage, PhotoId};
use crate::playback::{PlaybackStatus, TrackInfo};

/// Monotonic tag attached to every image fetch the prefetch buffer issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestToken(pub u64);

/// Fetch task -> prefetch buffer. `image` is `None` when the decode failed.
#[derive(Debug, Clone)]
pub struct FetchCompleted {
    pub token: RequestToken,
    pub photo: PhotoId,
    pub image: Option<Arc<DecodedImage>>,
}

/// Published by the playback session after every operation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlaybackSnapshot {
    pub status: PlaybackStatus,
    pub track: Option<TrackInfo>,
    pub queue_len: usize,
}
