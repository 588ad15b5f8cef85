//! Background-music session: catalog/transport seams and the session state machine.

mod local;
mod session;

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::{CatalogError, ServiceError};

pub use local::{LocalCatalog, SimulatedTransport, TransportCalls};
pub use session::{PlaybackSession, Queue, ResumeOutcome, TrackInfoCache};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TrackId(Arc<str>);

impl TrackId {
    pub fn new(id: impl Into<Arc<str>>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Track {
    pub id: TrackId,
    pub title: String,
    pub artist: String,
    pub tags: Vec<String>,
}

impl Track {
    #[must_use]
    pub fn info(&self) -> TrackInfo {
        TrackInfo {
            title: self.title.clone(),
            artist: self.artist.clone(),
        }
    }
}

/// Display metadata for the track on screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackInfo {
    pub title: String,
    pub artist: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackStatus {
    #[default]
    Stopped,
    Paused,
    Playing,
}

/// Queue repeat behaviour. The session always loads with `One`; `Off` plays
/// the queue through once and stops at its ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepeatMode {
    Off,
    One,
}

/// Track lookup and search service.
#[async_trait]
pub trait Catalog: Send + Sync {
    async fn authorize(&self) -> bool;

    async fn resolve(&self, id: &TrackId) -> Result<Track, CatalogError>;

    /// May return an empty list; emptiness is not an error here.
    async fn search(&self, term: &str, limit: usize) -> Result<Vec<Track>, CatalogError>;
}

/// Process-wide player queue.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Replace the queue and prepare it for playback.
    async fn load(&self, tracks: &[Track], repeat: RepeatMode) -> Result<(), ServiceError>;

    async fn play(&self) -> Result<(), ServiceError>;

    async fn pause(&self);

    async fn stop(&self);

    async fn skip_next(&self) -> Result<(), ServiceError>;

    async fn skip_previous(&self) -> Result<(), ServiceError>;

    async fn seek_forward(&self);

    async fn seek_backward(&self);

    async fn status(&self) -> PlaybackStatus;

    /// Entry the player is positioned on, if it can tell.
    async fn current_entry(&self) -> Option<Track>;
}
