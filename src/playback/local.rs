//! In-process catalog and transport used by the binary and the tests.

use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use tracing::{debug, trace};

use super::{Catalog, PlaybackStatus, RepeatMode, Track, TrackId, Transport};
use crate::config::CatalogTrackConfig;
use crate::error::{CatalogError, ServiceError};

/// Catalog backed by a fixed track list from configuration.
#[derive(Debug, Clone)]
pub struct LocalCatalog {
    tracks: Arc<[Track]>,
    authorized: bool,
}

impl LocalCatalog {
    pub fn new(tracks: Vec<Track>) -> Self {
        Self {
            tracks: tracks.into(),
            authorized: true,
        }
    }

    pub fn from_config(entries: &[CatalogTrackConfig]) -> Self {
        Self::new(
            entries
                .iter()
                .map(|entry| Track {
                    id: TrackId::new(entry.id.as_str()),
                    title: entry.title.clone(),
                    artist: entry.artist.clone(),
                    tags: entry.tags.clone(),
                })
                .collect(),
        )
    }

    #[must_use]
    pub fn with_authorization(mut self, granted: bool) -> Self {
        self.authorized = granted;
        self
    }

    #[must_use]
    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }
}

fn matches_term(track: &Track, term: &str) -> bool {
    let term = term.to_lowercase();
    track.title.to_lowercase().contains(&term)
        || track.artist.to_lowercase().contains(&term)
        || track.tags.iter().any(|tag| tag.eq_ignore_ascii_case(&term))
}

#[async_trait]
impl Catalog for LocalCatalog {
    async fn authorize(&self) -> bool {
        self.authorized
    }

    async fn resolve(&self, id: &TrackId) -> Result<Track, CatalogError> {
        self.tracks
            .iter()
            .find(|track| &track.id == id)
            .cloned()
            .ok_or_else(|| CatalogError::NotFound(id.clone()))
    }

    async fn search(&self, term: &str, limit: usize) -> Result<Vec<Track>, CatalogError> {
        let found: Vec<Track> = self
            .tracks
            .iter()
            .filter(|track| matches_term(track, term))
            .take(limit)
            .cloned()
            .collect();
        trace!(term, hits = found.len(), "catalog search");
        Ok(found)
    }
}

/// How many times each transport command reached the player.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransportCalls {
    pub load: usize,
    pub play: usize,
    pub pause: usize,
    pub stop: usize,
    pub skip_next: usize,
    pub skip_previous: usize,
    pub seek_forward: usize,
    pub seek_backward: usize,
}

#[derive(Debug, Default)]
struct PlayerState {
    queue: Vec<Track>,
    position: Option<usize>,
    status: PlaybackStatus,
    repeat: Option<RepeatMode>,
    calls: TransportCalls,
    fail_next: Option<String>,
    refuse_play: Option<String>,
}

impl PlayerState {
    fn take_failure(&mut self) -> Result<(), ServiceError> {
        match self.fail_next.take() {
            Some(reason) => Err(ServiceError(reason)),
            None => Ok(()),
        }
    }
}

/// A player queue that lives in memory and counts every command it receives.
///
/// Status can be changed from outside with [`SimulatedTransport::set_status`]
/// to mimic the service pausing or finishing on its own.
#[derive(Debug, Default)]
pub struct SimulatedTransport {
    state: Mutex<PlayerState>,
}

impl SimulatedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, PlayerState> {
        // A panic while holding the lock leaves plain data behind; keep going.
        self.state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    #[must_use]
    pub fn calls(&self) -> TransportCalls {
        self.lock().calls
    }

    #[must_use]
    pub fn repeat_mode(&self) -> Option<RepeatMode> {
        self.lock().repeat
    }

    pub fn set_status(&self, status: PlaybackStatus) {
        self.lock().status = status;
    }

    /// Refuse every `play` with a service error until cleared with `None`.
    pub fn refuse_play(&self, reason: Option<&str>) {
        self.lock().refuse_play = reason.map(str::to_owned);
    }

    /// Forget which entry is current while keeping the queue.
    pub fn detach_position(&self) {
        self.lock().position = None;
    }

    /// Make the next fallible command return a service error.
    pub fn fail_next(&self, reason: impl Into<String>) {
        self.lock().fail_next = Some(reason.into());
    }

    fn step(&self, forward: bool) -> Result<(), ServiceError> {
        let mut state = self.lock();
        if forward {
            state.calls.skip_next += 1;
        } else {
            state.calls.skip_previous += 1;
        }
        state.take_failure()?;
        let len = state.queue.len();
        if len == 0 {
            return Ok(());
        }
        let current = state.position.unwrap_or(0);
        let moved = match (forward, state.repeat) {
            (_, Some(RepeatMode::One)) => current,
            (true, _) => (current + 1).min(len - 1),
            (false, _) => current.saturating_sub(1),
        };
        state.position = Some(moved);
        Ok(())
    }
}

#[async_trait]
impl Transport for SimulatedTransport {
    async fn load(&self, tracks: &[Track], repeat: RepeatMode) -> Result<(), ServiceError> {
        let mut state = self.lock();
        state.calls.load += 1;
        state.take_failure()?;
        state.queue = tracks.to_vec();
        state.position = (!tracks.is_empty()).then_some(0);
        state.repeat = Some(repeat);
        state.status = PlaybackStatus::Paused;
        debug!(entries = tracks.len(), ?repeat, "queue loaded");
        Ok(())
    }

    async fn play(&self) -> Result<(), ServiceError> {
        let mut state = self.lock();
        state.calls.play += 1;
        state.take_failure()?;
        if let Some(reason) = &state.refuse_play {
            return Err(ServiceError(reason.clone()));
        }
        if state.queue.is_empty() {
            return Err(ServiceError("nothing queued".into()));
        }
        state.status = PlaybackStatus::Playing;
        debug!("playing");
        Ok(())
    }

    async fn pause(&self) {
        let mut state = self.lock();
        state.calls.pause += 1;
        if state.status == PlaybackStatus::Playing {
            state.status = PlaybackStatus::Paused;
        }
    }

    async fn stop(&self) {
        let mut state = self.lock();
        state.calls.stop += 1;
        state.status = PlaybackStatus::Stopped;
    }

    async fn skip_next(&self) -> Result<(), ServiceError> {
        self.step(true)
    }

    async fn skip_previous(&self) -> Result<(), ServiceError> {
        self.step(false)
    }

    async fn seek_forward(&self) {
        self.lock().calls.seek_forward += 1;
    }

    async fn seek_backward(&self) {
        self.lock().calls.seek_backward += 1;
    }

    async fn status(&self) -> PlaybackStatus {
        self.lock().status
    }

    async fn current_entry(&self) -> Option<Track> {
        let state = self.lock();
        state.position.and_then(|i| state.queue.get(i).cloned())
    }
}
