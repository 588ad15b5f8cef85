use std::future::Future;
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};

use super::{Catalog, PlaybackStatus, RepeatMode, Track, TrackId, TrackInfo, Transport};
use crate::config::PlaybackConfig;
use crate::error::PlaybackError;
use crate::events::PlaybackSnapshot;

/// What [`PlaybackSession::resume`] ended up doing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResumeOutcome {
    /// Already playing; nothing was sent to the transport.
    AlreadyPlaying,
    /// A paused queue was resumed in place.
    Resumed,
    /// A new random track was queued and started.
    StartedRandom(TrackInfo),
}

/// The session's view of the player queue. `generation` changes exactly when
/// the queue is replaced.
#[derive(Debug, Clone, Default)]
pub struct Queue {
    tracks: Arc<[Track]>,
    generation: u64,
}

impl Queue {
    #[must_use]
    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    fn replaced_with(&self, tracks: Vec<Track>) -> Self {
        Self {
            tracks: tracks.into(),
            generation: self.generation + 1,
        }
    }
}

/// Memoized track info: a hit returns the cached value, a miss resolves once
/// and stores whatever was found.
#[derive(Debug, Clone, Default)]
pub struct TrackInfoCache {
    cached: Option<TrackInfo>,
}

impl TrackInfoCache {
    #[must_use]
    pub fn get(&self) -> Option<&TrackInfo> {
        self.cached.as_ref()
    }

    pub fn populate(&mut self, info: TrackInfo) {
        self.cached = Some(info);
    }

    pub fn invalidate(&mut self) {
        self.cached = None;
    }

    pub async fn get_or_resolve<F, Fut>(&mut self, resolve: F) -> Option<TrackInfo>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Option<TrackInfo>>,
    {
        if let Some(hit) = &self.cached {
            return Some(hit.clone());
        }
        let resolved = resolve().await;
        self.cached.clone_from(&resolved);
        resolved
    }
}

/// Sole owner of the media connection. Every operation takes `&mut self`, so
/// mutations are serialized by ownership; run it behind
/// [`crate::tasks::playback`] to share it.
pub struct PlaybackSession {
    catalog: Arc<dyn Catalog>,
    transport: Arc<dyn Transport>,
    config: PlaybackConfig,
    rng: StdRng,
    queue: Queue,
    status: PlaybackStatus,
    track_info: TrackInfoCache,
    authorized: bool,
    snapshots: watch::Sender<PlaybackSnapshot>,
}

impl PlaybackSession {
    pub fn new(
        catalog: Arc<dyn Catalog>,
        transport: Arc<dyn Transport>,
        config: PlaybackConfig,
        rng: StdRng,
    ) -> Self {
        let (snapshots, _) = watch::channel(PlaybackSnapshot::default());
        Self {
            catalog,
            transport,
            config,
            rng,
            queue: Queue::default(),
            status: PlaybackStatus::Stopped,
            track_info: TrackInfoCache::default(),
            authorized: false,
            snapshots,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<PlaybackSnapshot> {
        self.snapshots.subscribe()
    }

    #[must_use]
    pub fn queue(&self) -> &Queue {
        &self.queue
    }

    /// Status as of the last operation.
    #[must_use]
    pub fn status(&self) -> PlaybackStatus {
        self.status
    }

    #[must_use]
    pub fn cached_track_info(&self) -> Option<&TrackInfo> {
        self.track_info.get()
    }

    /// Queue a single catalog track on repeat.
    #[instrument(skip(self), fields(track = %id))]
    pub async fn set_track(&mut self, id: &TrackId) -> Result<TrackInfo, PlaybackError> {
        let result = self.try_set_track(id).await;
        self.publish().await;
        result
    }

    /// Queue a random track found under a random topic keyword.
    ///
    /// On any failure the existing queue is left as it was.
    pub async fn set_random_track(&mut self) -> Result<TrackInfo, PlaybackError> {
        let result = self.queue_random_track().await;
        self.publish().await;
        result
    }

    /// Bring playback back in line when the detail view (re)appears.
    ///
    /// A paused queue resumes where it was rather than being replaced; a
    /// playing one is left alone; a stopped or empty one gets a fresh random
    /// track. Status is read and acted on in two steps, so a change made by
    /// the service in between is only corrected on the next call.
    ///
    /// A snapshot is published even when this fails, so a queue replaced
    /// before `play` was refused is still visible to subscribers.
    pub async fn resume(&mut self) -> Result<ResumeOutcome, PlaybackError> {
        let result = self.try_resume().await;
        match &result {
            Ok(outcome) => info!(?outcome, "playback resumed"),
            Err(err) => warn!(error = %err, "resume failed"),
        }
        self.publish().await;
        result
    }

    /// Title/artist of the current track, memoized until the queue changes.
    pub async fn current_track_info(&mut self) -> Option<TrackInfo> {
        let transport = Arc::clone(&self.transport);
        let first = self.queue.tracks().first().map(Track::info);
        self.track_info
            .get_or_resolve(|| async move {
                match transport.current_entry().await {
                    Some(track) => Some(track.info()),
                    None => first,
                }
            })
            .await
    }

    pub async fn play(&mut self) -> Result<(), PlaybackError> {
        let result = if !self.queue.is_empty()
            && self.transport.status().await != PlaybackStatus::Playing
        {
            self.transport.play().await.map_err(PlaybackError::from)
        } else {
            Ok(())
        };
        self.publish().await;
        result
    }

    pub async fn pause(&mut self) -> Result<(), PlaybackError> {
        if self.transport.status().await == PlaybackStatus::Playing {
            self.transport.pause().await;
        }
        self.publish().await;
        Ok(())
    }

    pub async fn stop(&mut self) -> Result<(), PlaybackError> {
        if self.transport.status().await != PlaybackStatus::Stopped {
            self.transport.stop().await;
        }
        self.publish().await;
        Ok(())
    }

    /// Skip to the next queue entry.
    pub async fn next(&mut self) -> Result<(), PlaybackError> {
        let result = if self.queue.is_empty() {
            Ok(())
        } else {
            self.transport.skip_next().await.map_err(PlaybackError::from)
        };
        self.publish().await;
        result
    }

    /// Skip to the previous queue entry.
    pub async fn previous(&mut self) -> Result<(), PlaybackError> {
        let result = if self.queue.is_empty() {
            Ok(())
        } else {
            self.transport.skip_previous().await.map_err(PlaybackError::from)
        };
        self.publish().await;
        result
    }

    /// Begin seeking forward.
    pub async fn advance(&mut self) -> Result<(), PlaybackError> {
        if !self.queue.is_empty() {
            self.transport.seek_forward().await;
        }
        self.publish().await;
        Ok(())
    }

    /// Begin seeking backward.
    pub async fn retreat(&mut self) -> Result<(), PlaybackError> {
        if !self.queue.is_empty() {
            self.transport.seek_backward().await;
        }
        self.publish().await;
        Ok(())
    }

    /// Re-read status from the transport, e.g. after returning from background.
    pub async fn refresh(&mut self) -> PlaybackSnapshot {
        self.publish().await;
        self.snapshots.borrow().clone()
    }

    async fn try_set_track(&mut self, id: &TrackId) -> Result<TrackInfo, PlaybackError> {
        self.ensure_authorized().await?;
        let track = self.catalog.resolve(id).await?;
        self.replace_queue(track).await
    }

    async fn try_resume(&mut self) -> Result<ResumeOutcome, PlaybackError> {
        if self.queue.is_empty() {
            return self.start_random().await;
        }
        match self.transport.status().await {
            PlaybackStatus::Paused => {
                self.transport.play().await?;
                Ok(ResumeOutcome::Resumed)
            }
            PlaybackStatus::Playing => Ok(ResumeOutcome::AlreadyPlaying),
            PlaybackStatus::Stopped => self.start_random().await,
        }
    }

    async fn start_random(&mut self) -> Result<ResumeOutcome, PlaybackError> {
        let info = self.queue_random_track().await?;
        self.transport.play().await?;
        Ok(ResumeOutcome::StartedRandom(info))
    }

    async fn queue_random_track(&mut self) -> Result<TrackInfo, PlaybackError> {
        self.ensure_authorized().await?;
        let term = self
            .config
            .topics
            .choose(&mut self.rng)
            .cloned()
            .ok_or(PlaybackError::NoResults)?;
        let found = self
            .catalog
            .search(&term, self.config.search_limit)
            .await
            .map_err(|err| {
                warn!(%term, error = %err, "track search failed");
                PlaybackError::SearchFailed(err)
            })?;
        let Some(track) = found.choose(&mut self.rng).cloned() else {
            debug!(%term, "track search returned nothing");
            return Err(PlaybackError::NoResults);
        };
        debug!(%term, candidates = found.len(), track = %track.id, "random track picked");
        self.replace_queue(track).await
    }

    async fn replace_queue(&mut self, track: Track) -> Result<TrackInfo, PlaybackError> {
        self.transport
            .load(std::slice::from_ref(&track), RepeatMode::One)
            .await?;
        let info = track.info();
        self.queue = self.queue.replaced_with(vec![track]);
        self.track_info.invalidate();
        self.track_info.populate(info.clone());
        info!(
            title = %info.title,
            artist = %info.artist,
            generation = self.queue.generation(),
            "queue replaced"
        );
        Ok(info)
    }

    async fn ensure_authorized(&mut self) -> Result<(), PlaybackError> {
        if self.authorized {
            return Ok(());
        }
        if !self.catalog.authorize().await {
            warn!("media catalog authorization denied");
            return Err(PlaybackError::AuthorizationDenied);
        }
        self.authorized = true;
        Ok(())
    }

    async fn publish(&mut self) {
        self.status = self.transport.status().await;
        let snapshot = PlaybackSnapshot {
            status: self.status,
            track: self.track_info.get().cloned(),
            queue_len: self.queue.len(),
        };
        self.snapshots.send_replace(snapshot);
    }
}
