//! Actor that owns the [`PlaybackSession`] and runs its operations one at a time.
//!
//! Callers hold a cloneable [`PlaybackHandle`]; each request carries a oneshot
//! for the reply, so overlapping callers queue up instead of interleaving
//! mutations against the media service.

use anyhow::Result;
use tokio::select;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::error::PlaybackError;
use crate::events::PlaybackSnapshot;
use crate::playback::{PlaybackSession, ResumeOutcome, TrackId, TrackInfo};

type Reply<T> = oneshot::Sender<Result<T, PlaybackError>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportCommand {
    Play,
    Pause,
    Stop,
    Next,
    Previous,
    Advance,
    Retreat,
}

#[derive(Debug)]
pub enum PlaybackRequest {
    SetTrack(TrackId, Reply<TrackInfo>),
    SetRandomTrack(Reply<TrackInfo>),
    Resume(Reply<ResumeOutcome>),
    CurrentTrackInfo(oneshot::Sender<Option<TrackInfo>>),
    Transport(TransportCommand, Reply<()>),
    Refresh(oneshot::Sender<PlaybackSnapshot>),
}

const REQUEST_CAPACITY: usize = 16;

/// Serve requests until `cancel` fires or every handle is dropped.
pub async fn run(
    mut session: PlaybackSession,
    mut rx: mpsc::Receiver<PlaybackRequest>,
    cancel: CancellationToken,
) -> Result<()> {
    loop {
        select! {
            _ = cancel.cancelled() => break,
            req = rx.recv() => {
                let Some(req) = req else { break };
                handle(&mut session, req).await;
            }
        }
    }
    info!("playback session stopped");
    Ok(())
}

async fn handle(session: &mut PlaybackSession, req: PlaybackRequest) {
    // A caller that gave up waiting is not an error for the session.
    match req {
        PlaybackRequest::SetTrack(id, reply) => {
            let _ = reply.send(session.set_track(&id).await);
        }
        PlaybackRequest::SetRandomTrack(reply) => {
            let _ = reply.send(session.set_random_track().await);
        }
        PlaybackRequest::Resume(reply) => {
            let _ = reply.send(session.resume().await);
        }
        PlaybackRequest::CurrentTrackInfo(reply) => {
            let _ = reply.send(session.current_track_info().await);
        }
        PlaybackRequest::Transport(command, reply) => {
            debug!(?command, "transport command");
            let res = match command {
                TransportCommand::Play => session.play().await,
                TransportCommand::Pause => session.pause().await,
                TransportCommand::Stop => session.stop().await,
                TransportCommand::Next => session.next().await,
                TransportCommand::Previous => session.previous().await,
                TransportCommand::Advance => session.advance().await,
                TransportCommand::Retreat => session.retreat().await,
            };
            let _ = reply.send(res);
        }
        PlaybackRequest::Refresh(reply) => {
            let _ = reply.send(session.refresh().await);
        }
    }
}

/// Cloneable front door to the playback actor.
#[derive(Debug, Clone)]
pub struct PlaybackHandle {
    tx: mpsc::Sender<PlaybackRequest>,
    snapshots: watch::Receiver<PlaybackSnapshot>,
}

impl PlaybackHandle {
    /// Move `session` onto its own task.
    pub fn spawn(
        session: PlaybackSession,
        cancel: CancellationToken,
    ) -> (Self, JoinHandle<Result<()>>) {
        let (tx, rx) = mpsc::channel(REQUEST_CAPACITY);
        let snapshots = session.subscribe();
        let task = tokio::spawn(run(session, rx, cancel));
        (Self { tx, snapshots }, task)
    }

    async fn call<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<T>) -> PlaybackRequest,
    ) -> Result<T, PlaybackError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(make(reply))
            .await
            .map_err(|_| PlaybackError::SessionClosed)?;
        rx.await.map_err(|_| PlaybackError::SessionClosed)
    }

    pub async fn set_track(&self, id: TrackId) -> Result<TrackInfo, PlaybackError> {
        self.call(|reply| PlaybackRequest::SetTrack(id, reply))
            .await?
    }

    pub async fn set_random_track(&self) -> Result<TrackInfo, PlaybackError> {
        self.call(PlaybackRequest::SetRandomTrack).await?
    }

    pub async fn resume(&self) -> Result<ResumeOutcome, PlaybackError> {
        self.call(PlaybackRequest::Resume).await?
    }

    pub async fn current_track_info(&self) -> Result<Option<TrackInfo>, PlaybackError> {
        self.call(PlaybackRequest::CurrentTrackInfo).await
    }

    pub async fn transport(&self, command: TransportCommand) -> Result<(), PlaybackError> {
        self.call(|reply| PlaybackRequest::Transport(command, reply))
            .await?
    }

    pub async fn play(&self) -> Result<(), PlaybackError> {
        self.transport(TransportCommand::Play).await
    }

    pub async fn pause(&self) -> Result<(), PlaybackError> {
        self.transport(TransportCommand::Pause).await
    }

    pub async fn stop(&self) -> Result<(), PlaybackError> {
        self.transport(TransportCommand::Stop).await
    }

    pub async fn next(&self) -> Result<(), PlaybackError> {
        self.transport(TransportCommand::Next).await
    }

    pub async fn previous(&self) -> Result<(), PlaybackError> {
        self.transport(TransportCommand::Previous).await
    }

    pub async fn advance(&self) -> Result<(), PlaybackError> {
        self.transport(TransportCommand::Advance).await
    }

    pub async fn retreat(&self) -> Result<(), PlaybackError> {
        self.transport(TransportCommand::Retreat).await
    }

    pub async fn refresh(&self) -> Result<PlaybackSnapshot, PlaybackError> {
        self.call(PlaybackRequest::Refresh).await
    }

    pub fn subscribe(&self) -> watch::Receiver<PlaybackSnapshot> {
        self.snapshots.clone()
    }

    /// Latest published snapshot without waiting on the actor.
    #[must_use]
    pub fn snapshot(&self) -> PlaybackSnapshot {
        self.snapshots.borrow().clone()
    }
}
