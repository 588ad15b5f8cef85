use photo_carousel::config::PlaybackConfig;
use photo_carousel::error::PlaybackError;
use photo_carousel::playback::{
    LocalCatalog, PlaybackSession, PlaybackStatus, ResumeOutcome, SimulatedTransport, Track,
    TrackId,
};
use photo_carousel::tasks::playback::{PlaybackHandle, TransportCommand};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

fn library() -> Vec<Track> {
    ["jazz", "jazz", "rock"]
        .iter()
        .enumerate()
        .map(|(i, tag)| Track {
            id: TrackId::new(format!("t{i}")),
            title: format!("Song {i}"),
            artist: format!("Band {i}"),
            tags: vec![(*tag).to_owned()],
        })
        .collect()
}

struct Fixture {
    handle: PlaybackHandle,
    transport: Arc<SimulatedTransport>,
    cancel: CancellationToken,
    task: tokio::task::JoinHandle<anyhow::Result<()>>,
}

fn start(catalog: LocalCatalog, topics: &[&str]) -> Fixture {
    let transport = Arc::new(SimulatedTransport::new());
    let config = PlaybackConfig {
        topics: topics.iter().map(|t| (*t).to_owned()).collect(),
        ..PlaybackConfig::default()
    };
    let session = PlaybackSession::new(
        Arc::new(catalog),
        transport.clone(),
        config,
        StdRng::seed_from_u64(42),
    );
    let cancel = CancellationToken::new();
    let (handle, task) = PlaybackHandle::spawn(session, cancel.clone());
    Fixture {
        handle,
        transport,
        cancel,
        task,
    }
}

impl Fixture {
    async fn shutdown(self) {
        self.cancel.cancel();
        tokio::time::timeout(Duration::from_secs(2), self.task)
            .await
            .expect("actor stops")
            .expect("actor task")
            .expect("actor result");
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn resume_while_playing_is_a_noop() {
    let fx = start(LocalCatalog::new(library()), &["jazz"]);
    fx.handle.set_random_track().await.expect("random track");
    fx.handle.play().await.expect("play");
    assert_eq!(fx.transport.calls().play, 1);

    for _ in 0..2 {
        let outcome = fx.handle.resume().await.expect("resume");
        assert_eq!(outcome, ResumeOutcome::AlreadyPlaying);
    }
    let calls = fx.transport.calls();
    assert_eq!(calls.play, 1);
    assert_eq!(calls.load, 1, "queue left alone");
    fx.shutdown().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn paused_resume_continues_without_replacing_queue() {
    let fx = start(LocalCatalog::new(library()), &["jazz"]);
    let info = fx
        .handle
        .set_track(TrackId::new("t2"))
        .await
        .expect("known track");
    assert_eq!(fx.handle.snapshot().status, PlaybackStatus::Paused);

    let outcome = fx.handle.resume().await.expect("resume");
    assert_eq!(outcome, ResumeOutcome::Resumed);
    let calls = fx.transport.calls();
    assert_eq!(calls.play, 1);
    assert_eq!(calls.load, 1);
    assert_eq!(
        fx.handle.current_track_info().await.expect("session alive"),
        Some(info)
    );
    fx.shutdown().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn empty_search_keeps_existing_queue() {
    let fx = start(LocalCatalog::new(library()), &["polka"]);
    let info = fx
        .handle
        .set_track(TrackId::new("t0"))
        .await
        .expect("known track");

    let err = fx.handle.set_random_track().await.unwrap_err();
    assert!(matches!(err, PlaybackError::NoResults));
    assert_eq!(fx.transport.calls().load, 1);
    let snapshot = fx.handle.refresh().await.expect("refresh");
    assert_eq!(snapshot.queue_len, 1);
    assert_eq!(snapshot.track, Some(info));
    fx.shutdown().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn denied_authorization_is_reported() {
    let fx = start(
        LocalCatalog::new(library()).with_authorization(false),
        &["jazz"],
    );
    let err = fx.handle.resume().await.unwrap_err();
    assert!(matches!(err, PlaybackError::AuthorizationDenied));
    assert_eq!(fx.transport.calls(), Default::default());
    fx.shutdown().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn transport_failure_surfaces_as_service_error() {
    let fx = start(LocalCatalog::new(library()), &["jazz"]);
    fx.transport.fail_next("media server offline");
    let err = fx.handle.resume().await.unwrap_err();
    assert!(matches!(err, PlaybackError::Service(_)));
    assert_eq!(fx.handle.snapshot().queue_len, 0);

    let outcome = fx.handle.resume().await.expect("second attempt");
    assert!(matches!(outcome, ResumeOutcome::StartedRandom(_)));
    fx.shutdown().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn refused_play_snapshot_matches_session() {
    let fx = start(LocalCatalog::new(library()), &["rock"]);
    let mut rx = fx.handle.subscribe();
    fx.transport.refuse_play(Some("no output device"));

    let err = fx.handle.resume().await.unwrap_err();
    assert!(matches!(err, PlaybackError::Service(_)));
    tokio::time::timeout(Duration::from_secs(1), rx.changed())
        .await
        .expect("snapshot published on failure")
        .expect("sender alive");
    {
        let snap = rx.borrow_and_update();
        assert_eq!(snap.queue_len, 1);
        assert_eq!(snap.status, PlaybackStatus::Paused);
        assert_eq!(snap.track.as_ref().map(|t| t.title.as_str()), Some("Song 2"));
    }
    assert_eq!(fx.transport.calls().load, 1);

    fx.transport.refuse_play(None);
    let outcome = fx.handle.resume().await.expect("retry");
    assert_eq!(outcome, ResumeOutcome::Resumed);
    assert_eq!(fx.transport.calls().load, 1, "queue kept across the refusal");
    assert_eq!(fx.handle.snapshot().status, PlaybackStatus::Playing);
    fx.shutdown().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn concurrent_resumes_start_playback_once() {
    let fx = start(LocalCatalog::new(library()), &["jazz", "rock"]);
    let mut callers = Vec::new();
    for _ in 0..8 {
        let handle = fx.handle.clone();
        callers.push(tokio::spawn(async move { handle.resume().await }));
    }
    let mut started = 0;
    for caller in callers {
        match caller.await.expect("caller task").expect("resume") {
            ResumeOutcome::StartedRandom(_) => started += 1,
            ResumeOutcome::AlreadyPlaying => {}
            ResumeOutcome::Resumed => panic!("nothing was paused"),
        }
    }
    assert_eq!(started, 1);
    assert_eq!(fx.transport.calls().play, 1);
    fx.shutdown().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn snapshots_follow_transport_commands() {
    let fx = start(LocalCatalog::new(library()), &["rock"]);
    let mut rx = fx.handle.subscribe();

    fx.handle.resume().await.expect("resume");
    tokio::time::timeout(Duration::from_secs(1), rx.changed())
        .await
        .expect("snapshot published")
        .expect("sender alive");
    {
        let snap = rx.borrow_and_update();
        assert_eq!(snap.status, PlaybackStatus::Playing);
        assert_eq!(snap.track.as_ref().map(|t| t.title.as_str()), Some("Song 2"));
    }

    fx.handle.pause().await.expect("pause");
    fx.handle.pause().await.expect("second pause is a no-op");
    assert_eq!(fx.transport.calls().pause, 1);
    assert_eq!(fx.handle.snapshot().status, PlaybackStatus::Paused);

    fx.handle
        .transport(TransportCommand::Advance)
        .await
        .expect("seek forward");
    fx.handle.retreat().await.expect("seek backward");
    fx.handle.next().await.expect("skip");
    fx.handle.stop().await.expect("stop");
    let calls = fx.transport.calls();
    assert_eq!(calls.seek_forward, 1);
    assert_eq!(calls.seek_backward, 1);
    assert_eq!(calls.skip_next, 1);
    assert_eq!(fx.handle.snapshot().status, PlaybackStatus::Stopped);
    fx.shutdown().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn handle_reports_closed_session() {
    let fx = start(LocalCatalog::new(library()), &["jazz"]);
    let handle = fx.handle.clone();
    fx.shutdown().await;
    let err = handle.play().await.unwrap_err();
    assert!(matches!(err, PlaybackError::SessionClosed));
}
