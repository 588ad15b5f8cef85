//! Headless driver: scans a photo library, walks the detail carousel through a
//! scripted run of swipes and starts background music on a simulated player.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::Parser;
use photo_carousel::config::Configuration;
use photo_carousel::detail::carousel::Release;
use photo_carousel::detail::{DetailView, DragResult};
use photo_carousel::gallery::AssetStore;
use photo_carousel::geometry::{Insets, Size, Vec2};
use photo_carousel::library::FsAssetStore;
use photo_carousel::playback::{PlaybackSession, SimulatedTransport};
use photo_carousel::tasks::playback::PlaybackHandle;
use photo_carousel::tasks::prefetch::Slot;
use rand::SeedableRng;
use rand::rngs::StdRng;
use tokio::select;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const VIEWPORT: Size = Size::new(1280.0, 800.0);

#[derive(Debug, Parser)]
#[command(
    name = "photo-carousel",
    version,
    about = "photo detail carousel with background playback"
)]
struct Args {
    /// Path to YAML config
    #[arg(value_name = "CONFIG")]
    config: PathBuf,
    /// Use this photo library instead of the configured one
    #[arg(long, value_name = "DIR")]
    library: Option<PathBuf>,
    /// Number of forward swipes to perform through the gallery
    #[arg(long, value_name = "N", default_value_t = 3)]
    swipes: usize,
    /// Deterministic RNG seed for random track selection
    #[arg(long, value_name = "SEED")]
    seed: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // init tracing (RUST_LOG controls level, default = info)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .compact()
        .init();

    let Args {
        config,
        library,
        swipes,
        seed,
    } = Args::parse();

    let mut cfg = Configuration::from_yaml_file(&config)
        .with_context(|| format!("failed to load configuration from {}", config.display()))?
        .validated()
        .context("invalid configuration values")?;
    if let Some(library) = library {
        cfg.photo_library_path = library;
    }

    let cancel = CancellationToken::new();
    let rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    let session = PlaybackSession::new(
        Arc::new(cfg.local_catalog()),
        Arc::new(SimulatedTransport::new()),
        cfg.playback.clone(),
        rng,
    );
    let (playback, playback_task) = PlaybackHandle::spawn(session, cancel.clone());

    let outcome = select! {
        res = run_detail(&cfg, swipes, &playback) => res,
        _ = tokio::signal::ctrl_c() => {
            info!("interrupt received; shutting down");
            Ok(())
        }
    };

    cancel.cancel();
    playback_task
        .await
        .context("playback task panicked")??;
    outcome
}

async fn run_detail(cfg: &Configuration, swipes: usize, playback: &PlaybackHandle) -> Result<()> {
    let store = Arc::new(FsAssetStore::new(cfg.photo_library_path.clone()));
    if !store.request_access().await {
        bail!(
            "photo library {} is not accessible",
            cfg.photo_library_path.display()
        );
    }
    let photos = store.list_recent(cfg.recent_limit).await;
    if photos.is_empty() {
        warn!(root = %cfg.photo_library_path.display(), "no photos found");
        return Ok(());
    }

    let options = cfg.detail_options(VIEWPORT, Insets::default());
    let mut view = DetailView::new(photos.into(), 0, store.clone(), options)?;
    view.mount();

    // Music and images load side by side; a playback failure only costs the music.
    let (_, music) = tokio::join!(view.settle_images(), playback.resume());
    match music {
        Ok(outcome) => info!(?outcome, "background music"),
        Err(err) => warn!(error = %err, "background music unavailable"),
    }
    report_current(&view, store.as_ref()).await;

    let swipe = -(cfg.carousel.commit_distance + 1.0);
    for _ in 0..swipes {
        view.drag_began();
        view.drag_changed(Vec2::new(swipe, 0.0));
        match view.drag_ended(Vec2::new(swipe, 0.0), Vec2::new(swipe, 0.0)) {
            DragResult::Swipe(Release::Commit { .. }) => {
                view.transition_finished();
                view.settle_images().await;
                report_current(&view, store.as_ref()).await;
            }
            other => {
                info!(?other, index = view.index(), "end of gallery");
                break;
            }
        }
    }

    match playback.current_track_info().await? {
        Some(track) => info!(title = %track.title, artist = %track.artist, "now playing"),
        None => info!("nothing playing"),
    }
    let snapshot = playback.refresh().await?;
    info!(status = ?snapshot.status, queue = snapshot.queue_len, "playback state");

    view.dismiss();
    Ok(())
}

async fn report_current(view: &DetailView, store: &dyn AssetStore) {
    let photo = view.current_photo();
    let meta = photo.resolve_metadata(store).await;
    let slot = view.slot(Slot::Current);
    info!(
        index = view.index(),
        photo = %photo.id(),
        ready = slot.image().is_some(),
        captured_at = ?meta.captured_at,
        location = ?meta.location,
        "showing photo"
    );
}
