use photo_carousel::gallery::{AssetStore, TargetSize};
use photo_carousel::library::FsAssetStore;
use std::fs;
use std::path::Path;
use std::time::{Duration, SystemTime};

fn write_png(path: &Path, width: u32, height: u32, age: Duration) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    image::RgbaImage::from_pixel(width, height, image::Rgba([10, 20, 30, 255]))
        .save(path)
        .unwrap();
    let file = fs::File::options().write(true).open(path).unwrap();
    file.set_modified(SystemTime::now() - age).unwrap();
}

fn file_name(id: &str) -> String {
    Path::new(id)
        .file_name()
        .unwrap()
        .to_string_lossy()
        .into_owned()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn lists_newest_images_and_skips_hidden_dirs() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    write_png(&root.join("old.png"), 4, 4, Duration::from_secs(3_600));
    write_png(&root.join("nested/newest.png"), 4, 4, Duration::from_secs(10));
    write_png(&root.join("middle.PNG"), 4, 4, Duration::from_secs(600));
    write_png(&root.join(".thumbs/hidden.png"), 4, 4, Duration::from_secs(1));
    fs::write(root.join("notes.txt"), "not a photo").unwrap();

    let store = FsAssetStore::new(root);
    assert!(store.request_access().await);

    let all = store.list_recent(10).await;
    let names: Vec<_> = all.iter().map(|p| file_name(p.id().as_str())).collect();
    assert_eq!(names, ["newest.png", "middle.PNG", "old.png"]);
    assert!(all[0].created_at() > all[1].created_at());

    let limited = store.list_recent(2).await;
    assert_eq!(limited.len(), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn decode_fits_and_failures_are_empty() {
    let dir = tempfile::tempdir().unwrap();
    write_png(&dir.path().join("wide.png"), 64, 32, Duration::from_secs(5));
    fs::write(dir.path().join("broken.png"), b"definitely not png").unwrap();
    let store = FsAssetStore::new(dir.path());
    let photos = store.list_recent(10).await;
    let wide = photos
        .iter()
        .find(|p| p.id().as_str().ends_with("wide.png"))
        .expect("wide listed");
    let broken = photos
        .iter()
        .find(|p| p.id().as_str().ends_with("broken.png"))
        .expect("broken listed");

    let full = store.decode(wide, TargetSize::Full).await.expect("decodes");
    assert_eq!((full.width, full.height), (64, 32));
    assert_eq!(full.pixels.len(), 64 * 32 * 4);

    let fitted = store
        .decode(wide, TargetSize::Fit { max_dimension: 16 })
        .await
        .expect("decodes");
    assert_eq!((fitted.width, fitted.height), (16, 8));

    assert!(store.decode(broken, TargetSize::Full).await.is_none());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn metadata_resolves_once_with_mtime_fallback() {
    let dir = tempfile::tempdir().unwrap();
    write_png(&dir.path().join("a.png"), 8, 6, Duration::from_secs(120));
    let store = FsAssetStore::new(dir.path());
    let photos = store.list_recent(1).await;
    let photo = &photos[0];
    assert!(photo.metadata().is_none());

    let meta = photo.resolve_metadata(&store).await;
    assert_eq!(meta.pixel_size, Some((8, 6)));
    assert!(meta.location.is_none());
    assert!(!meta.is_favorite);
    let captured = meta.captured_at.expect("falls back to mtime");
    let age = chrono::Utc::now() - captured;
    assert!(age.num_seconds() >= 100 && age.num_seconds() < 600);
    assert!(photo.metadata().is_some());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn missing_library_is_refused() {
    let dir = tempfile::tempdir().unwrap();
    let store = FsAssetStore::new(dir.path().join("nope"));
    assert!(!store.request_access().await);
    assert!(store.list_recent(5).await.is_empty());
}
