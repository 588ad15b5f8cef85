//! Filesystem-backed [`AssetStore`]: a directory tree of image files.
//!
//! Photo ids are file paths. Decoding and metadata reads happen on the blocking
//! pool so the async side never stalls on disk or codec work.

use std::ffi::OsStr;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use image::RgbaImage;
use image::imageops::{self, FilterType};
use tracing::{debug, info, instrument, warn};
use walkdir::{DirEntry, WalkDir};

use crate::gallery::{
    AssetStore, DecodedImage, GeoPoint, PhotoId, PhotoMetadata, PhotoRef, TargetSize,
};

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp"];

#[derive(Debug, Clone)]
pub struct FsAssetStore {
    root: PathBuf,
}

impl FsAssetStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait]
impl AssetStore for FsAssetStore {
    async fn request_access(&self) -> bool {
        match tokio::fs::metadata(&self.root).await {
            Ok(meta) if meta.is_dir() => true,
            Ok(_) => {
                warn!(root = %self.root.display(), "photo library is not a directory");
                false
            }
            Err(err) => {
                warn!(root = %self.root.display(), error = %err, "photo library unreadable");
                false
            }
        }
    }

    #[instrument(skip(self), fields(root = %self.root.display()))]
    async fn list_recent(&self, limit: usize) -> Vec<PhotoRef> {
        let root = self.root.clone();
        match tokio::task::spawn_blocking(move || scan_recent(&root, limit)).await {
            Ok(photos) => {
                info!(count = photos.len(), "library scan complete");
                photos
            }
            Err(err) => {
                warn!(error = %err, "library scan task failed");
                Vec::new()
            }
        }
    }

    async fn decode(&self, photo: &PhotoRef, target: TargetSize) -> Option<DecodedImage> {
        let path = PathBuf::from(photo.id().as_str());
        let res = tokio::task::spawn_blocking(move || {
            let img = decode_rgba8_oriented(&path)?;
            Ok::<_, anyhow::Error>(fit_to(img, target))
        })
        .await;
        match res {
            Ok(Ok(img)) => {
                let (width, height) = img.dimensions();
                debug!(photo = %photo.id(), width, height, "decoded");
                Some(DecodedImage {
                    width,
                    height,
                    pixels: img.into_raw(),
                })
            }
            Ok(Err(err)) => {
                warn!(photo = %photo.id(), error = %err, "decode failed");
                None
            }
            Err(err) => {
                warn!(photo = %photo.id(), error = %err, "decode task failed");
                None
            }
        }
    }

    async fn metadata(&self, photo: &PhotoRef) -> PhotoMetadata {
        let path = PathBuf::from(photo.id().as_str());
        let created_at = photo.created_at();
        tokio::task::spawn_blocking(move || read_metadata(&path, created_at))
            .await
            .unwrap_or_default()
    }
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.depth() > 0 && entry.file_name().to_str().is_some_and(|s| s.starts_with('.'))
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(OsStr::to_str)
        .is_some_and(|ext| IMAGE_EXTENSIONS.iter().any(|e| ext.eq_ignore_ascii_case(e)))
}

/// Newest first by modification time; ties broken by path.
fn scan_recent(root: &Path, limit: usize) -> Vec<PhotoRef> {
    let mut found: Vec<(PathBuf, Option<SystemTime>)> = WalkDir::new(root)
        .follow_links(true)
        .into_iter()
        .filter_entry(|e| !is_hidden(e))
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file() && is_image(e.path()))
        .map(|e| {
            let modified = e.metadata().ok().and_then(|m| m.modified().ok());
            (e.into_path(), modified)
        })
        .collect();
    found.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    found
        .into_iter()
        .take(limit)
        .map(|(path, modified)| {
            PhotoRef::new(PhotoId::new(path.to_string_lossy().as_ref()), modified)
        })
        .collect()
}

fn decode_rgba8_oriented(path: &Path) -> anyhow::Result<RgbaImage> {
    let img = image::ImageReader::open(path)?
        .with_guessed_format()?
        .decode()?
        .to_rgba8();
    let exif = read_exif(path);
    let orientation = exif
        .as_ref()
        .and_then(|e| e.get_field(exif::Tag::Orientation, exif::In::PRIMARY))
        .and_then(|f| f.value.get_uint(0))
        .unwrap_or(1);
    Ok(apply_orientation(img, orientation))
}

fn apply_orientation(img: RgbaImage, orientation: u32) -> RgbaImage {
    match orientation {
        2 => imageops::flip_horizontal(&img),
        3 => imageops::rotate180(&img),
        4 => imageops::flip_vertical(&img),
        5 => imageops::flip_horizontal(&imageops::rotate90(&img)),
        6 => imageops::rotate90(&img),
        7 => imageops::flip_horizontal(&imageops::rotate270(&img)),
        8 => imageops::rotate270(&img),
        _ => img,
    }
}

fn fit_to(img: RgbaImage, target: TargetSize) -> RgbaImage {
    let TargetSize::Fit { max_dimension } = target else {
        return img;
    };
    let (w, h) = img.dimensions();
    let longest = w.max(h);
    if longest <= max_dimension || max_dimension == 0 {
        return img;
    }
    let scale = f64::from(max_dimension) / f64::from(longest);
    let nw = ((f64::from(w) * scale).round() as u32).max(1);
    let nh = ((f64::from(h) * scale).round() as u32).max(1);
    imageops::resize(&img, nw, nh, FilterType::Triangle)
}

fn read_exif(path: &Path) -> Option<exif::Exif> {
    let file = File::open(path).ok()?;
    let mut buf = BufReader::new(file);
    exif::Reader::new().read_from_container(&mut buf).ok()
}

fn read_metadata(path: &Path, listed_at: Option<SystemTime>) -> PhotoMetadata {
    let exif = read_exif(path);
    let captured_at = exif
        .as_ref()
        .and_then(exif_timestamp)
        .or_else(|| listed_at.map(DateTime::<Utc>::from));
    let location = exif.as_ref().and_then(exif_location);
    let pixel_size = image::image_dimensions(path).ok();
    PhotoMetadata {
        captured_at,
        location,
        is_favorite: false,
        pixel_size,
    }
}

fn exif_timestamp(exif: &exif::Exif) -> Option<DateTime<Utc>> {
    let field = exif
        .get_field(exif::Tag::DateTimeOriginal, exif::In::PRIMARY)
        .or_else(|| exif.get_field(exif::Tag::DateTime, exif::In::PRIMARY))?;
    let exif::Value::Ascii(ref parts) = field.value else {
        return None;
    };
    let dt = exif::DateTime::from_ascii(parts.first()?).ok()?;
    NaiveDate::from_ymd_opt(i32::from(dt.year), u32::from(dt.month), u32::from(dt.day))?
        .and_hms_opt(u32::from(dt.hour), u32::from(dt.minute), u32::from(dt.second))
        .map(|naive| naive.and_utc())
}

fn exif_location(exif: &exif::Exif) -> Option<GeoPoint> {
    let latitude = gps_degrees(exif, exif::Tag::GPSLatitude, exif::Tag::GPSLatitudeRef, b'S')?;
    let longitude = gps_degrees(exif, exif::Tag::GPSLongitude, exif::Tag::GPSLongitudeRef, b'W')?;
    Some(GeoPoint {
        latitude,
        longitude,
    })
}

/// Degrees/minutes/seconds rationals to signed decimal degrees.
fn gps_degrees(exif: &exif::Exif, tag: exif::Tag, ref_tag: exif::Tag, negative: u8) -> Option<f64> {
    let field = exif.get_field(tag, exif::In::PRIMARY)?;
    let exif::Value::Rational(ref dms) = field.value else {
        return None;
    };
    let mut degrees = 0.0;
    for (part, div) in dms.iter().zip([1.0, 60.0, 3600.0]) {
        degrees += part.to_f64() / div;
    }
    let sign = match exif.get_field(ref_tag, exif::In::PRIMARY).map(|f| &f.value) {
        Some(exif::Value::Ascii(parts))
            if parts
                .first()
                .and_then(|p| p.first())
                .is_some_and(|c| c.eq_ignore_ascii_case(&negative)) =>
        {
            -1.0
        }
        _ => 1.0,
    };
    Some(sign * degrees)
}
