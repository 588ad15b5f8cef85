pub mod config;
pub mod detail;
pub mod error;
pub mod events;
pub mod gallery;
pub mod geometry;
pub mod library;
pub mod playback;
pub mod tasks {
    pub mod playback;
    pub mod prefetch;
}

#[cfg(any(test, feature = "testkit"))]
pub mod testkit;
