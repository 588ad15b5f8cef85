use thiserror::Error;

use crate::playback::TrackId;

/// Failure reported by the external media transport.
#[derive(Debug, Clone, Error)]
#[error("media service error: {0}")]
pub struct ServiceError(pub String);

/// Catalog lookup/search failures.
#[derive(Debug, Clone, Error)]
pub enum CatalogError {
    /// The catalog has no track with this identifier.
    #[error("track {0} not found in catalog")]
    NotFound(TrackId),

    /// The catalog request itself failed.
    #[error("catalog request failed: {0}")]
    Service(String),
}

/// Errors surfaced by the playback session to its caller.
///
/// Image fetch failures never appear here; they become unavailable slots.
#[derive(Debug, Clone, Error)]
pub enum PlaybackError {
    /// A random-track search came back empty.
    #[error("no tracks found")]
    NoResults,

    /// The random-track search could not be completed.
    #[error("track search failed")]
    SearchFailed(#[source] CatalogError),

    /// The user refused access to the media catalog.
    #[error("media catalog authorization denied")]
    AuthorizationDenied,

    /// A specific track could not be resolved.
    #[error("track {0} not found")]
    NotFound(TrackId),

    /// Transport or catalog failure outside the cases above.
    #[error(transparent)]
    Service(#[from] ServiceError),

    /// The session actor is gone.
    #[error("playback session closed")]
    SessionClosed,
}

impl From<CatalogError> for PlaybackError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::NotFound(id) => Self::NotFound(id),
            CatalogError::Service(msg) => Self::Service(ServiceError(msg)),
        }
    }
}
