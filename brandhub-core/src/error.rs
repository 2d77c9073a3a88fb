use brandhub_model::AssetId;
use thiserror::Error;

/// Errors produced by the thumbnail cache subsystem.
///
/// `NotFound` and `InvalidSize` are caller errors and never retried.
/// `Fetch` and `Storage` leave bookkeeping untouched, so a previously
/// valid entry keeps serving after a failed refresh.
///
/// The type is `Clone` so a coalesced in-flight fetch can hand its exact
/// outcome to every waiter; underlying io/transport causes are captured
/// as context strings at the point they occur.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ThumbnailCacheError {
    #[error("asset not found: {0}")]
    NotFound(AssetId),

    #[error("unsupported thumbnail size: {0}")]
    InvalidSize(String),

    #[error("thumbnail fetch failed: {0}")]
    Fetch(String),

    #[error("cache storage failed: {0}")]
    Storage(String),

    #[error("asset repository failed: {0}")]
    Repository(String),
}

pub type Result<T> = std::result::Result<T, ThumbnailCacheError>;
