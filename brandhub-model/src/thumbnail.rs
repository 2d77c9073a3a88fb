use std::error::Error;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::asset::AssetId;

/// Closed set of thumbnail size variants served by the cache.
///
/// Each size has an independent cache entry per asset; sizes never share
/// storage or invalidate one another.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum ThumbnailSize {
    Small,
    Medium,
    Large,
}

impl ThumbnailSize {
    pub const ALL: [ThumbnailSize; 3] =
        [Self::Small, Self::Medium, Self::Large];

    /// URL-safe string form, also used in storage paths.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Small => "small",
            Self::Medium => "medium",
            Self::Large => "large",
        }
    }

    /// Approximate pixel width the serving layer requests for this size.
    pub const fn width_hint(self) -> u32 {
        match self {
            Self::Small => 96,
            Self::Medium => 320,
            Self::Large => 1024,
        }
    }
}

impl fmt::Display for ThumbnailSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing a size name outside the closed set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownThumbnailSize(pub String);

impl fmt::Display for UnknownThumbnailSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown thumbnail size: {}", self.0)
    }
}

impl Error for UnknownThumbnailSize {}

impl FromStr for ThumbnailSize {
    type Err = UnknownThumbnailSize;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "small" => Ok(Self::Small),
            "medium" => Ok(Self::Medium),
            "large" => Ok(Self::Large),
            other => Err(UnknownThumbnailSize(other.to_owned())),
        }
    }
}

/// Cache bookkeeping for one (asset, size) entry: where the bytes live,
/// which remote version they correspond to, and when they were cached.
///
/// This triple is the single source of truth for what is cached; the
/// on-disk bytes are a derived artifact and are never trusted without
/// cross-checking the version recorded here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThumbnailCacheState {
    pub path: PathBuf,
    pub version: String,
    pub cached_at: DateTime<Utc>,
}

/// Result of a fetch-and-cache operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedThumbnail {
    pub path: PathBuf,
    pub serving_url: String,
    /// `true` when the existing entry was already current and no remote
    /// fetch was performed.
    pub cached: bool,
}

/// One cached entry as listed by the repository, for reaping and stats.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedEntry {
    pub asset_id: AssetId,
    pub size: ThumbnailSize,
    pub state: ThumbnailCacheState,
}

/// Diagnostic totals for the cache as a whole.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThumbnailCacheStats {
    pub total_cached: u64,
    pub cache_size_bytes: u64,
}
