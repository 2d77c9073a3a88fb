use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier of an asset record in the application database.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
)]
#[serde(transparent)]
pub struct AssetId(pub i64);

impl AssetId {
    pub const fn as_i64(self) -> i64 {
        self.0
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for AssetId {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

/// An application asset referencing a file hosted on the remote drive
/// provider.
///
/// These fields are owned by the wider application; the thumbnail cache
/// only reads them. Cache bookkeeping lives in
/// [`ThumbnailCacheState`](crate::thumbnail::ThumbnailCacheState) and is
/// written exclusively by the cache subsystem.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetRecord {
    pub id: AssetId,
    pub name: String,
    /// Identifier of the backing file on the remote drive provider.
    pub drive_file_id: Option<String>,
    /// The remote file's last-modified timestamp as reported by the
    /// provider. Drives cache staleness detection.
    pub drive_last_modified: Option<DateTime<Utc>>,
    /// Pre-resolved thumbnail URL hint from the provider's file listing,
    /// when one was returned.
    pub drive_thumbnail_url: Option<String>,
}
