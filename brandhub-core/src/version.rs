use std::fmt;
use std::path::PathBuf;

use brandhub_model::{AssetId, ThumbnailSize};
use chrono::{DateTime, Utc};

/// Version tag derived from the remote file's last-modified timestamp.
///
/// The canonical form is the timestamp's epoch-millisecond value in
/// decimal. Equal timestamps always yield the same tag and any change to
/// the timestamp yields a different one, so the tag is the sole staleness
/// signal; byte content is never compared.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheVersion(String);

impl CacheVersion {
    pub fn from_modified_at(modified_at: DateTime<Utc>) -> Self {
        Self(modified_at.timestamp_millis().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Storage path for one cache entry, relative to the cache root.
///
/// The filename encodes asset id, size, and version, so stale-version
/// files are distinguishable from current ones without consulting
/// bookkeeping. Identical (asset, size, version) triples collide on
/// purpose; distinct triples never do.
pub fn storage_rel_path(
    asset_id: AssetId,
    size: ThumbnailSize,
    version: &CacheVersion,
) -> PathBuf {
    let mut name = String::with_capacity(40);
    name.push_str(&asset_id.to_string());
    name.push('_');
    name.push_str(size.as_str());
    name.push_str("_v");
    name.push_str(version.as_str());
    PathBuf::from(size.as_str()).join(name)
}
