use async_trait::async_trait;
use brandhub_model::{
    AssetId, AssetRecord, CachedEntry, ThumbnailCacheState, ThumbnailSize,
};

use crate::error::Result;

/// Repository port for asset lookup and thumbnail cache bookkeeping.
///
/// The bookkeeping triple (path, version, cached-at) is written
/// exclusively through this port by the cache subsystem; everything else
/// on the asset record is read-only here. Adapters map these calls onto
/// the application's relational store.
#[async_trait]
pub trait AssetCacheRepository: Send + Sync {
    async fn find_asset(&self, id: AssetId) -> Result<Option<AssetRecord>>;

    /// Bookkeeping for one (asset, size) entry, if any.
    async fn cache_state(
        &self,
        id: AssetId,
        size: ThumbnailSize,
    ) -> Result<Option<ThumbnailCacheState>>;

    /// Bookkeeping for every size cached for the asset.
    async fn cache_states(
        &self,
        id: AssetId,
    ) -> Result<Vec<(ThumbnailSize, ThumbnailCacheState)>>;

    /// Commit bookkeeping for one (asset, size) entry. Last writer wins.
    async fn mark_cached(
        &self,
        id: AssetId,
        size: ThumbnailSize,
        state: ThumbnailCacheState,
    ) -> Result<()>;

    /// Clear bookkeeping for one (asset, size) entry. No-op when absent.
    async fn clear_cached_size(
        &self,
        id: AssetId,
        size: ThumbnailSize,
    ) -> Result<()>;

    /// Clear bookkeeping for every size of the asset. No-op when absent.
    async fn clear_cached(&self, id: AssetId) -> Result<()>;

    /// Every cached entry, for the reaper.
    async fn list_cached(&self) -> Result<Vec<CachedEntry>>;

    /// Total number of cached entries, for stats.
    async fn count_cached(&self) -> Result<u64>;
}
