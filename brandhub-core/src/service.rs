use std::any::type_name_of_val;
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use brandhub_model::{
    AssetId, CachedThumbnail, ThumbnailCacheState, ThumbnailCacheStats,
    ThumbnailSize,
};
use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, watch};
use tracing::{debug, info, warn};
use url::Url;

use crate::config::ThumbnailCacheConfig;
use crate::error::{Result, ThumbnailCacheError};
use crate::file_store::ThumbnailFileStore;
use crate::ports::{AssetCacheRepository, DriveThumbnailSource};
use crate::version::{CacheVersion, storage_rel_path};

/// Inputs for one fetch-and-cache operation. The drive fields come from
/// the provider's file listing at request time, not from the asset
/// record, so the coordinator always validates against the remote's
/// current modification timestamp.
#[derive(Debug, Clone)]
pub struct ThumbnailFetchRequest {
    pub asset_id: AssetId,
    pub drive_file_id: String,
    pub modified_at: DateTime<Utc>,
    pub thumbnail_url: Option<String>,
    pub size: ThumbnailSize,
}

/// Parse a size name from an untrusted boundary (query string, chat
/// command) into the closed size set.
pub fn parse_thumbnail_size(value: &str) -> Result<ThumbnailSize> {
    value
        .parse()
        .map_err(|_| ThumbnailCacheError::InvalidSize(value.to_owned()))
}

type FlightKey = (AssetId, ThumbnailSize);
type FlightOutcome = Result<CachedThumbnail>;

/// Remote thumbnail cache service.
///
/// One value per process, holding its disk store and repository
/// collaborators explicitly; fetch coordination, invalidation, reaping
/// and stats all go through here so they share path resolution.
#[derive(Clone)]
pub struct ThumbnailCacheService {
    repo: Arc<dyn AssetCacheRepository>,
    store: ThumbnailFileStore,
    config: ThumbnailCacheConfig,
    // Single-flight table: per (asset, size) key, waiters subscribe to
    // the leader's outcome slot instead of fetching again.
    in_flight:
        Arc<Mutex<HashMap<FlightKey, watch::Receiver<Option<FlightOutcome>>>>>,
}

impl fmt::Debug for ThumbnailCacheService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ThumbnailCacheService")
            .field("repository", &type_name_of_val(self.repo.as_ref()))
            .field("cache_root", &self.store.root())
            .field("retention", &self.config.retention)
            .finish()
    }
}

impl ThumbnailCacheService {
    pub fn new(
        repo: Arc<dyn AssetCacheRepository>,
        config: ThumbnailCacheConfig,
    ) -> Self {
        let store = ThumbnailFileStore::new(config.cache_dir.clone());
        Self {
            repo,
            store,
            config,
            in_flight: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn store(&self) -> &ThumbnailFileStore {
        &self.store
    }

    pub fn config(&self) -> &ThumbnailCacheConfig {
        &self.config
    }

    /// Return a servable cached thumbnail for the asset, fetching from
    /// the drive provider only when the entry is missing or the remote
    /// version advanced.
    ///
    /// Concurrent calls for the same (asset, size) coalesce onto a single
    /// remote fetch and all receive its outcome. The fetch itself runs in
    /// a detached task, so an abandoned caller never cancels work other
    /// callers are waiting on.
    pub async fn fetch_and_cache_thumbnail(
        &self,
        drive: Arc<dyn DriveThumbnailSource>,
        request: ThumbnailFetchRequest,
    ) -> Result<CachedThumbnail> {
        let asset_id = request.asset_id;
        let size = request.size;

        self.repo
            .find_asset(asset_id)
            .await?
            .ok_or(ThumbnailCacheError::NotFound(asset_id))?;

        let tag = CacheVersion::from_modified_at(request.modified_at);

        if let Some(state) = self.repo.cache_state(asset_id, size).await? {
            if state.version == tag.as_str() {
                if tokio::fs::try_exists(&state.path).await.unwrap_or(false)
                {
                    debug!(%asset_id, %size, version = %tag, "thumbnail cache hit");
                    return Ok(CachedThumbnail {
                        path: state.path,
                        serving_url: self.serving_url(asset_id, size),
                        cached: true,
                    });
                }
                warn!(
                    %asset_id, %size,
                    path = ?state.path,
                    "bookkeeping points at missing thumbnail file, refetching"
                );
            } else {
                debug!(
                    %asset_id, %size,
                    cached_version = %state.version,
                    remote_version = %tag,
                    "remote version advanced, refetching"
                );
            }
        }

        let rx = {
            let mut flights = self.in_flight.lock().await;
            if let Some(rx) = flights.get(&(asset_id, size)) {
                debug!(%asset_id, %size, "joining in-flight thumbnail fetch");
                rx.clone()
            } else {
                let (tx, rx) = watch::channel(None);
                flights.insert((asset_id, size), rx.clone());
                debug!(%asset_id, %size, "leading thumbnail fetch");

                let service = self.clone();
                let drive = Arc::clone(&drive);
                // Detached: fetches are not caller-scoped work.
                tokio::spawn(async move {
                    let outcome =
                        service.populate(drive.as_ref(), &request, &tag).await;
                    {
                        let mut flights = service.in_flight.lock().await;
                        flights.remove(&(asset_id, size));
                    }
                    let _ = tx.send(Some(outcome));
                });
                rx
            }
        };

        await_flight(rx).await
    }

    /// Miss path: obtain bytes, publish to disk, then commit bookkeeping.
    /// Ordering matters: bookkeeping is only updated after the bytes are
    /// durably in place, and any failure leaves it untouched.
    async fn populate(
        &self,
        drive: &dyn DriveThumbnailSource,
        request: &ThumbnailFetchRequest,
        tag: &CacheVersion,
    ) -> Result<CachedThumbnail> {
        let asset_id = request.asset_id;
        let size = request.size;
        let prior = self.repo.cache_state(asset_id, size).await?;

        let url = match &request.thumbnail_url {
            Some(hint) => hint.clone(),
            None => {
                self.bounded(
                    drive.resolve_thumbnail_link(&request.drive_file_id),
                    "thumbnail link resolution",
                )
                .await?
            }
        };
        Url::parse(&url).map_err(|err| {
            ThumbnailCacheError::Fetch(format!(
                "invalid thumbnail url {url:?}: {err}"
            ))
        })?;

        let bytes = self
            .bounded(drive.fetch_thumbnail(&url), "thumbnail download")
            .await?;
        if bytes.is_empty() {
            return Err(ThumbnailCacheError::Fetch(format!(
                "empty thumbnail response from {url}"
            )));
        }

        let rel = storage_rel_path(asset_id, size, tag);
        let path = self.store.write_atomic(&rel, &bytes).await?;

        self.repo
            .mark_cached(
                asset_id,
                size,
                ThumbnailCacheState {
                    path: path.clone(),
                    version: tag.as_str().to_owned(),
                    cached_at: Utc::now(),
                },
            )
            .await?;
        info!(
            %asset_id, %size,
            version = %tag,
            bytes = bytes.len(),
            "thumbnail cached"
        );

        // The new version is committed; the superseded file is garbage
        // the reaper will never see (it only consults bookkeeping).
        if let Some(prior) = prior
            && prior.path != path
            && let Err(err) = self.store.remove(&prior.path).await
        {
            debug!(
                %asset_id, %size, %err,
                "failed to remove superseded thumbnail file"
            );
        }

        Ok(CachedThumbnail {
            path,
            serving_url: self.serving_url(asset_id, size),
            cached: false,
        })
    }

    async fn bounded<T>(
        &self,
        fut: impl Future<Output = Result<T>>,
        what: &str,
    ) -> Result<T> {
        match tokio::time::timeout(self.config.fetch_timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(ThumbnailCacheError::Fetch(format!(
                "{what} timed out after {:?}",
                self.config.fetch_timeout
            ))),
        }
    }

    /// Most recently cached path for the asset, if its file still exists.
    /// Does not re-validate against the remote timestamp; callers needing
    /// freshness go through [`Self::fetch_and_cache_thumbnail`].
    pub async fn cached_thumbnail_path(
        &self,
        asset_id: AssetId,
    ) -> Result<Option<PathBuf>> {
        let mut states = self.repo.cache_states(asset_id).await?;
        states.sort_by_key(|(_, state)| state.cached_at);
        for (size, state) in states.into_iter().rev() {
            if tokio::fs::try_exists(&state.path).await.unwrap_or(false) {
                return Ok(Some(state.path));
            }
            debug!(
                %asset_id, %size,
                path = ?state.path,
                "bookkeeping points at missing thumbnail file"
            );
        }
        Ok(None)
    }

    /// Drop every cached size for the asset: files first, then
    /// bookkeeping. Idempotent; an asset with no entries is a no-op.
    pub async fn invalidate_thumbnail_cache(
        &self,
        asset_id: AssetId,
    ) -> Result<()> {
        let states = self.repo.cache_states(asset_id).await?;
        for (size, state) in &states {
            if let Err(err) = self.store.remove(&state.path).await {
                warn!(
                    %asset_id, %size, %err,
                    "failed to delete thumbnail during invalidation"
                );
            }
        }
        self.repo.clear_cached(asset_id).await?;
        if !states.is_empty() {
            info!(
                %asset_id,
                entries = states.len(),
                "thumbnail cache invalidated"
            );
        }
        Ok(())
    }

    /// Remove every entry older than the retention window and report how
    /// many were reclaimed. Versioned paths make this safe alongside
    /// in-flight fetches: reaping a stale entry never touches the file a
    /// concurrent refresh is publishing.
    pub async fn clear_expired_thumbnails(&self) -> Result<u64> {
        let mut reclaimed = 0u64;
        for entry in self.repo.list_cached().await? {
            let age = Utc::now().signed_duration_since(entry.state.cached_at);
            let expired = age
                .to_std()
                .map(|age| age > self.config.retention)
                .unwrap_or(false);
            if !expired {
                continue;
            }
            if let Err(err) = self.store.remove(&entry.state.path).await {
                warn!(
                    asset_id = %entry.asset_id,
                    size = %entry.size,
                    %err,
                    "failed to delete expired thumbnail"
                );
            }
            self.repo
                .clear_cached_size(entry.asset_id, entry.size)
                .await?;
            reclaimed += 1;
        }
        if reclaimed > 0 {
            info!(reclaimed, "expired thumbnails reclaimed");
        }
        Ok(reclaimed)
    }

    /// Entry count from bookkeeping plus byte total from a cache-dir
    /// walk. Diagnostic only; approximate under concurrent mutation.
    pub async fn thumbnail_cache_stats(&self) -> Result<ThumbnailCacheStats> {
        let total_cached = self.repo.count_cached().await?;
        let usage = self.store.usage().await?;
        Ok(ThumbnailCacheStats {
            total_cached,
            cache_size_bytes: usage.total_bytes,
        })
    }

    fn serving_url(&self, asset_id: AssetId, size: ThumbnailSize) -> String {
        format!(
            "{}/{asset_id}/thumbnail?size={size}",
            self.config.serving_prefix.trim_end_matches('/')
        )
    }
}

/// Wait for the leader's outcome. The watch slot is written exactly once;
/// a dropped sender without a value means the fetch task was torn down
/// (shutdown) and no bookkeeping was committed.
async fn await_flight(
    mut rx: watch::Receiver<Option<FlightOutcome>>,
) -> Result<CachedThumbnail> {
    loop {
        if let Some(outcome) = rx.borrow_and_update().clone() {
            return outcome;
        }
        if rx.changed().await.is_err() {
            return Err(ThumbnailCacheError::Fetch(
                "thumbnail fetch aborted before completion".to_owned(),
            ));
        }
    }
}
