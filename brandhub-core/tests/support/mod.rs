//! Test doubles for the thumbnail cache's two collaborators.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Once};
use std::time::Duration;

use async_trait::async_trait;
use brandhub_core::{
    AssetCacheRepository, DriveThumbnailSource, Result, ThumbnailCacheConfig,
    ThumbnailCacheError, ThumbnailCacheService,
};
use brandhub_model::{
    AssetId, AssetRecord, CachedEntry, ThumbnailCacheState, ThumbnailSize,
};

static INIT_TRACING: Once = Once::new();

pub fn init_tracing() {
    INIT_TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::from_default_env(),
            )
            .with_test_writer()
            .try_init();
    });
}

/// Hash-map-backed stand-in for the application's relational store.
#[derive(Debug, Default)]
pub struct InMemoryAssetRepository {
    assets: Mutex<HashMap<AssetId, AssetRecord>>,
    cache: Mutex<HashMap<(AssetId, ThumbnailSize), ThumbnailCacheState>>,
}

impl InMemoryAssetRepository {
    pub fn with_asset(id: AssetId) -> Arc<Self> {
        let repo = Arc::new(Self::default());
        repo.insert_asset(id);
        repo
    }

    pub fn insert_asset(&self, id: AssetId) {
        self.assets.lock().unwrap().insert(
            id,
            AssetRecord {
                id,
                name: format!("asset-{id}"),
                drive_file_id: Some("test-drive-file-123".to_owned()),
                drive_last_modified: None,
                drive_thumbnail_url: None,
            },
        );
    }

    pub fn state(
        &self,
        id: AssetId,
        size: ThumbnailSize,
    ) -> Option<ThumbnailCacheState> {
        self.cache.lock().unwrap().get(&(id, size)).cloned()
    }

    pub fn entry_count(&self) -> usize {
        self.cache.lock().unwrap().len()
    }
}

#[async_trait]
impl AssetCacheRepository for InMemoryAssetRepository {
    async fn find_asset(&self, id: AssetId) -> Result<Option<AssetRecord>> {
        Ok(self.assets.lock().unwrap().get(&id).cloned())
    }

    async fn cache_state(
        &self,
        id: AssetId,
        size: ThumbnailSize,
    ) -> Result<Option<ThumbnailCacheState>> {
        Ok(self.state(id, size))
    }

    async fn cache_states(
        &self,
        id: AssetId,
    ) -> Result<Vec<(ThumbnailSize, ThumbnailCacheState)>> {
        Ok(self
            .cache
            .lock()
            .unwrap()
            .iter()
            .filter(|((asset, _), _)| *asset == id)
            .map(|((_, size), state)| (*size, state.clone()))
            .collect())
    }

    async fn mark_cached(
        &self,
        id: AssetId,
        size: ThumbnailSize,
        state: ThumbnailCacheState,
    ) -> Result<()> {
        self.cache.lock().unwrap().insert((id, size), state);
        Ok(())
    }

    async fn clear_cached_size(
        &self,
        id: AssetId,
        size: ThumbnailSize,
    ) -> Result<()> {
        self.cache.lock().unwrap().remove(&(id, size));
        Ok(())
    }

    async fn clear_cached(&self, id: AssetId) -> Result<()> {
        self.cache
            .lock()
            .unwrap()
            .retain(|(asset, _), _| *asset != id);
        Ok(())
    }

    async fn list_cached(&self) -> Result<Vec<CachedEntry>> {
        Ok(self
            .cache
            .lock()
            .unwrap()
            .iter()
            .map(|((asset_id, size), state)| CachedEntry {
                asset_id: *asset_id,
                size: *size,
                state: state.clone(),
            })
            .collect())
    }

    async fn count_cached(&self) -> Result<u64> {
        Ok(self.entry_count() as u64)
    }
}

/// Drive source double that counts calls, can stall to widen the
/// single-flight window, and can be flipped into an outage.
#[derive(Debug)]
pub struct StubDriveSource {
    bytes: Vec<u8>,
    resolved_url: String,
    delay: Option<Duration>,
    fail_fetch: AtomicBool,
    pub resolve_calls: AtomicUsize,
    pub fetch_calls: AtomicUsize,
}

impl StubDriveSource {
    pub fn new(bytes: &[u8]) -> Arc<Self> {
        Arc::new(Self::build(bytes, None))
    }

    pub fn slow(bytes: &[u8], delay: Duration) -> Arc<Self> {
        Arc::new(Self::build(bytes, Some(delay)))
    }

    fn build(bytes: &[u8], delay: Option<Duration>) -> Self {
        Self {
            bytes: bytes.to_vec(),
            resolved_url: "https://drive.example.com/thumbs/test-drive-file-123"
                .to_owned(),
            delay,
            fail_fetch: AtomicBool::new(false),
            resolve_calls: AtomicUsize::new(0),
            fetch_calls: AtomicUsize::new(0),
        }
    }

    pub fn set_failing(&self, failing: bool) {
        self.fail_fetch.store(failing, Ordering::SeqCst);
    }

    pub fn fetches(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }

    pub fn resolves(&self) -> usize {
        self.resolve_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DriveThumbnailSource for StubDriveSource {
    async fn resolve_thumbnail_link(
        &self,
        _drive_file_id: &str,
    ) -> Result<String> {
        self.resolve_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.resolved_url.clone())
    }

    async fn fetch_thumbnail(&self, _url: &str) -> Result<Vec<u8>> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_fetch.load(Ordering::SeqCst) {
            return Err(ThumbnailCacheError::Fetch(
                "stubbed drive outage".to_owned(),
            ));
        }
        Ok(self.bytes.clone())
    }
}

pub fn test_service(
    repo: Arc<InMemoryAssetRepository>,
    cache_dir: &std::path::Path,
) -> ThumbnailCacheService {
    init_tracing();
    ThumbnailCacheService::new(
        repo,
        ThumbnailCacheConfig::new(cache_dir.join("thumbnails")),
    )
}

pub fn test_service_with_timeout(
    repo: Arc<InMemoryAssetRepository>,
    cache_dir: &std::path::Path,
    fetch_timeout: Duration,
) -> ThumbnailCacheService {
    init_tracing();
    let mut config = ThumbnailCacheConfig::new(cache_dir.join("thumbnails"));
    config.fetch_timeout = fetch_timeout;
    ThumbnailCacheService::new(repo, config)
}
