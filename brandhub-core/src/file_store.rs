use std::path::{Component, Path, PathBuf};

use futures::future::BoxFuture;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use crate::error::{Result, ThumbnailCacheError};

/// Aggregate disk usage of the cache root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheUsage {
    pub file_count: u64,
    pub total_bytes: u64,
}

/// File-backed thumbnail artifacts under a dedicated cache root.
///
/// Writes are tmp + rename so concurrent readers never observe a
/// partially written file. The bytes here are a derived artifact; the
/// asset repository's bookkeeping is the source of truth for what is
/// cached.
#[derive(Clone, Debug)]
pub struct ThumbnailFileStore {
    root: PathBuf,
}

impl ThumbnailFileStore {
    /// The root is made absolute so stored bookkeeping paths stay stable
    /// regardless of the process working directory.
    pub fn new(root: PathBuf) -> Self {
        let root = if root.is_absolute() {
            root
        } else {
            std::env::current_dir()
                .unwrap_or_else(|_| PathBuf::from("."))
                .join(root)
        };
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub async fn ensure_root(&self) -> Result<()> {
        tokio::fs::create_dir_all(&self.root).await.map_err(|err| {
            ThumbnailCacheError::Storage(format!(
                "failed to create cache dir {:?}: {err}",
                self.root
            ))
        })
    }

    /// Resolve a relative entry path against the root, rejecting anything
    /// that could escape it.
    pub fn abs_path(&self, rel: &Path) -> Result<PathBuf> {
        let safe = rel
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
        if rel.as_os_str().is_empty() || !safe {
            return Err(ThumbnailCacheError::Storage(format!(
                "invalid cache entry path: {rel:?}"
            )));
        }
        Ok(self.root.join(rel))
    }

    pub async fn exists(&self, rel: &Path) -> bool {
        match self.abs_path(rel) {
            Ok(path) => tokio::fs::try_exists(path).await.unwrap_or(false),
            Err(_) => false,
        }
    }

    /// Write bytes to a unique temp name, sync, then rename into place.
    /// Renaming onto an existing same-version file is a no-op by content,
    /// since paths are versioned.
    pub async fn write_atomic(
        &self,
        rel: &Path,
        bytes: &[u8],
    ) -> Result<PathBuf> {
        self.ensure_root().await?;
        let path = self.abs_path(rel)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|err| {
                ThumbnailCacheError::Storage(format!(
                    "failed to create cache dir {parent:?}: {err}"
                ))
            })?;
        }

        let tmp = path
            .with_extension(format!("tmp.{}", Uuid::new_v4().simple()));
        let mut file =
            tokio::fs::File::create(&tmp).await.map_err(|err| {
                ThumbnailCacheError::Storage(format!(
                    "failed to create temp thumbnail {tmp:?}: {err}"
                ))
            })?;
        file.write_all(bytes).await.map_err(|err| {
            ThumbnailCacheError::Storage(format!(
                "failed to write temp thumbnail {tmp:?}: {err}"
            ))
        })?;
        file.sync_all().await.map_err(|err| {
            ThumbnailCacheError::Storage(format!(
                "failed to sync temp thumbnail {tmp:?}: {err}"
            ))
        })?;
        drop(file);

        if let Err(err) = tokio::fs::rename(&tmp, &path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(ThumbnailCacheError::Storage(format!(
                "failed to publish thumbnail {tmp:?} -> {path:?}: {err}"
            )));
        }

        Ok(path)
    }

    /// Remove a cached file by its absolute bookkeeping path. Missing
    /// files report `Ok(false)`; paths outside the root are refused.
    pub async fn remove(&self, path: &Path) -> Result<bool> {
        if !path.starts_with(&self.root) {
            return Err(ThumbnailCacheError::Storage(format!(
                "refusing to delete outside cache root: {path:?}"
            )));
        }
        match tokio::fs::remove_file(path).await {
            Ok(()) => Ok(true),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                Ok(false)
            }
            Err(err) => Err(ThumbnailCacheError::Storage(format!(
                "failed to delete cached thumbnail {path:?}: {err}"
            ))),
        }
    }

    /// Total file count and bytes under the root. Approximate under
    /// concurrent mutation; a missing root counts as empty.
    pub async fn usage(&self) -> Result<CacheUsage> {
        if !tokio::fs::try_exists(&self.root).await.unwrap_or(false) {
            return Ok(CacheUsage::default());
        }
        walk_usage(self.root.clone()).await
    }
}

fn walk_usage(dir: PathBuf) -> BoxFuture<'static, Result<CacheUsage>> {
    Box::pin(async move {
        let mut usage = CacheUsage::default();
        let mut entries =
            tokio::fs::read_dir(&dir).await.map_err(|err| {
                ThumbnailCacheError::Storage(format!(
                    "failed to read cache dir {dir:?}: {err}"
                ))
            })?;
        while let Some(entry) =
            entries.next_entry().await.map_err(|err| {
                ThumbnailCacheError::Storage(format!(
                    "failed to read cache dir {dir:?}: {err}"
                ))
            })?
        {
            let path = entry.path();
            if path.is_dir() {
                let sub = walk_usage(path).await?;
                usage.file_count += sub.file_count;
                usage.total_bytes += sub.total_bytes;
            } else if let Ok(metadata) = entry.metadata().await {
                usage.file_count += 1;
                usage.total_bytes += metadata.len();
            }
        }
        Ok(usage)
    })
}
