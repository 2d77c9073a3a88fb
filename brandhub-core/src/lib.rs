//! # Brandhub Core
//!
//! Remote thumbnail cache for the Brandhub brand-guidelines platform:
//! turns a reference to a file hosted on the cloud-drive provider into a
//! locally servable preview image while avoiding redundant downloads,
//! staying consistent with the remote file's modification history, and
//! reclaiming disk space over time.
//!
//! ## Architecture
//!
//! - [`version`]: deterministic version tags and storage paths derived
//!   from the remote modification timestamp
//! - [`file_store`]: atomic tmp-plus-rename disk storage under a
//!   dedicated cache root
//! - [`ports`]: capability traits for the asset repository and the
//!   remote drive provider
//! - [`service`]: the fetch coordinator (hit/miss/stale decision,
//!   single-flight coalescing), invalidation, reaping and stats
//! - [`reaper`]: background expiry task
//! - [`config`]: typed configuration with TOML and environment loading
//!
//! The serving HTTP route, provider authentication and image resizing
//! live elsewhere; this crate only manages the cache.

pub mod config;
pub mod error;
pub mod file_store;
pub mod ports;
pub mod reaper;
pub mod service;
pub mod version;

pub use config::{ConfigError, ThumbnailCacheConfig};
pub use error::{Result, ThumbnailCacheError};
pub use file_store::{CacheUsage, ThumbnailFileStore};
pub use ports::{
    AssetCacheRepository, DriveThumbnailSource, HttpDriveThumbnailSource,
};
pub use reaper::ExpiryReaperTask;
pub use service::{
    ThumbnailCacheService, ThumbnailFetchRequest, parse_thumbnail_size,
};
pub use version::{CacheVersion, storage_rel_path};
