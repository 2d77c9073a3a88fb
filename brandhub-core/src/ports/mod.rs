//! Capability ports consumed by the cache service.
//!
//! Both collaborators are external to this subsystem: the relational
//! asset store is owned by the wider application, and the remote drive
//! provider is reached over HTTP. Keeping them behind traits lets the
//! hit/miss/stale logic be exercised without a database or network.

pub mod assets;
pub mod drive;

pub use assets::AssetCacheRepository;
pub use drive::{DriveThumbnailSource, HttpDriveThumbnailSource};
