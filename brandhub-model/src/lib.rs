//! Shared data models for the Brandhub brand-guidelines platform.
//!
//! This crate carries the types that cross the boundary between the
//! application's asset records and the remote thumbnail cache: asset
//! identity, the externally owned drive-file fields, thumbnail size
//! variants, and the cache bookkeeping triple. It performs no I/O.

pub mod asset;
pub mod thumbnail;

pub use asset::*;
pub use thumbnail::*;
