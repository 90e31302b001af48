//! Core types and traits for the Keyspan URL shortener.
//!
//! This crate provides the shared vocabulary used by every other crate:
//! the base62 codec, [`ShortCode`] and [`Link`], the storage, cache and
//! coordination traits, and the per-call [`Context`].

pub mod base62;
pub mod cache;
pub mod context;
pub mod coordination;
pub mod error;
pub mod repository;
pub mod shortcode;
pub mod shortener;

pub use cache::LinkCache;
pub use context::{Cancelled, Context};
pub use coordination::{CoordinationLock, CoordinationService, Counter};
pub use error::{CacheError, CoordinationError, CoreError, StorageError};
pub use repository::{Link, Repository};
pub use shortcode::ShortCode;
pub use shortener::Shortener;
