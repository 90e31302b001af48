//! Cache-aside URL shortening on top of pluggable storage, caching and
//! code generation.
//!
//! Adapters are chosen by whoever builds the [`ShortenerService`]; the
//! service itself only sees the [`Repository`](keyspan_core::Repository),
//! [`LinkCache`](keyspan_core::LinkCache) and
//! [`Generator`](keyspan_generator::Generator) traits. The [`backend`]
//! module does that choosing for the shipped binaries.

pub mod backend;
pub mod error;
pub mod service;
pub mod validate;

pub use backend::{build_service, DynShortenerService, NodeConfig};
pub use error::{Result, ShortenerError};
pub use service::{ServiceSettings, ShortenerService};
pub use validate::validate_long_url;
