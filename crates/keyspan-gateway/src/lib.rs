//! HTTP surface for the Keyspan shortener.
//!
//! `POST /api/v1/shorten` mints a code, `GET /api/v1/{code}` answers with a
//! permanent redirect and `DELETE /api/v1/{code}` removes the link. Every
//! request runs under its own [`Context`](keyspan_core::Context) derived
//! from the server's root context.

pub mod app;
pub mod error;
pub mod handlers;
pub mod model;
pub mod state;

pub use app::App;
pub use error::{AppError, Result};
pub use state::AppState;
