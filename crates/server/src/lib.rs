//! HTTP cache node for content-addressed artifacts.
//!
//! This crate composes the content store, the coordinator registry, and an
//! upstream substituter into the serving flow:
//! - Substituter-compatible read path (local-store hit or upstream proxy)
//! - Two-phase streaming transport (status first, body second)
//! - Best-effort background population of the store after a proxied fetch
//! - Publish and invalidate endpoints

pub mod error;
pub mod handlers;
pub mod resolve;
pub mod routes;
pub mod state;
pub mod stream;

pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use state::AppState;
