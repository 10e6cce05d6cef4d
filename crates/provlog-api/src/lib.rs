//! # Provlog API
//!
//! HTTP surface of the ledger: event ingestion, listing, chain verification,
//! archive reconciliation, export and health. Authentication is a single
//! pre-shared key in the `X-API-Key` header; validation happens here, before
//! anything reaches the chain layer.

pub mod config;
pub mod error;
pub mod export;
pub mod middleware;
pub mod routes;
pub mod state;
pub mod validate;

pub use config::Config;
pub use error::{ApiError, ApiResult};
pub use routes::api_router;
pub use state::AppState;
