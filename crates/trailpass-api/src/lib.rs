//! # trailpass-api
//!
//! HTTP adapter for the Trailpass credential core, built on Axum.
//!
//! Handlers stay thin: they decode the request, call one service method
//! from `trailpass-auth`, and shape the response envelope.

pub mod dto;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;

pub use error::ApiError;
pub use router::build_router;
pub use state::AppState;
