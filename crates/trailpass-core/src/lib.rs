//! # trailpass-core
//!
//! Core crate for Trailpass. Contains the configuration schema and loader,
//! the unified error system, and the clock abstraction every time-sensitive
//! component is constructed with.
//!
//! This crate has **no** internal dependencies on other Trailpass crates.

pub mod clock;
pub mod config;
pub mod error;
pub mod result;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::AppError;
pub use result::AppResult;
