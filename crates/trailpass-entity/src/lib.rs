//! # trailpass-entity
//!
//! Domain entity models for Trailpass. The user record is the only entity
//! the credential core owns a view of; it derives `Serialize` for API
//! responses and decodes from a PostgreSQL row via `sqlx::FromRow`.

pub mod user;

pub use user::{NewUser, PendingReset, User, UserRole};
