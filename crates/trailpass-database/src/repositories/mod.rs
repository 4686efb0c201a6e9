//! PostgreSQL repository implementations.

pub mod user;
