//! # trailpass-database
//!
//! The [`UserStore`] trait is the only way the credential core touches
//! persisted user records. Two implementations live here: the PostgreSQL
//! [`PgUserRepository`](repositories::user::PgUserRepository) and the
//! in-process [`MemoryUserStore`](memory::MemoryUserStore).
//!
//! Every write that depends on previously read reset or password state is a
//! single conditional operation in both implementations.

pub mod connection;
pub mod memory;
pub mod migration;
pub mod repositories;
pub mod store;

pub use connection::DatabasePool;
pub use memory::MemoryUserStore;
pub use repositories::user::PgUserRepository;
pub use store::UserStore;
