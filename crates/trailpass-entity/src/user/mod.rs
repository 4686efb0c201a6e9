//! User domain entities.

pub mod model;
pub mod role;

pub use model::{NewUser, PendingReset, User};
pub use role::UserRole;
