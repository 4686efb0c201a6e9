//! Request authentication and role gating.

pub mod access;
pub mod carrier;

pub use access::{AccessGuard, Identity};
pub use carrier::CredentialCarrier;
