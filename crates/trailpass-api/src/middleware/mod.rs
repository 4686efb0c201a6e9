//! HTTP middleware and route guards.

pub mod error_detail;
pub mod logging;
pub mod rbac;
