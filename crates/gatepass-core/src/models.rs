//! Domain models for Gatepass.
//!
//! These are the core types shared across all crates.

pub mod activity;
pub mod permit;
pub mod role_permissions;
pub mod statistics;
pub mod user;
