//! Gatepass Core — domain models, the error taxonomy, the role/capability
//! matrix, permit lifecycle rules and repository trait definitions.
//!
//! This crate has no I/O. Storage lives behind the traits in
//! [`repository`]; services in `gatepass-permits` and `gatepass-auth`
//! are generic over them.

pub mod actor;
pub mod capability;
pub mod error;
pub mod lifecycle;
pub mod models;
pub mod repository;
pub mod validation;
