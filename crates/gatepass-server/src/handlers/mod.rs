//! Route handlers, one module per resource.

pub mod activity;
pub mod auth;
pub mod health;
pub mod permits;
pub mod statistics;
pub mod users;

use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

impl MessageResponse {
    pub fn new(message: &'static str) -> Self {
        Self { message }
    }
}
