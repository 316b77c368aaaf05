//! # HTTP Handlers

pub mod health;
pub mod tasks;
