//! # Database
//!
//! PostgreSQL pool ownership and the embedded schema migrations.

pub mod connection;

pub use connection::DatabaseConnection;
