//! Configuration module for the design codec
//!
//! Provides types and parsing for `design.toml`.

pub mod loader;
pub mod schema;

pub use loader::*;
pub use schema::*;
