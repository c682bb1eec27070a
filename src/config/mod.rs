//! Configuration for upscale runs
//!
//! Provides the `fscale.toml` schema and its discovery/loading rules.

pub mod loader;
pub mod schema;

pub use loader::*;
pub use schema::*;
