//! Configuration module for the channel harvest
//!
//! This module provides the `HarvestConfig` struct, its type-safe builder and
//! environment loading for the binary.

// Sub-modules
pub mod builder;
pub mod env;
pub mod getters;
pub mod methods;
pub mod types;

// Re-exports for public API
pub use builder::{Complete, HarvestConfigBuilder, WithCacheDir};
pub use types::HarvestConfig;
