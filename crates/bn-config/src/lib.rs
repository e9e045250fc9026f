//! Configuration for the bayes-net engine.
//!
//! This crate provides:
//! - `EngineConfig`, the typed settings shared by networks and factors
//! - JSON loading from strings and files, with per-field defaults
//! - Semantic validation beyond what the schema expresses

pub mod engine;

pub use engine::{ConfigError, EngineConfig, DEFAULT_MAX_FACTOR_CELLS, DEFAULT_TOLERANCE};
