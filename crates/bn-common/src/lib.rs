//! Shared types for the bayes-net workspace.
//!
//! This crate carries the error taxonomy used by every other crate:
//! - `Error`, one variant per modeling mistake, with stable numeric codes
//! - `ErrorFamily`, the coarse class of an error
//! - `Result`, the workspace-wide result alias

pub mod error;

pub use error::{Error, ErrorFamily, Result};
