//! Numeric primitives for dense probability tables.

pub mod math;

pub use math::index::*;
pub use math::normalize::*;
