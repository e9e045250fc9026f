//! Core math modules.

pub mod index;
pub mod normalize;
