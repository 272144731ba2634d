//! Foundational and often-reused types.

pub(crate) mod bucket;
pub(crate) mod config;
pub(crate) mod error;
pub(crate) mod id;
pub(crate) mod range;
