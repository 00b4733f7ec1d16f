// Thin re-export module: the engine lives in `blockchain/core.rs`, split into
// block hashing, chain management and validation.

pub mod core;
pub use core::*;
