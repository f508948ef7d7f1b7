//! # trellis-state
//!
//! The incremental model overlay owned by each translation context:
//!
//! - [`AdaptationState`]: weight updates and translation memory accumulated
//!   from commands, versioned for cache invalidation, with exact
//!   snapshot/restore round-tripping
//! - [`file`]: the multi-context persisted state file written by `save`
//!   commands and consumed at startup or by `load`
//!
//! ## Crate Position
//!
//! Foundation-level crate. Depended on by: trellis-engine, trellis-runtime.

#![deny(unsafe_code)]

pub mod errors;
pub mod file;
pub mod state;

pub use errors::StateError;
pub use file::StateStore;
pub use state::AdaptationState;
