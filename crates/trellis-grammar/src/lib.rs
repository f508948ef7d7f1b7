//! # trellis-grammar
//!
//! Grammar caching for the translation service:
//!
//! - [`Fingerprint`]: stable digest of a source sentence, the cache key
//! - [`GrammarCache`]: bounded LRU store of immutable per-sentence grammars,
//!   shared by every translation context
//!
//! The cache is an accelerator, never a correctness requirement: any miss is
//! satisfied by re-extracting the grammar through the engine.
//!
//! ## Crate Position
//!
//! Depends on: trellis-core. Depended on by: trellis-runtime.

#![deny(unsafe_code)]

pub mod cache;
pub mod fingerprint;

pub use cache::{CacheTag, GrammarCache};
pub use fingerprint::Fingerprint;
