//! # trellis-engine
//!
//! The boundary to the decoding engine, which the session layer treats as an
//! external collaborator:
//!
//! - [`Engine`]: the trait the session layer decodes through
//!   (`extract_grammar`, `translate`, `close`)
//! - [`TableEngine`]: a deterministic reference implementation backed by a
//!   phrase table in the config directory, used by the binary and tests
//! - [`normalize`]: tokenize/detokenize pair wrapped around decodes when
//!   normalization is enabled
//!
//! ## Crate Position
//!
//! Depends on: trellis-core, trellis-state. Depended on by: trellis-runtime.

#![deny(unsafe_code)]

pub mod engine;
pub mod errors;
pub mod normalize;
pub mod table;

pub use engine::Engine;
pub use errors::EngineError;
pub use table::TableEngine;
