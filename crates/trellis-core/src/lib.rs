//! # trellis-core
//!
//! Foundation types shared by every trellis crate:
//!
//! - **Context names**: [`ids::ContextName`] newtype addressing a translation
//!   context (the empty name is the default context)
//! - **Grammars**: [`grammar::Grammar`] and [`grammar::Rule`], the opaque
//!   per-sentence translation grammar handed to the decoding engine
//! - **Logging**: [`logging::init_subscriber`] for the stderr `tracing`
//!   subscriber (stdout is reserved for hypotheses)
//!
//! ## Crate Position
//!
//! Foundation crate. Depended on by all other trellis crates.

#![deny(unsafe_code)]

pub mod grammar;
pub mod ids;
pub mod logging;

pub use grammar::{Grammar, Rule};
pub use ids::ContextName;
