//! # trellis-runtime
//!
//! The session/context layer between the line protocol and the decoding
//! engine:
//!
//! - **Protocol**: [`protocol::parse_line`] classifies each input line as a
//!   [`protocol::Command`] or a [`protocol::DecodeRequest`]
//! - **Context**: [`context::TranslationContext`] serializes all operations
//!   addressed to one name while independent contexts run in parallel
//! - **Registry**: [`registry::ContextRegistry`] creates contexts lazily,
//!   exactly once per name
//! - **Session manager**: [`session::SessionManager`] owns the registry, the
//!   shared grammar cache, and the engine handle; dispatches lines and
//!   loads/saves persisted state
//!
//! ## Crate Position
//!
//! Aggregation layer. Depends on: trellis-core, trellis-grammar,
//! trellis-state, trellis-engine. Depended on by: the `trellis` binary.

#![deny(unsafe_code)]

pub mod context;
pub mod errors;
pub mod protocol;
pub mod registry;
pub mod session;

pub use context::TranslationContext;
pub use errors::RuntimeError;
pub use protocol::{Command, DecodeRequest, Operation, ParseError};
pub use registry::ContextRegistry;
pub use session::{SessionManager, SessionOptions};
