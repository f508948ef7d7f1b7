//! Context name newtype.
//!
//! Translation contexts are addressed by client-chosen names rather than
//! generated IDs. The empty name is the default context, used whenever the
//! client supplies no name. Wrapping the name in a newtype keeps it from
//! being confused with sentence text or file paths at call sites.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Name of a translation context.
///
/// The default context has the empty name and always exists conceptually;
/// like every other context it is materialized on first use.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContextName(String);

impl ContextName {
    /// The default (unnamed) context.
    #[must_use]
    pub fn default_context() -> Self {
        Self(String::new())
    }

    /// Create from an optional client-supplied name. `None` and the empty
    /// string both address the default context.
    #[must_use]
    pub fn from_opt(name: Option<&str>) -> Self {
        Self(name.unwrap_or("").to_owned())
    }

    /// Whether this is the default context.
    #[must_use]
    pub fn is_default(&self) -> bool {
        self.0.is_empty()
    }

    /// Return the inner string as a slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume self and return the inner `String`.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for ContextName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            f.write_str("(default)")
        } else {
            f.write_str(&self.0)
        }
    }
}

impl AsRef<str> for ContextName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<String> for ContextName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ContextName {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl From<ContextName> for String {
    fn from(name: ContextName) -> Self {
        name.0
    }
}
