//! Line protocol: commands vs decode requests.
//!
//! A line containing the reserved `|||` delimiter is a command; any other
//! non-empty line is a sentence to translate. Command fields are
//! `|||`-separated, the first field is the verb, the rest are payload.
//! Parsing is pure: no state is touched, malformed lines fail with a
//! [`ParseError`] and the stream continues.

use std::path::PathBuf;

/// The reserved field delimiter. A line is a command iff it contains this.
pub const DELIMITER: &str = "|||";

/// A parsed input line.
#[derive(Clone, Debug, PartialEq)]
pub enum Operation {
    /// State-affecting instruction; produces no output line.
    Command(Command),
    /// Sentence to translate; produces exactly one output line.
    Decode(DecodeRequest),
}

/// A sentence to translate.
#[derive(Clone, Debug, PartialEq)]
pub struct DecodeRequest {
    /// Raw source sentence text.
    pub sentence: String,
}

/// A parsed command.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Learn a reference translation pair.
    Learn {
        /// Source phrase.
        source: String,
        /// Reference target phrase.
        target: String,
    },
    /// Accumulate feature-weight deltas, given as `name=value` pairs.
    UpdateWeights {
        /// Parsed `(feature, delta)` pairs.
        updates: Vec<(String, f64)>,
    },
    /// Persist the context's state (to the given path, or the configured one).
    Save {
        /// Explicit target path, if any.
        path: Option<PathBuf>,
    },
    /// Restore the context's state from a state file.
    Load {
        /// Explicit source path, if any.
        path: Option<PathBuf>,
    },
    /// Discard everything the context has learned.
    Reset,
    /// Remove the context from the registry entirely.
    Drop,
    /// Empty the shared grammar cache.
    ClearCache,
}

impl Command {
    /// Canonical verb, for logging.
    #[must_use]
    pub fn verb(&self) -> &'static str {
        match self {
            Self::Learn { .. } => "learn",
            Self::UpdateWeights { .. } => "weights",
            Self::Save { .. } => "save",
            Self::Load { .. } => "load",
            Self::Reset => "reset",
            Self::Drop => "drop",
            Self::ClearCache => "clear-cache",
        }
    }

    /// Whether applying this command advances adaptation state in a way that
    /// stales grammars extracted against the earlier state.
    #[must_use]
    pub fn mutates_state(&self) -> bool {
        matches!(
            self,
            Self::Learn { .. } | Self::UpdateWeights { .. } | Self::Reset | Self::Load { .. }
        )
    }
}

/// A malformed command line.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum ParseError {
    /// The input line was empty or whitespace.
    #[error("Empty input line")]
    EmptyLine,

    /// The verb is not part of the command language.
    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    /// Wrong number of payload fields for the verb.
    #[error("Command '{verb}' expects {expected} field(s), got {got}")]
    WrongArity {
        /// Canonical verb name.
        verb: &'static str,
        /// Expected payload field count (description).
        expected: &'static str,
        /// Fields received.
        got: usize,
    },

    /// A weight-update pair did not parse as `name=value`.
    #[error("Bad weight update: {0}")]
    BadWeight(String),
}

/// Classify and parse one input line.
pub fn parse_line(line: &str) -> Result<Operation, ParseError> {
    let line = line.trim();
    if line.is_empty() {
        return Err(ParseError::EmptyLine);
    }
    if !line.contains(DELIMITER) {
        return Ok(Operation::Decode(DecodeRequest {
            sentence: line.to_owned(),
        }));
    }

    let mut fields = line.split(DELIMITER).map(str::trim);
    let verb = fields.next().unwrap_or("").to_lowercase();
    let payload: Vec<&str> = fields.collect();

    let command = match verb.as_str() {
        "learn" | "add-reference" => match payload.as_slice() {
            [source, target] => Command::Learn {
                source: (*source).to_owned(),
                target: (*target).to_owned(),
            },
            _ => {
                return Err(ParseError::WrongArity {
                    verb: "learn",
                    expected: "2 (source ||| target)",
                    got: payload.len(),
                });
            }
        },
        "weights" | "update-weights" => match payload.as_slice() {
            [pairs] => Command::UpdateWeights {
                updates: parse_weight_pairs(pairs)?,
            },
            _ => {
                return Err(ParseError::WrongArity {
                    verb: "weights",
                    expected: "1 (name=value ...)",
                    got: payload.len(),
                });
            }
        },
        "save" | "save-state" => Command::Save {
            path: optional_path("save", &payload)?,
        },
        "load" | "load-state" => Command::Load {
            path: optional_path("load", &payload)?,
        },
        "reset" | "reset-context" => {
            no_payload("reset", &payload)?;
            Command::Reset
        }
        "drop" | "drop-context" => {
            no_payload("drop", &payload)?;
            Command::Drop
        }
        "clear" | "clear-cache" => {
            no_payload("clear-cache", &payload)?;
            Command::ClearCache
        }
        other => return Err(ParseError::UnknownCommand(other.to_owned())),
    };
    Ok(Operation::Command(command))
}

fn parse_weight_pairs(pairs: &str) -> Result<Vec<(String, f64)>, ParseError> {
    let mut updates = Vec::new();
    for pair in pairs.split_whitespace() {
        let (name, value) = pair
            .split_once('=')
            .ok_or_else(|| ParseError::BadWeight(pair.to_owned()))?;
        let value: f64 = value
            .parse()
            .map_err(|_| ParseError::BadWeight(pair.to_owned()))?;
        if name.is_empty() {
            return Err(ParseError::BadWeight(pair.to_owned()));
        }
        updates.push((name.to_owned(), value));
    }
    if updates.is_empty() {
        return Err(ParseError::BadWeight("no pairs given".to_owned()));
    }
    Ok(updates)
}

fn optional_path(verb: &'static str, payload: &[&str]) -> Result<Option<PathBuf>, ParseError> {
    match payload {
        [] | [""] => Ok(None),
        [path] => Ok(Some(PathBuf::from(path))),
        _ => Err(ParseError::WrongArity {
            verb,
            expected: "0 or 1 (path)",
            got: payload.len(),
        }),
    }
}

fn no_payload(verb: &'static str, payload: &[&str]) -> Result<(), ParseError> {
    // A single empty trailing field ("reset |||") is tolerated
    match payload {
        [] | [""] => Ok(()),
        _ => Err(ParseError::WrongArity {
            verb,
            expected: "0",
            got: payload.len(),
        }),
    }
}
