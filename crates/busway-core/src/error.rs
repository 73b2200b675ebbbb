//! Error types for busway.

use std::fmt;

/// Errors produced while parsing a channel-I/O string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelIoError {
    /// The string contains no tokens.
    Empty,
    /// A token has no `-` separating inputs from outputs, or more than one.
    MissingSeparator(String),
    /// A bus entry is neither a positive integer nor `*`.
    InvalidBusEntry {
        /// The offending token.
        token: String,
        /// The entry that failed to parse.
        entry: String,
    },
    /// A bus entry of zero inside a multi-bus side (e.g. `1.0-1`).
    ZeroChannelBus(String),
    /// The token declares no buses at all (`0-0`).
    NoBuses(String),
    /// The token exceeds bus or channel limits.
    LimitExceeded {
        /// The offending token.
        token: String,
        /// Which limit was exceeded.
        reason: String,
    },
}

impl fmt::Display for ChannelIoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "channel I/O string is empty"),
            Self::MissingSeparator(token) => {
                write!(f, "token {:?} must have the form <inputs>-<outputs>", token)
            }
            Self::InvalidBusEntry { token, entry } => {
                write!(f, "token {:?}: bus entry {:?} is not a positive integer or '*'", token, entry)
            }
            Self::ZeroChannelBus(token) => write!(f, "token {:?} declares a bus with zero channels", token),
            Self::NoBuses(token) => write!(f, "token {:?} declares no buses", token),
            Self::LimitExceeded { token, reason } => write!(f, "token {:?}: {}", token, reason),
        }
    }
}

impl std::error::Error for ChannelIoError {}

/// Errors that can occur while building a processing unit.
#[derive(Debug)]
pub enum UnitError {
    /// The channel-I/O string could not be parsed.
    Topology(ChannelIoError),
    /// The unit configuration is invalid.
    InvalidConfiguration(String),
    /// The configuration document could not be deserialized.
    Deserialize(serde_json::Error),
}

impl fmt::Display for UnitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Topology(err) => write!(f, "Invalid topology: {}", err),
            Self::InvalidConfiguration(msg) => write!(f, "Invalid configuration: {}", msg),
            Self::Deserialize(err) => write!(f, "Configuration parse error: {}", err),
        }
    }
}

impl std::error::Error for UnitError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Topology(err) => Some(err),
            Self::Deserialize(err) => Some(err),
            Self::InvalidConfiguration(_) => None,
        }
    }
}

impl From<ChannelIoError> for UnitError {
    fn from(err: ChannelIoError) -> Self {
        Self::Topology(err)
    }
}

impl From<serde_json::Error> for UnitError {
    fn from(err: serde_json::Error) -> Self {
        Self::Deserialize(err)
    }
}

/// Result type for unit construction and configuration.
pub type UnitResult<T> = Result<T, UnitError>;
