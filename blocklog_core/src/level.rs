//! Level registry: the six fixed severities, their ranks and display symbols.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Log severity, ordered from highest priority (`Error`) to lowest (`Trace`).
///
/// The derived ordering follows [`Severity::rank`], so `Error < Trace`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum Severity {
    Error,
    Warn,
    #[default]
    Info,
    Log,
    Debug,
    Trace,
}

/// Which of the two logical sinks a severity is written to
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Channel {
    /// Standard output channel (`info`, `log`, `debug`)
    Normal,
    /// Error/alert channel (`error`, `warn`, `trace`)
    Alert,
}

impl Severity {
    /// All severities in rank order
    pub const ALL: [Severity; 6] = [
        Severity::Error,
        Severity::Warn,
        Severity::Info,
        Severity::Log,
        Severity::Debug,
        Severity::Trace,
    ];

    /// Numeric rank; lower means higher priority
    pub fn rank(self) -> u8 {
        match self {
            Severity::Error => 0,
            Severity::Warn => 1,
            Severity::Info => 2,
            Severity::Log => 3,
            Severity::Debug => 4,
            Severity::Trace => 5,
        }
    }

    /// Three-character display symbol
    pub fn symbol(self) -> &'static str {
        match self {
            Severity::Error => "ERR",
            Severity::Warn => "WRN",
            Severity::Info => "IFO",
            Severity::Log => "LOG",
            Severity::Debug => "DBG",
            Severity::Trace => "TCE",
        }
    }

    /// Lowercase name as accepted by [`validate`]
    pub fn name(self) -> &'static str {
        match self {
            Severity::Error => "error",
            Severity::Warn => "warn",
            Severity::Info => "info",
            Severity::Log => "log",
            Severity::Debug => "debug",
            Severity::Trace => "trace",
        }
    }

    pub fn channel(self) -> Channel {
        match self {
            Severity::Error | Severity::Warn | Severity::Trace => Channel::Alert,
            Severity::Info | Severity::Log | Severity::Debug => Channel::Normal,
        }
    }

    /// Whether a call on `self` passes a logger configured with `threshold`
    pub fn passes(self, threshold: Severity) -> bool {
        self.rank() <= threshold.rank()
    }
}

/// Resolve a caller-supplied severity name.
///
/// Names are matched exactly (lowercase), anything else is
/// [`Error::InvalidSeverity`].
pub fn validate(input: &str) -> Result<Severity> {
    Severity::ALL
        .into_iter()
        .find(|severity| severity.name() == input)
        .ok_or_else(|| Error::InvalidSeverity(input.to_string()))
}

impl FromStr for Severity {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        validate(s)
    }
}

impl TryFrom<String> for Severity {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        validate(&value)
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
