//! Log payloads: the values handed to a log call.
//!
//! Text is logged as-is. Structured values and errors have two renderings:
//! an inspected multi-line form (pretty JSON, or an error with its cause
//! chain) and the native form the console appends on the alert channel.

use crate::Result;
use serde::Serialize;
use std::error::Error as StdError;
use std::fmt;

/// A single value passed to a log call
pub enum Payload {
    /// Plain text, never re-serialized
    Text(String),
    /// Structured data
    Value(serde_json::Value),
    /// An error object, rendered with its `source()` chain
    Error(Box<dyn StdError + Send + Sync>),
}

impl Payload {
    /// Convert any serializable value into a structured payload
    pub fn serialize<T: Serialize + ?Sized>(value: &T) -> Result<Self> {
        Ok(Payload::Value(serde_json::to_value(value)?))
    }

    /// Wrap an error value
    pub fn error<E>(err: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Payload::Error(Box::new(err))
    }

    pub fn is_text(&self) -> bool {
        matches!(self, Payload::Text(_))
    }

    /// Human-readable multi-line rendering
    pub fn inspect(&self) -> String {
        match self {
            Payload::Text(text) => text.clone(),
            Payload::Value(value) => {
                serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
            }
            Payload::Error(err) => render_error_chain(err.as_ref()),
        }
    }
}

fn render_error_chain(err: &(dyn StdError + 'static)) -> String {
    let mut out = format!("Error: {}", err);
    let mut source = err.source();
    while let Some(cause) = source {
        out.push_str("\n    Caused by: ");
        out.push_str(&cause.to_string());
        source = cause.source();
    }
    out
}

impl fmt::Debug for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Payload::Text(text) => f.debug_tuple("Text").field(text).finish(),
            Payload::Value(value) => f.debug_tuple("Value").field(value).finish(),
            Payload::Error(err) => f.debug_tuple("Error").field(&err.to_string()).finish(),
        }
    }
}

impl From<&str> for Payload {
    fn from(text: &str) -> Self {
        Payload::Text(text.to_string())
    }
}

impl From<String> for Payload {
    fn from(text: String) -> Self {
        Payload::Text(text)
    }
}

impl From<&String> for Payload {
    fn from(text: &String) -> Self {
        Payload::Text(text.clone())
    }
}

impl From<serde_json::Value> for Payload {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::String(text) => Payload::Text(text),
            other => Payload::Value(other),
        }
    }
}

/// The argument list of one log call
#[derive(Debug, Default)]
pub struct Payloads(pub Vec<Payload>);

impl Payloads {
    pub fn iter(&self) -> std::slice::Iter<'_, Payload> {
        self.0.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

macro_rules! single_payload {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Payloads {
                fn from(value: $ty) -> Self {
                    Payloads(vec![Payload::from(value)])
                }
            }
        )*
    };
}

single_payload!(&str, String, &String, serde_json::Value);

impl From<Payload> for Payloads {
    fn from(value: Payload) -> Self {
        Payloads(vec![value])
    }
}

impl From<Vec<Payload>> for Payloads {
    fn from(values: Vec<Payload>) -> Self {
        Payloads(values)
    }
}

/// Build a [`Payloads`] list from heterogeneous values.
///
/// ```
/// use blocklog_core::{payloads, Payload};
/// let args = payloads!["count:", serde_json::json!({"a": 1})];
/// assert_eq!(args.0.len(), 2);
/// assert!(matches!(args.0[1], Payload::Value(_)));
/// ```
#[macro_export]
macro_rules! payloads {
    ($($value:expr),* $(,)?) => {
        $crate::Payloads(vec![$($crate::Payload::from($value)),*])
    };
}
