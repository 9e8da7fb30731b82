//! Values of bibliography fields.

use std::borrow::Cow;
use std::fmt;

/// The value of a field in a bibliography entry.
///
/// A field that is not present in an entry has the value [Value::Missing].
/// This is different from a field that is present but empty:
///     both render to the empty string, but only the first one is [null](Value::is_null).
///
/// Values are immutable; operations on them produce new values.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Value {
    #[default]
    Missing,
    Integer(i64),
    String(String),
}

impl Value {
    /// Returns true if this value represents an absent field.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Missing)
    }

    /// Returns the textual form of the value.
    ///
    /// Missing values render to the empty string.
    pub fn text(&self) -> Cow<'_, str> {
        match self {
            Value::Missing => Cow::Borrowed(""),
            Value::Integer(i) => Cow::Owned(i.to_string()),
            Value::String(s) => Cow::Borrowed(s),
        }
    }

    /// Returns the integer held by this value, if any.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            Value::Missing | Value::String(_) => None,
        }
    }

    /// Returns true if the value has no text, or only whitespace.
    ///
    /// This is the test performed by the `empty$` built-in.
    pub fn is_blank(&self) -> bool {
        match self {
            Value::Missing => true,
            Value::Integer(_) => false,
            Value::String(s) => s.trim().is_empty(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.text())
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.into())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}
