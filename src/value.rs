//! Typed attribute values carried by trial records and trial type tables

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A single attribute value.
///
/// Integers and floats compare numerically with each other. Text only
/// compares with text; any other pairing is a [`TypeMismatch`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// Integer value (stepper position, stimulus number, ...)
    Int(i64),
    /// Floating point value
    Float(f64),
    /// Text value (side names, free-form labels)
    Text(String),
}

/// Two values of incompatible kinds were compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeMismatch {
    /// Kind of the left operand
    pub left: &'static str,
    /// Kind of the right operand
    pub right: &'static str,
}

impl fmt::Display for TypeMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cannot compare {} with {}", self.left, self.right)
    }
}

impl std::error::Error for TypeMismatch {}

impl FieldValue {
    /// Parse a raw log token: integer first, then float, otherwise text.
    #[must_use]
    pub fn parse(token: &str) -> Self {
        if let Ok(i) = token.parse::<i64>() {
            Self::Int(i)
        } else if let Ok(x) = token.parse::<f64>() {
            Self::Float(x)
        } else {
            Self::Text(token.to_string())
        }
    }

    /// Short name of the value kind, used in diagnostics.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Text(_) => "text",
        }
    }

    /// Numeric view of the value.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(i) => Some(*i as f64),
            Self::Float(x) => Some(*x),
            Self::Text(_) => None,
        }
    }

    /// Text view of the value.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Value as a small non-negative index, if it is one.
    ///
    /// Integral floats are accepted (`2.0` -> `2`).
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn as_index(&self) -> Option<usize> {
        match self {
            Self::Int(i) => usize::try_from(*i).ok(),
            Self::Float(x) if x.fract() == 0.0 && *x >= 0.0 && *x <= f64::from(u32::MAX) => {
                Some(*x as usize)
            }
            _ => None,
        }
    }

    /// Order two values.
    ///
    /// Returns `Ok(None)` for unordered numbers (NaN).
    ///
    /// # Errors
    ///
    /// Returns [`TypeMismatch`] when text is compared with a number.
    pub fn try_cmp(&self, other: &Self) -> std::result::Result<Option<Ordering>, TypeMismatch> {
        match (self, other) {
            (Self::Int(a), Self::Int(b)) => Ok(Some(a.cmp(b))),
            (Self::Text(a), Self::Text(b)) => Ok(Some(a.cmp(b))),
            (Self::Text(_), _) | (_, Self::Text(_)) => Err(TypeMismatch {
                left: self.kind(),
                right: other.kind(),
            }),
            _ => Ok(self
                .as_f64()
                .zip(other.as_f64())
                .and_then(|(a, b)| a.partial_cmp(&b))),
        }
    }

    /// Value equality with numeric coercion.
    ///
    /// # Errors
    ///
    /// Returns [`TypeMismatch`] when text is compared with a number.
    pub fn try_eq(&self, other: &Self) -> std::result::Result<bool, TypeMismatch> {
        Ok(self.try_cmp(other)? == Some(Ordering::Equal))
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for FieldValue {
    fn from(value: i32) -> Self {
        Self::Int(value.into())
    }
}

impl From<usize> for FieldValue {
    fn from(value: usize) -> Self {
        i64::try_from(value).map_or(Self::Int(i64::MAX), Self::Int)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}
