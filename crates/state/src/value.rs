//! Values stored in the shared state.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A value held under one shared-state key.
///
/// Values travel through the databag as JSON text, so a string is stored as
/// `"bar"` (quoted), a number as `42` and a list as `[1,2,3]`. Decoding picks
/// the first variant that matches, which keeps integers integral.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StateValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<StateValue>),
    Map(BTreeMap<String, StateValue>),
}

impl StateValue {
    /// Encode the value to its databag representation.
    ///
    /// # Errors
    ///
    /// Returns an error if the value cannot be represented as JSON (a
    /// non-finite float).
    pub fn encode(&self, key: &str) -> Result<String> {
        if !self.is_representable() {
            return Err(Error::encode(key, "non-finite floats have no JSON form"));
        }
        serde_json::to_string(self).map_err(|e| Error::encode(key, e.to_string()))
    }

    /// Decode a databag string back into a value.
    ///
    /// # Errors
    ///
    /// Returns an error if `raw` is not valid JSON.
    pub fn decode(key: &str, raw: &str) -> Result<Self> {
        serde_json::from_str(raw).map_err(|e| Error::decode(key, e.to_string()))
    }

    fn is_representable(&self) -> bool {
        match self {
            Self::Float(value) => value.is_finite(),
            Self::List(values) => values.iter().all(Self::is_representable),
            Self::Map(entries) => entries.values().all(Self::is_representable),
            _ => true,
        }
    }

    /// Short name of the variant, for error messages.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "integer",
            Self::Float(_) => "float",
            Self::Str(_) => "string",
            Self::List(_) => "list",
            Self::Map(_) => "map",
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(value) => Some(value),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(value) => Some(*value),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_list(&self) -> Option<&[Self]> {
        match self {
            Self::List(values) => Some(values),
            _ => None,
        }
    }
}

impl From<&str> for StateValue {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for StateValue {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<i64> for StateValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for StateValue {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<f64> for StateValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for StateValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl<T: Into<Self>> From<Vec<T>> for StateValue {
    fn from(values: Vec<T>) -> Self {
        Self::List(values.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Self>> From<Option<T>> for StateValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_is_stored_quoted() -> Result<()> {
        assert_eq!(StateValue::from("bar").encode("foo")?, r#""bar""#);
        Ok(())
    }

    #[test]
    fn test_decode_prefers_integers() -> Result<()> {
        assert_eq!(StateValue::decode("k", "42")?, StateValue::Int(42));
        assert_eq!(StateValue::decode("k", "4.5")?, StateValue::Float(4.5));
        Ok(())
    }

    #[test]
    fn test_decode_accepts_spaced_lists() -> Result<()> {
        assert_eq!(
            StateValue::decode("list", "[1, 2, 3]")?,
            StateValue::from(vec![1, 2, 3])
        );
        Ok(())
    }

    #[test]
    fn test_decode_rejects_bare_words() {
        assert!(matches!(
            StateValue::decode("foo", "bar"),
            Err(Error::Decode { .. })
        ));
    }

    #[test]
    fn test_non_finite_float_is_rejected() {
        assert!(StateValue::Float(f64::NAN).encode("k").is_err());
        assert!(StateValue::from(vec![1.0, f64::INFINITY]).encode("k").is_err());
    }
}
