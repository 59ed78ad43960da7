//! NaN-safe floating point
//!
//! Radios report `NaN` for sensors that are fitted but not reading. JSON has
//! no representation for it, so non-finite values are written as `null` and
//! `null` reads back as `0.0`.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A float that always serializes to valid JSON.
#[derive(Debug, Clone, Copy, Default, PartialEq, PartialOrd)]
pub struct SafeFloat(pub f64);

impl SafeFloat {
    /// Wrap a value.
    pub fn new(value: f64) -> Self {
        Self(value)
    }

    /// The wrapped value.
    pub fn value(&self) -> f64 {
        self.0
    }

    /// True when the value will be written as `null`.
    pub fn is_null(&self) -> bool {
        !self.0.is_finite()
    }
}

impl From<f32> for SafeFloat {
    fn from(value: f32) -> Self {
        Self(f64::from(value))
    }
}

impl From<f64> for SafeFloat {
    fn from(value: f64) -> Self {
        Self(value)
    }
}

impl From<SafeFloat> for f64 {
    fn from(value: SafeFloat) -> Self {
        value.0
    }
}

impl Serialize for SafeFloat {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.0.is_finite() {
            serializer.serialize_f64(self.0)
        } else {
            serializer.serialize_none()
        }
    }
}

impl<'de> Deserialize<'de> for SafeFloat {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Option::<f64>::deserialize(deserializer)?;
        Ok(Self(value.unwrap_or(0.0)))
    }
}

/// Map an optional wire float into the JSON representation.
pub fn opt(value: Option<f32>) -> Option<SafeFloat> {
    value.map(SafeFloat::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_finite_serializes_as_number() {
        let json = serde_json::to_string(&SafeFloat(6.25)).unwrap();
        assert_eq!(json, "6.25");
    }

    #[test]
    fn test_non_finite_serializes_as_null() {
        assert_eq!(serde_json::to_string(&SafeFloat(f64::NAN)).unwrap(), "null");
        assert_eq!(serde_json::to_string(&SafeFloat(f64::INFINITY)).unwrap(), "null");
        assert_eq!(serde_json::to_string(&SafeFloat(f64::NEG_INFINITY)).unwrap(), "null");
    }

    #[test]
    fn test_null_reads_back_as_zero() {
        let value: SafeFloat = serde_json::from_str("null").unwrap();
        assert_eq!(value.value(), 0.0);
        assert!(!value.value().is_nan());
    }

    #[test]
    fn test_nan_survives_json_as_zero() {
        let json = serde_json::to_string(&SafeFloat::from(f32::NAN)).unwrap();
        let back: SafeFloat = serde_json::from_str(&json).unwrap();
        assert_eq!(back, SafeFloat(0.0));
    }

    #[test]
    fn test_optional_field_omitted_or_null() {
        #[derive(Serialize)]
        struct Reading {
            #[serde(skip_serializing_if = "Option::is_none")]
            lux: Option<SafeFloat>,
        }

        let absent = serde_json::to_string(&Reading { lux: opt(None) }).unwrap();
        assert_eq!(absent, "{}");
        let nan = serde_json::to_string(&Reading { lux: opt(Some(f32::NAN)) }).unwrap();
        assert_eq!(nan, r#"{"lux":null}"#);
    }
}
