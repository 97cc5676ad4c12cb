//! Parameter descriptors and decoded parameter values.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Inclusive bounds for a float parameter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FloatRange {
    pub min: f64,
    pub max: f64,
}

impl FloatRange {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Checks `min <= value <= max`.
    pub fn contains(&self, value: f64) -> bool {
        self.min <= value && value <= self.max
    }
}

/// Inclusive bounds for an integer parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IntRange {
    pub min: i64,
    pub max: i64,
}

impl IntRange {
    pub fn new(min: i64, max: i64) -> Self {
        Self { min, max }
    }

    /// Checks `min <= value <= max`.
    pub fn contains(&self, value: i64) -> bool {
        (self.min..=self.max).contains(&value)
    }
}

/// One allowed value of an enum parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EnumVal {
    /// Value sent on the wire.
    pub key: String,
    /// Display label.
    pub label: String,
}

impl EnumVal {
    pub fn new(key: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
        }
    }
}

/// Parameter kind, without its constraint metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParameterType {
    Text,
    Enum,
    Float,
    RangedFloat,
    Int,
    RangedInt,
}

impl ParameterType {
    /// Returns the parameter type as it appears on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            ParameterType::Text => "text",
            ParameterType::Enum => "enum",
            ParameterType::Float => "float",
            ParameterType::RangedFloat => "ranged_float",
            ParameterType::Int => "int",
            ParameterType::RangedInt => "ranged_int",
        }
    }
}

impl std::fmt::Display for ParameterType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Describes the accepted values of one parameter, with its default.
///
/// Tagged on the wire by `parameter_type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "parameter_type", rename_all = "snake_case", deny_unknown_fields)]
pub enum ParameterDescriptor {
    /// Free-form text.
    Text {
        #[serde(default)]
        default: Option<String>,
    },
    /// One of a fixed list of keys.
    Enum {
        enum_vals: Vec<EnumVal>,
        /// UI hint shown when `enum_vals` is empty.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message_when_empty: Option<String>,
        #[serde(default)]
        default: Option<String>,
    },
    /// Any float.
    Float {
        #[serde(default)]
        default: Option<f64>,
    },
    /// A float within inclusive bounds.
    RangedFloat {
        range: FloatRange,
        #[serde(default)]
        default: Option<f64>,
    },
    /// Any integer.
    Int {
        #[serde(default)]
        default: Option<i64>,
    },
    /// An integer within inclusive bounds.
    RangedInt {
        range: IntRange,
        #[serde(default)]
        default: Option<i64>,
    },
}

impl ParameterDescriptor {
    pub fn text(default: Option<&str>) -> Self {
        ParameterDescriptor::Text {
            default: default.map(str::to_string),
        }
    }

    pub fn enumeration(enum_vals: Vec<EnumVal>, default: Option<&str>) -> Self {
        ParameterDescriptor::Enum {
            enum_vals,
            message_when_empty: None,
            default: default.map(str::to_string),
        }
    }

    pub fn float(default: Option<f64>) -> Self {
        ParameterDescriptor::Float { default }
    }

    pub fn ranged_float(min: f64, max: f64, default: Option<f64>) -> Self {
        ParameterDescriptor::RangedFloat {
            range: FloatRange::new(min, max),
            default,
        }
    }

    pub fn int(default: Option<i64>) -> Self {
        ParameterDescriptor::Int { default }
    }

    pub fn ranged_int(min: i64, max: i64, default: Option<i64>) -> Self {
        ParameterDescriptor::RangedInt {
            range: IntRange::new(min, max),
            default,
        }
    }

    /// Returns the kind of this descriptor.
    pub fn parameter_type(&self) -> ParameterType {
        match self {
            ParameterDescriptor::Text { .. } => ParameterType::Text,
            ParameterDescriptor::Enum { .. } => ParameterType::Enum,
            ParameterDescriptor::Float { .. } => ParameterType::Float,
            ParameterDescriptor::RangedFloat { .. } => ParameterType::RangedFloat,
            ParameterDescriptor::Int { .. } => ParameterType::Int,
            ParameterDescriptor::RangedInt { .. } => ParameterType::RangedInt,
        }
    }

    /// Returns the declared default as a typed value, if any.
    pub fn default_value(&self) -> Option<ParameterValue> {
        match self {
            ParameterDescriptor::Text { default } => default.clone().map(ParameterValue::Text),
            ParameterDescriptor::Enum { default, .. } => default.clone().map(ParameterValue::Enum),
            ParameterDescriptor::Float { default } => default.map(ParameterValue::Float),
            ParameterDescriptor::RangedFloat { default, .. } => {
                default.map(ParameterValue::RangedFloat)
            }
            ParameterDescriptor::Int { default } => default.map(ParameterValue::Int),
            ParameterDescriptor::RangedInt { default, .. } => default.map(ParameterValue::RangedInt),
        }
    }

    /// Returns the allowed enum keys; empty for other kinds.
    pub fn enum_keys(&self) -> Vec<&str> {
        match self {
            ParameterDescriptor::Enum { enum_vals, .. } => {
                enum_vals.iter().map(|v| v.key.as_str()).collect()
            }
            _ => Vec::new(),
        }
    }
}

/// Scalar kind of a parameter declared without a schema.
///
/// Used by [`HandlerShape`](crate::registry::HandlerShape) for endpoints
/// that only declare key names and scalar types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    Text,
    Int,
    Float,
}

impl ScalarKind {
    /// Builds an unconstrained descriptor without default.
    pub fn descriptor(self) -> ParameterDescriptor {
        match self {
            ScalarKind::Text => ParameterDescriptor::text(None),
            ScalarKind::Int => ParameterDescriptor::int(None),
            ScalarKind::Float => ParameterDescriptor::float(None),
        }
    }
}

/// A decoded parameter value.
///
/// The variant mirrors the descriptor kind; constraints (range, allowed
/// values) have already been checked when a value of this type exists.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ParameterValue {
    Text(String),
    Enum(String),
    Float(f64),
    RangedFloat(f64),
    Int(i64),
    RangedInt(i64),
}

impl ParameterValue {
    /// Returns the kind this value was decoded as.
    pub fn parameter_type(&self) -> ParameterType {
        match self {
            ParameterValue::Text(_) => ParameterType::Text,
            ParameterValue::Enum(_) => ParameterType::Enum,
            ParameterValue::Float(_) => ParameterType::Float,
            ParameterValue::RangedFloat(_) => ParameterType::RangedFloat,
            ParameterValue::Int(_) => ParameterType::Int,
            ParameterValue::RangedInt(_) => ParameterType::RangedInt,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ParameterValue::Text(s) | ParameterValue::Enum(s) => Some(s),
            _ => None,
        }
    }

    /// Float view; integer kinds widen.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ParameterValue::Float(v) | ParameterValue::RangedFloat(v) => Some(*v),
            ParameterValue::Int(v) | ParameterValue::RangedInt(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ParameterValue::Int(v) | ParameterValue::RangedInt(v) => Some(*v),
            _ => None,
        }
    }

    /// Converts the value back into its wire form.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            ParameterValue::Text(s) | ParameterValue::Enum(s) => serde_json::Value::from(s.as_str()),
            ParameterValue::Float(v) | ParameterValue::RangedFloat(v) => serde_json::Value::from(*v),
            ParameterValue::Int(v) | ParameterValue::RangedInt(v) => serde_json::Value::from(*v),
        }
    }
}

/// Decoded parameters keyed by schema key, in schema order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ParameterValues(IndexMap<String, ParameterValue>);

impl ParameterValues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: ParameterValue) {
        self.0.insert(key.into(), value);
    }

    pub fn get(&self, key: &str) -> Option<&ParameterValue> {
        self.0.get(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParameterValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn str(&self, key: &str) -> Option<&str> {
        self.get(key)?.as_str()
    }

    pub fn f64(&self, key: &str) -> Option<f64> {
        self.get(key)?.as_f64()
    }

    pub fn i64(&self, key: &str) -> Option<i64> {
        self.get(key)?.as_i64()
    }
}

impl FromIterator<(String, ParameterValue)> for ParameterValues {
    fn from_iter<T: IntoIterator<Item = (String, ParameterValue)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_descriptor_wire_format() {
        let descriptor = ParameterDescriptor::ranged_float(0.0, 1.0, Some(0.5));
        assert_eq!(
            serde_json::to_value(&descriptor).unwrap(),
            json!({
                "parameter_type": "ranged_float",
                "range": {"min": 0.0, "max": 1.0},
                "default": 0.5
            })
        );

        let descriptor = ParameterDescriptor::enumeration(
            vec![EnumVal::new("upper", "UPPER"), EnumVal::new("lower", "LOWER")],
            Some("upper"),
        );
        assert_eq!(
            serde_json::to_value(&descriptor).unwrap(),
            json!({
                "parameter_type": "enum",
                "enum_vals": [
                    {"key": "upper", "label": "UPPER"},
                    {"key": "lower", "label": "LOWER"}
                ],
                "default": "upper"
            })
        );
    }

    #[test]
    fn test_descriptor_parses_without_default() {
        let descriptor: ParameterDescriptor =
            serde_json::from_value(json!({"parameter_type": "ranged_int", "range": {"min": 1, "max": 3}}))
                .unwrap();
        assert_eq!(descriptor, ParameterDescriptor::ranged_int(1, 3, None));
        assert_eq!(descriptor.default_value(), None);
    }

    #[test]
    fn test_range_bounds_are_inclusive() {
        let range = FloatRange::new(0.0, 1.0);
        assert!(range.contains(0.0));
        assert!(range.contains(1.0));
        assert!(!range.contains(1.000_001));

        let range = IntRange::new(-2, 2);
        assert!(range.contains(-2));
        assert!(range.contains(2));
        assert!(!range.contains(3));
    }

    #[test]
    fn test_parameter_value_views() {
        assert_eq!(ParameterValue::RangedInt(4).as_f64(), Some(4.0));
        assert_eq!(ParameterValue::Float(0.5).as_i64(), None);
        assert_eq!(ParameterValue::Enum("upper".into()).as_str(), Some("upper"));
        assert_eq!(ParameterValue::RangedFloat(0.25).to_json(), json!(0.25));
    }

    #[test]
    fn test_parameter_values_serialize_as_scalars() {
        let values: ParameterValues = [
            ("to_case".to_string(), ParameterValue::Enum("lower".into())),
            ("k".to_string(), ParameterValue::Int(3)),
        ]
        .into_iter()
        .collect();
        assert_eq!(
            serde_json::to_value(&values).unwrap(),
            json!({"to_case": "lower", "k": 3})
        );
        assert_eq!(values.str("to_case"), Some("lower"));
        assert_eq!(values.i64("k"), Some(3));
    }
}
