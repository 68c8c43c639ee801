//! Point value models

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Dynamic type of a value returned by a device driver.
///
/// Serialized with the names driver-side tooling already uses, so clients can
/// tell numbers, strings and booleans apart without guessing from JSON.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValueType {
    #[serde(rename = "NoneType")]
    None,
    #[serde(rename = "bool")]
    Bool,
    #[serde(rename = "int")]
    Int,
    #[serde(rename = "float")]
    Float,
    #[serde(rename = "str")]
    Str,
    #[serde(rename = "list")]
    List,
    #[serde(rename = "dict")]
    Dict,
}

impl ValueType {
    /// Type tag of a JSON value
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Null => ValueType::None,
            Value::Bool(_) => ValueType::Bool,
            Value::Number(n) if n.is_f64() => ValueType::Float,
            Value::Number(_) => ValueType::Int,
            Value::String(_) => ValueType::Str,
            Value::Array(_) => ValueType::List,
            Value::Object(_) => ValueType::Dict,
        }
    }
}

/// Envelope returned for point reads and writes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointValue {
    /// Value as returned by the driver
    pub value: Value,
    /// Dynamic type of `value`
    #[serde(rename = "type")]
    pub value_type: ValueType,
}

impl From<Value> for PointValue {
    fn from(value: Value) -> Self {
        let value_type = ValueType::of(&value);
        Self { value, value_type }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn type_tags() {
        assert_eq!(ValueType::of(&json!(72)), ValueType::Int);
        assert_eq!(ValueType::of(&json!(-3)), ValueType::Int);
        assert_eq!(ValueType::of(&json!(72.5)), ValueType::Float);
        assert_eq!(ValueType::of(&json!("on")), ValueType::Str);
        assert_eq!(ValueType::of(&json!(true)), ValueType::Bool);
        assert_eq!(ValueType::of(&json!(null)), ValueType::None);
        assert_eq!(ValueType::of(&json!([1, 2])), ValueType::List);
        assert_eq!(ValueType::of(&json!({"a": 1})), ValueType::Dict);
    }

    #[test]
    fn envelope_shape() {
        let point = PointValue::from(json!(21.5));
        assert_eq!(
            serde_json::to_value(&point).unwrap(),
            json!({"value": 21.5, "type": "float"})
        );

        let point = PointValue::from(json!(null));
        assert_eq!(
            serde_json::to_value(&point).unwrap(),
            json!({"value": null, "type": "NoneType"})
        );
    }
}
