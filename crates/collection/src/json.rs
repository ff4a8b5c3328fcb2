//! Conversions between `Value` and JSON.

use serde_json::{Number, Value as Json};
use sift_core::{Error, Result, Value};

/// Converts a value to JSON. Non-finite floats become `null`.
pub fn value_to_json(value: &Value) -> Json {
    match value {
        Value::Null => Json::Null,
        Value::Boolean(b) => Json::Bool(*b),
        Value::Int64(i) => Json::from(*i),
        Value::Float64(f) => Number::from_f64(*f).map(Json::Number).unwrap_or(Json::Null),
        Value::String(s) => Json::String(s.clone()),
    }
}

/// Converts scalar JSON to a value.
pub fn json_to_value(json: &Json) -> Result<Value> {
    match json {
        Json::Null => Ok(Value::Null),
        Json::Bool(b) => Ok(Value::Boolean(*b)),
        Json::Number(n) => n
            .as_i64()
            .map(Value::Int64)
            .or_else(|| n.as_f64().map(Value::Float64))
            .ok_or_else(|| Error::invalid_operation(format!("unrepresentable number {}", n))),
        Json::String(s) => Ok(Value::String(s.clone())),
        Json::Array(_) | Json::Object(_) => Err(Error::invalid_operation(
            "attributes must be scalars",
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_scalars() {
        assert_eq!(value_to_json(&Value::Int64(3)), json!(3));
        assert_eq!(value_to_json(&Value::from("x")), json!("x"));
        assert_eq!(value_to_json(&Value::Float64(f64::NAN)), Json::Null);
        assert_eq!(json_to_value(&json!(2.5)).unwrap(), Value::Float64(2.5));
        assert_eq!(json_to_value(&json!(true)).unwrap(), Value::Boolean(true));
    }

    #[test]
    fn test_nested_rejected() {
        assert!(json_to_value(&json!({ "a": 1 })).is_err());
        assert!(json_to_value(&json!([1])).is_err());
    }
}
