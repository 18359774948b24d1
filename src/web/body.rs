use serde_json::{Map, Value};

/// Parse a request body that must be a JSON object. Returns `None` for
/// unparseable input and for any other JSON value.
pub fn json_object(body: &[u8]) -> Option<Map<String, Value>> {
    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(map)) => Some(map),
        _ => None,
    }
}
