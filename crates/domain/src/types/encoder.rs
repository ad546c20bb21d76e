//! JSON body encoding

use std::sync::Arc;

use serde_json::Value;

/// Turns a request's JSON value into the body text
pub type JsonEncoder = Arc<dyn Fn(&Value) -> Result<String, serde_json::Error> + Send + Sync>;

/// Compact `serde_json` encoding.
///
/// Values reach the encoder already converted to [`Value`], where UUIDs are
/// their canonical hyphenated string.
pub fn default_json_encoder() -> JsonEncoder {
    Arc::new(|value: &Value| serde_json::to_string(value))
}
