use serde::Deserialize;
use serde_json::Value as JsonValue;

#[derive(Debug, Clone, Deserialize)]
pub struct SaveSettingsPayload {
    pub settings: serde_json::Map<String, JsonValue>,
}
