use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Declared shape of one custom application-form field. Jobs carry a list of
/// these in their `field_schema` column; submitted values are checked against
/// it before anything is written.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldSpec {
    pub key: String,
    #[serde(rename = "type")]
    pub kind: FieldKind,
    #[serde(default)]
    pub required: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Text,
    RichText,
    Email,
    Phone,
    Number,
    Options,
    Attachment,
}

/// A submitted value, tagged by kind so storage stays typed rather than
/// free-form EAV rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum FieldValue {
    Text(String),
    RichText(String),
    Email(String),
    Phone(String),
    Number(f64),
    Options(Vec<String>),
    Attachment { file_name: String, url: String },
}

impl FieldValue {
    /// Coerce a raw JSON payload value into the kind the schema declares.
    pub fn from_raw(kind: FieldKind, raw: &JsonValue) -> Option<FieldValue> {
        match kind {
            FieldKind::Text => raw.as_str().map(|s| FieldValue::Text(s.to_string())),
            FieldKind::RichText => raw.as_str().map(|s| FieldValue::RichText(s.to_string())),
            FieldKind::Email => raw.as_str().map(|s| FieldValue::Email(s.to_string())),
            FieldKind::Phone => raw.as_str().map(|s| FieldValue::Phone(s.to_string())),
            FieldKind::Number => raw.as_f64().map(FieldValue::Number),
            FieldKind::Options => raw.as_array().map(|items| {
                FieldValue::Options(
                    items
                        .iter()
                        .filter_map(|v| v.as_str().map(str::to_string))
                        .collect(),
                )
            }),
            // Attachments arrive through the upload action, never inline.
            FieldKind::Attachment => None,
        }
    }
}

/// Validate submitted values against the job's declared fields. Unknown keys
/// are rejected; attachment fields are expected to arrive later via upload and
/// are not required at submission time.
pub fn validate_values(
    schema: &[FieldSpec],
    raw: &serde_json::Map<String, JsonValue>,
) -> Result<Vec<(String, FieldValue)>, String> {
    let mut out = Vec::with_capacity(raw.len());

    for (key, value) in raw {
        let spec = schema
            .iter()
            .find(|s| &s.key == key)
            .ok_or_else(|| format!("Unknown field: {}", key))?;
        let typed = FieldValue::from_raw(spec.kind, value)
            .ok_or_else(|| format!("Invalid value for field: {}", key))?;
        out.push((key.clone(), typed));
    }

    for spec in schema {
        if spec.required && spec.kind != FieldKind::Attachment && !raw.contains_key(&spec.key) {
            return Err(format!("Missing required field: {}", spec.key));
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn schema() -> Vec<FieldSpec> {
        serde_json::from_value(json!([
            { "key": "linkedin", "type": "text", "required": false },
            { "key": "expected_salary", "type": "number", "required": true },
            { "key": "resume", "type": "attachment", "required": true }
        ]))
        .unwrap()
    }

    #[test]
    fn accepts_values_matching_schema() {
        let raw = json!({ "linkedin": "in/someone", "expected_salary": 90000 });
        let values = validate_values(&schema(), raw.as_object().unwrap()).unwrap();
        assert_eq!(values.len(), 2);
        assert_eq!(
            values.iter().find(|(k, _)| k == "expected_salary").unwrap().1,
            FieldValue::Number(90000.0)
        );
    }

    #[test]
    fn rejects_unknown_key() {
        let raw = json!({ "github": "someone" });
        let err = validate_values(&schema(), raw.as_object().unwrap()).unwrap_err();
        assert!(err.contains("Unknown field"));
    }

    #[test]
    fn rejects_wrong_type() {
        let raw = json!({ "expected_salary": "a lot" });
        let err = validate_values(&schema(), raw.as_object().unwrap()).unwrap_err();
        assert!(err.contains("Invalid value"));
    }

    #[test]
    fn missing_required_attachment_is_not_an_error_at_submit() {
        let raw = json!({ "expected_salary": 50000 });
        assert!(validate_values(&schema(), raw.as_object().unwrap()).is_ok());
    }

    #[test]
    fn missing_required_non_attachment_is_an_error() {
        let raw = json!({ "linkedin": "in/x" });
        let err = validate_values(&schema(), raw.as_object().unwrap()).unwrap_err();
        assert!(err.contains("expected_salary"));
    }
}
