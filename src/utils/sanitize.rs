use serde_json::Value as JsonValue;

/// Strip HTML tags from a string and trim surrounding whitespace.
pub fn sanitize_text(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut in_tag = false;
    for ch in input.chars() {
        match ch {
            '<' => in_tag = true,
            '>' => in_tag = false,
            c if !in_tag => out.push(c),
            _ => {}
        }
    }
    out.trim().to_string()
}

/// Recursively sanitize every string in a JSON payload, except values under
/// keys in `skip` (rich-text fields rendered as HTML later).
pub fn sanitize_recursive(value: &mut JsonValue, skip: &[&str]) {
    match value {
        JsonValue::String(s) => *s = sanitize_text(s),
        JsonValue::Array(items) => {
            for item in items {
                sanitize_recursive(item, skip);
            }
        }
        JsonValue::Object(map) => {
            for (key, item) in map.iter_mut() {
                if skip.contains(&key.as_str()) {
                    continue;
                }
                sanitize_recursive(item, skip);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn strips_tags_and_trims() {
        assert_eq!(sanitize_text("  <b>hello</b> world "), "hello world");
        assert_eq!(sanitize_text("<script>alert(1)</script>"), "alert(1)");
        assert_eq!(sanitize_text("plain"), "plain");
    }

    #[test]
    fn skips_listed_keys() {
        let mut payload = json!({
            "first_name": "<i>Jane</i>",
            "cover_letter": "<p>Dear team,</p>",
            "fields": { "linkedin": "<a>in/jane</a>" }
        });
        sanitize_recursive(&mut payload, &["cover_letter"]);
        assert_eq!(payload["first_name"], "Jane");
        assert_eq!(payload["cover_letter"], "<p>Dear team,</p>");
        assert_eq!(payload["fields"]["linkedin"], "in/jane");
    }

    #[test]
    fn walks_arrays() {
        let mut payload = json!(["<b>a</b>", { "x": "<u>b</u>" }]);
        sanitize_recursive(&mut payload, &[]);
        assert_eq!(payload, json!(["a", { "x": "b" }]));
    }
}
