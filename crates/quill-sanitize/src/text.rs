use serde_json::Value;
use url::Url;

/// Escape markup-significant characters in free text.
pub fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

/// Escape an optional field, collapsing blank values to `None`.
pub fn escape_opt(text: Option<&str>) -> Option<String> {
    text.filter(|t| !t.trim().is_empty()).map(escape_text)
}

/// Keep a URL only if it parses and uses `http` or `https`.
pub fn sanitize_url(raw: Option<&str>) -> Option<String> {
    let raw = raw?.trim();
    if raw.is_empty() {
        return None;
    }
    match Url::parse(raw) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => Some(raw.to_string()),
        _ => None,
    }
}

/// JSON truthiness, as form toolkits encode checkboxes.
pub fn truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(_)) | Some(Value::Object(_)) => true,
    }
}
