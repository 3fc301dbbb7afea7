use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde_json::Value;

pub const RETRY_HEADER: &str = "x-slack-retry-num";
pub const SIGNATURE_HEADER: &str = "X-Slack-Signature";
pub const TIMESTAMP_HEADER: &str = "X-Slack-Request-Timestamp";

pub fn v_path<'a>(root: &'a Value, path: &[&str]) -> Option<&'a Value> {
    let mut cur = root;
    for key in path {
        cur = cur.get(*key)?;
    }
    Some(cur)
}

pub fn v_str<'a>(root: &'a Value, path: &[&str]) -> Option<&'a str> {
    v_path(root, path).and_then(|v| v.as_str())
}

/// Header lookup by name, falling back to a case-insensitive match.
pub fn get_header_value<'a>(headers: &'a Value, name: &str) -> Option<&'a Value> {
    if let Some(v) = headers.get(name) {
        return Some(v);
    }
    headers
        .as_object()
        .and_then(|map| map.iter().find(|(k, _)| k.eq_ignore_ascii_case(name)))
        .map(|(_, v)| v)
}

pub fn get_header_str<'a>(headers: &'a Value, name: &str) -> Option<&'a str> {
    get_header_value(headers, name).and_then(Value::as_str)
}

/// The retry counter Slack attaches to redeliveries, if present.
#[must_use]
pub fn retry_num(event: &Value) -> Option<&Value> {
    event
        .get("headers")
        .and_then(|headers| get_header_value(headers, RETRY_HEADER))
}

/// Text of the envelope's `body`, base64-decoded when API Gateway flagged it.
///
/// # Errors
///
/// Returns a description of the problem if the body is not a string, is not
/// valid base64, or does not decode to UTF-8.
pub fn body_text(event: &Value, body: &Value) -> Result<String, String> {
    let Some(raw) = body.as_str() else {
        return Err("body is not a string".to_string());
    };

    let encoded = event
        .get("isBase64Encoded")
        .and_then(Value::as_bool)
        .unwrap_or(false);
    if !encoded {
        return Ok(raw.to_string());
    }

    let bytes = STANDARD
        .decode(raw.trim())
        .map_err(|e| format!("invalid base64 body: {e}"))?;
    String::from_utf8(bytes).map_err(|e| format!("body is not UTF-8: {e}"))
}
