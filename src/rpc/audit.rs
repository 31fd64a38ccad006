//! Redaction of call parameters before they reach the audit log

use serde_json::Value;

pub fn redact_audit_params(params: &[Value]) -> Value {
    Value::Array(params.iter().map(redact_audit_value).collect())
}

pub fn redact_audit_value(value: &Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(key, item)| {
                    if is_sensitive_key(key) {
                        (key.clone(), Value::String("[REDACTED]".to_string()))
                    } else {
                        (key.clone(), redact_audit_value(item))
                    }
                })
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(redact_audit_value).collect()),
        _ => value.clone(),
    }
}

pub fn is_sensitive_key(key: &str) -> bool {
    let normalized = key.trim().to_ascii_lowercase();
    ["token", "secret", "password", "credential", "authorization", "api_key", "apikey"]
        .iter()
        .any(|marker| normalized.contains(marker))
}
