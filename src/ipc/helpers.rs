use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;

use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use crate::wizard::WizardSession;

/// Inner handler fns return `Ok(result payload)` or a finished error
/// envelope; this folds both into the wire response.
pub fn respond(id: &str, outcome: Result<JsonValue, JsonValue>) -> JsonValue {
    match outcome {
        Ok(result) => ok(id, result),
        Err(resp) => resp,
    }
}

pub fn session_mut<'a>(
    state: &'a mut AppState,
    req: &Request,
) -> Result<&'a mut WizardSession, JsonValue> {
    state
        .session
        .as_mut()
        .ok_or_else(|| err(&req.id, "no_session", "open a session first", None))
}

pub fn required_str(req: &Request, key: &str) -> Result<String, JsonValue> {
    req.params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|v| v.trim().to_string())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| err(&req.id, "bad_params", format!("missing {}", key), None))
}

pub fn opt_str(req: &Request, key: &str) -> Option<String> {
    req.params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
}

/// Required typed field, deserialized with serde so the shape check lives
/// in one place instead of scattered optional-chaining.
pub fn required_field<T: DeserializeOwned>(req: &Request, key: &str) -> Result<T, JsonValue> {
    let raw = req
        .params
        .get(key)
        .cloned()
        .ok_or_else(|| err(&req.id, "bad_params", format!("missing {}", key), None))?;
    serde_json::from_value(raw)
        .map_err(|e| err(&req.id, "bad_params", format!("{}: {}", key, e), None))
}

/// Typed field that may be absent; an absent or null value becomes the
/// type's default.
pub fn default_field<T: DeserializeOwned + Default>(
    req: &Request,
    key: &str,
) -> Result<T, JsonValue> {
    match req.params.get(key) {
        None => Ok(T::default()),
        Some(v) if v.is_null() => Ok(T::default()),
        Some(v) => serde_json::from_value(v.clone())
            .map_err(|e| err(&req.id, "bad_params", format!("{}: {}", key, e), None)),
    }
}
