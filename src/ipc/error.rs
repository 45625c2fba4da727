use serde_json::json;

use crate::edit::EditError;
use crate::wizard::WizardError;

pub fn ok(id: &str, result: serde_json::Value) -> serde_json::Value {
    json!({
        "id": id,
        "ok": true,
        "result": result
    })
}

pub fn err(
    id: &str,
    code: &str,
    message: impl Into<String>,
    details: Option<serde_json::Value>,
) -> serde_json::Value {
    let mut error = json!({
        "code": code,
        "message": message.into(),
    });
    if let Some(d) = details {
        error["details"] = d;
    }
    json!({
        "id": id,
        "ok": false,
        "error": error,
    })
}

/// Engine failures mapped to wire codes. Validation outcomes never come
/// through here; they are data in an `ok` result.
pub fn engine_err(id: &str, e: &WizardError) -> serde_json::Value {
    let code = match e {
        WizardError::BadState(_) => "bad_state",
        WizardError::Edit(EditError::BadOrder(_)) => "bad_params",
        WizardError::Edit(_) => "not_found",
        WizardError::Translate(_) => "invalid_tree",
    };
    err(id, code, e.to_string(), None)
}
