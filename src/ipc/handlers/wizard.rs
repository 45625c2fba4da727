use serde_json::{json, Value as JsonValue};
use tracing::warn;

use crate::ipc::error::{engine_err, err};
use crate::ipc::helpers::{opt_str, required_str, respond, session_mut};
use crate::ipc::types::{AppState, Request};
use crate::validate::Step;
use crate::wizard::{StepOutcome, SubmitOutcome};

fn state(state: &mut AppState, req: &Request) -> Result<JsonValue, JsonValue> {
    let session = session_mut(state, req)?;
    Ok(json!({
        "state": session.state().name(),
        "intent": session.intent().name(),
        "courseId": session.course_id(),
    }))
}

/// On-demand validation for live feedback; no state change either way.
fn validate(state: &mut AppState, req: &Request) -> Result<JsonValue, JsonValue> {
    let step = match required_str(req, "step")?.as_str() {
        "metadata" => Step::Metadata,
        "structure" => Step::Structure,
        other => {
            return Err(err(
                &req.id,
                "bad_params",
                format!("unknown step: {}", other),
                None,
            ))
        }
    };
    let session = session_mut(state, req)?;
    let report = session.validate_step(step);
    Ok(json!({
        "valid": report.valid,
        "fieldErrors": report.field_errors,
    }))
}

fn advance(state: &mut AppState, req: &Request) -> Result<JsonValue, JsonValue> {
    let session = session_mut(state, req)?;
    match session.advance().map_err(|e| engine_err(&req.id, &e))? {
        StepOutcome::Advanced(next) => Ok(json!({
            "advanced": true,
            "state": next.name(),
        })),
        StepOutcome::Rejected(report) => Ok(json!({
            "advanced": false,
            "state": session.state().name(),
            "valid": false,
            "fieldErrors": report.field_errors,
        })),
    }
}

fn back(state: &mut AppState, req: &Request) -> Result<JsonValue, JsonValue> {
    let session = session_mut(state, req)?;
    let next = session.back().map_err(|e| engine_err(&req.id, &e))?;
    Ok(json!({ "state": next.name() }))
}

fn submit(state: &mut AppState, req: &Request) -> Result<JsonValue, JsonValue> {
    let session = session_mut(state, req)?;
    match session.begin_submit().map_err(|e| engine_err(&req.id, &e))? {
        SubmitOutcome::Started(request) => Ok(json!({
            "started": true,
            "state": session.state().name(),
            "intent": request.intent.name(),
            "courseId": request.course_id,
            "payload": request.payload,
        })),
        SubmitOutcome::Rejected(report) => Ok(json!({
            "started": false,
            "state": session.state().name(),
            "valid": false,
            "fieldErrors": report.field_errors,
        })),
    }
}

fn resolve_submit(state: &mut AppState, req: &Request) -> Result<JsonValue, JsonValue> {
    let submitted_ok = req
        .params
        .get("ok")
        .and_then(|v| v.as_bool())
        .ok_or_else(|| err(&req.id, "bad_params", "missing ok", None))?;
    let message = opt_str(req, "message");
    let session = session_mut(state, req)?;
    let resolution = session
        .resolve_submit(submitted_ok)
        .map_err(|e| engine_err(&req.id, &e))?;
    if !submitted_ok {
        warn!(reason = message.as_deref().unwrap_or(""), "submission failed");
    }
    Ok(json!({
        "state": resolution.state.name(),
        "releasedPreviews": resolution.released_previews,
    }))
}

fn cancel(state: &mut AppState, req: &Request) -> Result<JsonValue, JsonValue> {
    let session = session_mut(state, req)?;
    let released = session.cancel();
    Ok(json!({
        "state": session.state().name(),
        "releasedPreviews": released,
    }))
}

pub fn try_handle(state_ref: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "wizard.state" => Some(respond(&req.id, state(state_ref, req))),
        "wizard.validate" => Some(respond(&req.id, validate(state_ref, req))),
        "wizard.advance" => Some(respond(&req.id, advance(state_ref, req))),
        "wizard.back" => Some(respond(&req.id, back(state_ref, req))),
        "wizard.submit" => Some(respond(&req.id, submit(state_ref, req))),
        "wizard.resolveSubmit" => Some(respond(&req.id, resolve_submit(state_ref, req))),
        "wizard.cancel" => Some(respond(&req.id, cancel(state_ref, req))),
        _ => None,
    }
}
