use serde_json::{json, Value as JsonValue};

use crate::edit::{EditAction, MetadataPatch};
use crate::ipc::error::engine_err;
use crate::ipc::helpers::{required_field, respond, session_mut};
use crate::ipc::types::{AppState, Request};
use crate::model::StagedFile;

fn get(state: &mut AppState, req: &Request) -> Result<JsonValue, JsonValue> {
    let session = session_mut(state, req)?;
    Ok(json!({
        "state": session.state().name(),
        "intent": session.intent().name(),
        "courseId": session.course_id(),
        "categories": session.categories(),
        "course": session.tree(),
    }))
}

fn metadata_update(state: &mut AppState, req: &Request) -> Result<JsonValue, JsonValue> {
    let patch: MetadataPatch = required_field(req, "patch")?;
    let session = session_mut(state, req)?;
    session
        .apply(EditAction::UpdateMetadata(patch))
        .map_err(|e| engine_err(&req.id, &e))?;
    Ok(json!({ "ok": true }))
}

fn thumbnail_set(state: &mut AppState, req: &Request) -> Result<JsonValue, JsonValue> {
    let file: StagedFile = required_field(req, "file")?;
    let session = session_mut(state, req)?;
    let outcome = session
        .apply(EditAction::SetThumbnail(file))
        .map_err(|e| engine_err(&req.id, &e))?;
    Ok(json!({
        "attachmentId": outcome.staged.first().map(|s| s.attachment_id.clone()),
        "releasedPreviews": outcome.released_previews,
    }))
}

fn thumbnail_clear(state: &mut AppState, req: &Request) -> Result<JsonValue, JsonValue> {
    let session = session_mut(state, req)?;
    let outcome = session
        .apply(EditAction::ClearThumbnail)
        .map_err(|e| engine_err(&req.id, &e))?;
    Ok(json!({ "releasedPreviews": outcome.released_previews }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "course.get" => Some(respond(&req.id, get(state, req))),
        "course.metadata.update" => Some(respond(&req.id, metadata_update(state, req))),
        "course.thumbnail.set" => Some(respond(&req.id, thumbnail_set(state, req))),
        "course.thumbnail.clear" => Some(respond(&req.id, thumbnail_clear(state, req))),
        _ => None,
    }
}
