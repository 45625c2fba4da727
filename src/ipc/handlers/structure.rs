use serde_json::{json, Value as JsonValue};

use crate::edit::{EditAction, NodePatch};
use crate::ipc::error::engine_err;
use crate::ipc::helpers::{opt_str, required_field, required_str, respond, session_mut};
use crate::ipc::types::{AppState, Request};
use crate::model::{AttachmentKind, StagedFile};

fn chapter_add(state: &mut AppState, req: &Request) -> Result<JsonValue, JsonValue> {
    let title = opt_str(req, "title").unwrap_or_default();
    let description = opt_str(req, "description").unwrap_or_default();
    let session = session_mut(state, req)?;
    let outcome = session
        .apply(EditAction::AddChapter { title, description })
        .map_err(|e| engine_err(&req.id, &e))?;
    Ok(json!({ "chapterId": outcome.created_id }))
}

fn chapter_update(state: &mut AppState, req: &Request) -> Result<JsonValue, JsonValue> {
    let chapter_id = required_str(req, "chapterId")?;
    let patch: NodePatch = required_field(req, "patch")?;
    let session = session_mut(state, req)?;
    session
        .apply(EditAction::UpdateChapter { chapter_id, patch })
        .map_err(|e| engine_err(&req.id, &e))?;
    Ok(json!({ "ok": true }))
}

fn chapter_remove(state: &mut AppState, req: &Request) -> Result<JsonValue, JsonValue> {
    let chapter_id = required_str(req, "chapterId")?;
    let session = session_mut(state, req)?;
    let outcome = session
        .apply(EditAction::RemoveChapter { chapter_id })
        .map_err(|e| engine_err(&req.id, &e))?;
    Ok(json!({ "releasedPreviews": outcome.released_previews }))
}

fn chapter_reorder(state: &mut AppState, req: &Request) -> Result<JsonValue, JsonValue> {
    let order: Vec<String> = required_field(req, "chapterIdOrder")?;
    let session = session_mut(state, req)?;
    session
        .apply(EditAction::ReorderChapters { order })
        .map_err(|e| engine_err(&req.id, &e))?;
    Ok(json!({ "ok": true }))
}

fn lesson_add(state: &mut AppState, req: &Request) -> Result<JsonValue, JsonValue> {
    let chapter_id = required_str(req, "chapterId")?;
    let title = opt_str(req, "title").unwrap_or_default();
    let description = opt_str(req, "description").unwrap_or_default();
    let session = session_mut(state, req)?;
    let outcome = session
        .apply(EditAction::AddLesson {
            chapter_id,
            title,
            description,
        })
        .map_err(|e| engine_err(&req.id, &e))?;
    Ok(json!({ "lessonId": outcome.created_id }))
}

fn lesson_update(state: &mut AppState, req: &Request) -> Result<JsonValue, JsonValue> {
    let lesson_id = required_str(req, "lessonId")?;
    let patch: NodePatch = required_field(req, "patch")?;
    let session = session_mut(state, req)?;
    session
        .apply(EditAction::UpdateLesson { lesson_id, patch })
        .map_err(|e| engine_err(&req.id, &e))?;
    Ok(json!({ "ok": true }))
}

fn lesson_remove(state: &mut AppState, req: &Request) -> Result<JsonValue, JsonValue> {
    let lesson_id = required_str(req, "lessonId")?;
    let session = session_mut(state, req)?;
    let outcome = session
        .apply(EditAction::RemoveLesson { lesson_id })
        .map_err(|e| engine_err(&req.id, &e))?;
    Ok(json!({ "releasedPreviews": outcome.released_previews }))
}

fn lesson_reorder(state: &mut AppState, req: &Request) -> Result<JsonValue, JsonValue> {
    let chapter_id = required_str(req, "chapterId")?;
    let order: Vec<String> = required_field(req, "lessonIdOrder")?;
    let session = session_mut(state, req)?;
    session
        .apply(EditAction::ReorderLessons { chapter_id, order })
        .map_err(|e| engine_err(&req.id, &e))?;
    Ok(json!({ "ok": true }))
}

fn attachments_add(state: &mut AppState, req: &Request) -> Result<JsonValue, JsonValue> {
    let lesson_id = required_str(req, "lessonId")?;
    let kind: AttachmentKind = required_field(req, "kind")?;
    let files: Vec<StagedFile> = required_field(req, "files")?;
    let session = session_mut(state, req)?;
    let outcome = session
        .apply(EditAction::AddAttachments {
            lesson_id,
            kind,
            files,
        })
        .map_err(|e| engine_err(&req.id, &e))?;
    Ok(json!({
        "staged": outcome.staged,
        "rejected": outcome.rejected,
    }))
}

fn attachments_remove(state: &mut AppState, req: &Request) -> Result<JsonValue, JsonValue> {
    let lesson_id = required_str(req, "lessonId")?;
    let attachment_id = required_str(req, "attachmentId")?;
    let session = session_mut(state, req)?;
    let outcome = session
        .apply(EditAction::RemoveAttachment {
            lesson_id,
            attachment_id,
        })
        .map_err(|e| engine_err(&req.id, &e))?;
    Ok(json!({ "releasedPreviews": outcome.released_previews }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "chapters.add" => Some(respond(&req.id, chapter_add(state, req))),
        "chapters.update" => Some(respond(&req.id, chapter_update(state, req))),
        "chapters.remove" => Some(respond(&req.id, chapter_remove(state, req))),
        "chapters.reorder" => Some(respond(&req.id, chapter_reorder(state, req))),
        "lessons.add" => Some(respond(&req.id, lesson_add(state, req))),
        "lessons.update" => Some(respond(&req.id, lesson_update(state, req))),
        "lessons.remove" => Some(respond(&req.id, lesson_remove(state, req))),
        "lessons.reorder" => Some(respond(&req.id, lesson_reorder(state, req))),
        "attachments.add" => Some(respond(&req.id, attachments_add(state, req))),
        "attachments.remove" => Some(respond(&req.id, attachments_remove(state, req))),
        _ => None,
    }
}
