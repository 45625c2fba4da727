use serde_json::{json, Value as JsonValue};
use tracing::{info, warn};

use crate::idgen::IdGen;
use crate::ipc::error::{err, ok};
use crate::ipc::helpers::{default_field, opt_str, required_field, respond, session_mut};
use crate::ipc::types::{AppState, Request};
use crate::model::CategoryRef;
use crate::translate::ServerCourse;
use crate::wizard::WizardSession;

fn health(state: &AppState, _req: &Request) -> JsonValue {
    json!({
        "version": env!("CARGO_PKG_VERSION"),
        "sessionOpen": state.session.is_some(),
        "state": state.session.as_ref().map(|s| s.state().name()),
    })
}

fn open_create(state: &mut AppState, req: &Request) -> Result<JsonValue, JsonValue> {
    if state.session.is_some() {
        return Err(err(
            &req.id,
            "session_open",
            "discard the current session first",
            None,
        ));
    }
    let categories: Vec<CategoryRef> = default_field(req, "categories")?;
    let session = WizardSession::create(categories);
    info!(intent = "create", "session opened");
    let result = json!({ "state": session.state().name(), "intent": session.intent().name() });
    state.session = Some(session);
    Ok(result)
}

fn open_edit(state: &mut AppState, req: &Request) -> Result<JsonValue, JsonValue> {
    if state.session.is_some() {
        return Err(err(
            &req.id,
            "session_open",
            "discard the current session first",
            None,
        ));
    }
    let categories: Vec<CategoryRef> = default_field(req, "categories")?;
    let course: ServerCourse = required_field(req, "course")?;
    let course_id = opt_str(req, "courseId");
    let session = WizardSession::edit(categories, &course, course_id);
    info!(intent = "update", chapters = session.tree().chapters.len(), "session opened");
    // A well-formed record ids every chapter and lesson; minted ids here
    // mean the backend sent a partial shape.
    let minted = session
        .tree()
        .chapters
        .iter()
        .flat_map(|c| std::iter::once(&c.id).chain(c.lessons.iter().map(|l| &l.id)))
        .filter(|id| IdGen::is_local(id))
        .count();
    if minted > 0 {
        warn!(minted, "course record was missing ids, minted local ones");
    }
    let result = json!({
        "state": session.state().name(),
        "intent": session.intent().name(),
        "course": session.tree(),
    });
    state.session = Some(session);
    Ok(result)
}

fn discard(state: &mut AppState, req: &Request) -> Result<JsonValue, JsonValue> {
    let session = session_mut(state, req)?;
    let released = session.tree().preview_refs();
    state.session = None;
    info!("session discarded");
    Ok(json!({ "releasedPreviews": released }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "health" => Some(ok(&req.id, health(state, req))),
        "session.openCreate" => Some(respond(&req.id, open_create(state, req))),
        "session.openEdit" => Some(respond(&req.id, open_edit(state, req))),
        "session.discard" => Some(respond(&req.id, discard(state, req))),
        _ => None,
    }
}
