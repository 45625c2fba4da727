use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::edit::{apply, EditAction, EditError, EditOutcome};
use crate::idgen::IdGen;
use crate::model::{CategoryRef, CurriculumTree};
use crate::translate::{
    from_server, to_server_payload, OutboundPayload, ServerCourse, TranslateError,
};
use crate::validate::{validate, Step, ValidationReport};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum WizardState {
    Metadata,
    Structure,
    Submitting,
    Completed,
    Cancelled,
}

impl WizardState {
    pub fn name(self) -> &'static str {
        match self {
            WizardState::Metadata => "metadata",
            WizardState::Structure => "structure",
            WizardState::Submitting => "submitting",
            WizardState::Completed => "completed",
            WizardState::Cancelled => "cancelled",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SubmitIntent {
    Create,
    Update,
}

impl SubmitIntent {
    pub fn name(self) -> &'static str {
        match self {
            SubmitIntent::Create => "create",
            SubmitIntent::Update => "update",
        }
    }
}

/// What the external submission collaborator needs to perform the upload
/// and the create/update call. The engine waits in Submitting until the
/// collaborator reports back.
#[derive(Debug)]
pub struct SubmitRequest {
    pub intent: SubmitIntent,
    pub course_id: Option<String>,
    pub payload: OutboundPayload,
}

#[derive(Debug)]
pub enum StepOutcome {
    Advanced(WizardState),
    Rejected(ValidationReport),
}

#[derive(Debug)]
pub enum SubmitOutcome {
    Started(SubmitRequest),
    Rejected(ValidationReport),
}

#[derive(Debug)]
pub struct SubmitResolution {
    pub state: WizardState,
    pub released_previews: Vec<String>,
}

#[derive(Debug, Error)]
pub enum WizardError {
    #[error("not allowed in the {0} state")]
    BadState(&'static str),
    #[error(transparent)]
    Edit(#[from] EditError),
    #[error(transparent)]
    Translate(#[from] TranslateError),
}

/// One editing session over one curriculum tree, from open to submit or
/// cancel. Owns the tree exclusively; every mutation goes through `apply`.
pub struct WizardSession {
    intent: SubmitIntent,
    course_id: Option<String>,
    state: WizardState,
    categories: Vec<CategoryRef>,
    tree: CurriculumTree,
    ids: IdGen,
}

impl WizardSession {
    pub fn create(categories: Vec<CategoryRef>) -> Self {
        Self {
            intent: SubmitIntent::Create,
            course_id: None,
            state: WizardState::Metadata,
            categories,
            tree: CurriculumTree::empty(),
            ids: IdGen::new(),
        }
    }

    pub fn edit(
        categories: Vec<CategoryRef>,
        course: &ServerCourse,
        course_id: Option<String>,
    ) -> Self {
        let mut ids = IdGen::new();
        let tree = from_server(&mut ids, course);
        Self {
            intent: SubmitIntent::Update,
            course_id,
            state: WizardState::Metadata,
            categories,
            tree,
            ids,
        }
    }

    pub fn state(&self) -> WizardState {
        self.state
    }

    pub fn intent(&self) -> SubmitIntent {
        self.intent
    }

    pub fn course_id(&self) -> Option<&str> {
        self.course_id.as_deref()
    }

    pub fn tree(&self) -> &CurriculumTree {
        &self.tree
    }

    pub fn categories(&self) -> &[CategoryRef] {
        &self.categories
    }

    fn editable(&self) -> bool {
        matches!(self.state, WizardState::Metadata | WizardState::Structure)
    }

    /// Applies one pure tree rewrite. Refused while a submission is in
    /// flight and after the session reached a terminal state.
    pub fn apply(&mut self, action: EditAction) -> Result<EditOutcome, WizardError> {
        if !self.editable() {
            return Err(WizardError::BadState(self.state.name()));
        }
        let outcome = apply(&mut self.ids, &self.tree, action)?;
        self.tree = outcome.tree.clone();
        Ok(outcome)
    }

    pub fn validate_step(&self, step: Step) -> ValidationReport {
        validate(step, &self.tree, &self.categories)
    }

    pub fn advance(&mut self) -> Result<StepOutcome, WizardError> {
        if self.state != WizardState::Metadata {
            return Err(WizardError::BadState(self.state.name()));
        }
        let report = validate(Step::Metadata, &self.tree, &self.categories);
        if !report.valid {
            return Ok(StepOutcome::Rejected(report));
        }
        self.state = WizardState::Structure;
        debug!(state = self.state.name(), "wizard advanced");
        Ok(StepOutcome::Advanced(self.state))
    }

    pub fn back(&mut self) -> Result<WizardState, WizardError> {
        if self.state != WizardState::Structure {
            return Err(WizardError::BadState(self.state.name()));
        }
        self.state = WizardState::Metadata;
        Ok(self.state)
    }

    /// Validates both steps (category membership is a submit-time rule),
    /// translates outbound and parks the session in Submitting. The caller
    /// performs the actual upload and reports back via `resolve_submit`.
    pub fn begin_submit(&mut self) -> Result<SubmitOutcome, WizardError> {
        if self.state != WizardState::Structure {
            return Err(WizardError::BadState(self.state.name()));
        }
        let mut report = validate(Step::Metadata, &self.tree, &self.categories);
        let structure = validate(Step::Structure, &self.tree, &self.categories);
        if !structure.valid {
            report.valid = false;
            report.field_errors.extend(structure.field_errors);
        }
        if !report.valid {
            return Ok(SubmitOutcome::Rejected(report));
        }

        let payload = to_server_payload(&self.tree)?;
        self.state = WizardState::Submitting;
        debug!(intent = ?self.intent, "submission started");
        Ok(SubmitOutcome::Started(SubmitRequest {
            intent: self.intent,
            course_id: self.course_id.clone(),
            payload,
        }))
    }

    /// Success discards the session's tree (previews released for the UI
    /// to revoke); failure returns to Structure with the tree intact so
    /// the editor can retry without re-entering anything.
    pub fn resolve_submit(&mut self, ok: bool) -> Result<SubmitResolution, WizardError> {
        if self.state != WizardState::Submitting {
            return Err(WizardError::BadState(self.state.name()));
        }
        if ok {
            self.state = WizardState::Completed;
            Ok(SubmitResolution {
                state: self.state,
                released_previews: self.tree.preview_refs(),
            })
        } else {
            self.state = WizardState::Structure;
            debug!("submission failed, tree preserved for retry");
            Ok(SubmitResolution {
                state: self.state,
                released_previews: Vec::new(),
            })
        }
    }

    /// Allowed from any state. The first cancel reports every live preview
    /// reference; a cancel of an already-terminal session reports none.
    pub fn cancel(&mut self) -> Vec<String> {
        let released = match self.state {
            WizardState::Completed | WizardState::Cancelled => Vec::new(),
            _ => self.tree.preview_refs(),
        };
        self.state = WizardState::Cancelled;
        released
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edit::MetadataPatch;
    use crate::model::{AttachmentKind, StagedFile};
    use crate::translate::OutboundKind;
    use crate::validate::DESCRIPTION_MIN_CHARS;

    fn categories() -> Vec<CategoryRef> {
        vec![CategoryRef {
            id: "cat-1".into(),
            name: "Programming".into(),
        }]
    }

    fn png(name: &str) -> StagedFile {
        StagedFile {
            name: name.to_string(),
            size: 2048,
            mime_type: "image/png".into(),
            file_ref: format!("blob:{name}"),
            preview_ref: Some(format!("preview:{name}")),
        }
    }

    fn pdf(name: &str) -> StagedFile {
        StagedFile {
            name: name.to_string(),
            size: 4096,
            mime_type: "application/pdf".into(),
            file_ref: format!("blob:{name}"),
            preview_ref: None,
        }
    }

    fn fill_metadata(session: &mut WizardSession) {
        session
            .apply(EditAction::UpdateMetadata(MetadataPatch {
                title: Some("Rust from Zero".into()),
                category_id: Some("cat-1".into()),
                description: Some("d".repeat(DESCRIPTION_MIN_CHARS)),
                benefits: Some("Ship real programs with confidence".into()),
                requirements: Some("A laptop and patience".into()),
                price: Some(49.0),
            }))
            .unwrap();
        session
            .apply(EditAction::SetThumbnail(png("cover.png")))
            .unwrap();
    }

    fn fill_structure(session: &mut WizardSession) -> String {
        let out = session
            .apply(EditAction::AddChapter {
                title: "Intro".into(),
                description: "Where it all begins".into(),
            })
            .unwrap();
        let chapter_id = out.created_id.unwrap();
        let out = session
            .apply(EditAction::AddLesson {
                chapter_id,
                title: "Welcome".into(),
                description: "Say hello".into(),
            })
            .unwrap();
        let lesson_id = out.created_id.unwrap();
        session
            .apply(EditAction::AddAttachments {
                lesson_id: lesson_id.clone(),
                kind: AttachmentKind::Document,
                files: vec![pdf("notes.pdf")],
            })
            .unwrap();
        lesson_id
    }

    #[test]
    fn short_title_blocks_advance_and_state_is_unchanged() {
        let mut session = WizardSession::create(categories());
        session
            .apply(EditAction::UpdateMetadata(MetadataPatch {
                title: Some("ab".into()),
                ..MetadataPatch::default()
            }))
            .unwrap();
        match session.advance().unwrap() {
            StepOutcome::Rejected(report) => {
                assert!(report.field_errors.contains_key("title"));
            }
            StepOutcome::Advanced(_) => panic!("advance must be rejected"),
        }
        assert_eq!(session.state(), WizardState::Metadata);
    }

    #[test]
    fn create_flow_produces_a_staged_payload() {
        let mut session = WizardSession::create(categories());
        fill_metadata(&mut session);
        assert!(matches!(
            session.advance().unwrap(),
            StepOutcome::Advanced(WizardState::Structure)
        ));
        fill_structure(&mut session);

        let request = match session.begin_submit().unwrap() {
            SubmitOutcome::Started(request) => request,
            SubmitOutcome::Rejected(report) => panic!("unexpected rejection: {report:?}"),
        };
        assert_eq!(request.intent, SubmitIntent::Create);
        assert_eq!(session.state(), WizardState::Submitting);

        let chapter = &request.payload.chapters[0];
        assert_eq!(chapter.lessons[0].documents.len(), 1);
        assert_eq!(chapter.lessons[0].documents[0].kind, OutboundKind::Staged);
        assert_eq!(request.payload.thumbnail.kind, OutboundKind::Staged);

        let resolution = session.resolve_submit(true).unwrap();
        assert_eq!(resolution.state, WizardState::Completed);
        assert_eq!(
            resolution.released_previews,
            vec!["preview:cover.png".to_string()]
        );
    }

    #[test]
    fn failed_submission_preserves_the_tree_for_retry() {
        let mut session = WizardSession::create(categories());
        fill_metadata(&mut session);
        session.advance().unwrap();
        fill_structure(&mut session);
        let before = session.tree().clone();

        assert!(matches!(
            session.begin_submit().unwrap(),
            SubmitOutcome::Started(_)
        ));
        let resolution = session.resolve_submit(false).unwrap();
        assert_eq!(resolution.state, WizardState::Structure);
        assert!(resolution.released_previews.is_empty());
        assert_eq!(session.tree(), &before);

        // Retry succeeds without re-entering anything.
        assert!(matches!(
            session.begin_submit().unwrap(),
            SubmitOutcome::Started(_)
        ));
    }

    #[test]
    fn edits_are_refused_while_submitting() {
        let mut session = WizardSession::create(categories());
        fill_metadata(&mut session);
        session.advance().unwrap();
        fill_structure(&mut session);
        session.begin_submit().unwrap();

        let err = session
            .apply(EditAction::AddChapter {
                title: "Late".into(),
                description: "Too late".into(),
            })
            .unwrap_err();
        assert!(matches!(err, WizardError::BadState(_)));
    }

    #[test]
    fn submit_without_structure_reports_both_steps() {
        let mut session = WizardSession::create(categories());
        fill_metadata(&mut session);
        session.advance().unwrap();
        // Structure left empty on purpose.
        match session.begin_submit().unwrap() {
            SubmitOutcome::Rejected(report) => {
                assert!(report.field_errors.contains_key("chapters"));
            }
            SubmitOutcome::Started(_) => panic!("submit must be rejected"),
        }
        assert_eq!(session.state(), WizardState::Structure);
    }

    #[test]
    fn cancel_releases_previews_once() {
        let mut session = WizardSession::create(categories());
        fill_metadata(&mut session);
        let released = session.cancel();
        assert_eq!(released, vec!["preview:cover.png".to_string()]);
        assert_eq!(session.state(), WizardState::Cancelled);
        assert!(session.cancel().is_empty());
    }

    #[test]
    fn back_returns_to_metadata_with_tree_intact() {
        let mut session = WizardSession::create(categories());
        fill_metadata(&mut session);
        session.advance().unwrap();
        fill_structure(&mut session);
        let before = session.tree().clone();
        assert_eq!(session.back().unwrap(), WizardState::Metadata);
        assert_eq!(session.tree(), &before);
    }
}
