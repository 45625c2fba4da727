use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::idgen::IdGen;
use crate::model::{
    Attachment, AttachmentKind, Chapter, CurriculumTree, Lesson, StagedFile,
};

pub const DOCUMENT_MIME_TYPES: &[&str] = &[
    "application/pdf",
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    "application/vnd.ms-powerpoint",
    "application/vnd.openxmlformats-officedocument.presentationml.presentation",
    "text/plain",
];

pub const VIDEO_MIME_TYPES: &[&str] = &["video/mp4", "video/webm", "video/quicktime"];

pub const MAX_DOCUMENT_BYTES: u64 = 50 * 1024 * 1024;
pub const MAX_VIDEO_BYTES: u64 = 512 * 1024 * 1024;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetadataPatch {
    pub title: Option<String>,
    pub category_id: Option<String>,
    pub description: Option<String>,
    pub benefits: Option<String>,
    pub requirements: Option<String>,
    pub price: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodePatch {
    pub title: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone)]
pub enum EditAction {
    UpdateMetadata(MetadataPatch),
    SetThumbnail(StagedFile),
    ClearThumbnail,
    AddChapter {
        title: String,
        description: String,
    },
    UpdateChapter {
        chapter_id: String,
        patch: NodePatch,
    },
    RemoveChapter {
        chapter_id: String,
    },
    ReorderChapters {
        order: Vec<String>,
    },
    AddLesson {
        chapter_id: String,
        title: String,
        description: String,
    },
    UpdateLesson {
        lesson_id: String,
        patch: NodePatch,
    },
    RemoveLesson {
        lesson_id: String,
    },
    ReorderLessons {
        chapter_id: String,
        order: Vec<String>,
    },
    AddAttachments {
        lesson_id: String,
        kind: AttachmentKind,
        files: Vec<StagedFile>,
    },
    RemoveAttachment {
        lesson_id: String,
        attachment_id: String,
    },
}

/// One file of a batch that failed the staging screen. Siblings in the same
/// batch are unaffected.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RejectedFile {
    pub name: String,
    pub file_ref: String,
    pub reason: &'static str,
}

/// Maps a freshly staged attachment back to the UI's file handle so the
/// collaborator can pair payload entries with the binaries it holds.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StagedRef {
    pub attachment_id: String,
    pub file_ref: String,
}

#[derive(Debug)]
pub struct EditOutcome {
    pub tree: CurriculumTree,
    /// Id of the node created by AddChapter / AddLesson, if any.
    pub created_id: Option<String>,
    pub staged: Vec<StagedRef>,
    pub rejected: Vec<RejectedFile>,
    /// Preview references that left the tree and must be revoked by the
    /// layer that created them.
    pub released_previews: Vec<String>,
}

impl EditOutcome {
    fn from_tree(tree: CurriculumTree) -> Self {
        Self {
            tree,
            created_id: None,
            staged: Vec::new(),
            rejected: Vec::new(),
            released_previews: Vec::new(),
        }
    }
}

#[derive(Debug, Error)]
pub enum EditError {
    #[error("chapter not found: {0}")]
    UnknownChapter(String),
    #[error("lesson not found: {0}")]
    UnknownLesson(String),
    #[error("attachment not found: {0}")]
    UnknownAttachment(String),
    #[error("id order must be a permutation of the current {0}")]
    BadOrder(&'static str),
}

fn screen_file(kind: AttachmentKind, file: &StagedFile) -> Option<&'static str> {
    let (allowed, ceiling) = match kind {
        AttachmentKind::Document => (DOCUMENT_MIME_TYPES, MAX_DOCUMENT_BYTES),
        AttachmentKind::Video => (VIDEO_MIME_TYPES, MAX_VIDEO_BYTES),
    };
    if !allowed
        .iter()
        .any(|t| t.eq_ignore_ascii_case(file.mime_type.trim()))
    {
        return Some("unsupported_type");
    }
    if file.size > ceiling {
        return Some("too_large");
    }
    None
}

fn lesson_previews(lesson: &Lesson) -> Vec<String> {
    lesson
        .documents
        .iter()
        .chain(lesson.videos.iter())
        .filter_map(|a| a.preview_ref().map(|p| p.to_string()))
        .collect()
}

fn chapter_previews(chapter: &Chapter) -> Vec<String> {
    chapter.lessons.iter().flat_map(|l| lesson_previews(l)).collect()
}

fn is_permutation(order: &[String], current: &BTreeSet<String>) -> bool {
    order.len() == current.len() && order.iter().cloned().collect::<BTreeSet<_>>() == *current
}

/// Applies one editing action as a pure rewrite: the input tree is never
/// touched, the outcome carries a freshly derived one.
pub fn apply(
    ids: &mut IdGen,
    tree: &CurriculumTree,
    action: EditAction,
) -> Result<EditOutcome, EditError> {
    let mut next = tree.clone();

    match action {
        EditAction::UpdateMetadata(patch) => {
            if let Some(v) = patch.title {
                next.title = v;
            }
            if let Some(v) = patch.category_id {
                next.category_id = Some(v);
            }
            if let Some(v) = patch.description {
                next.description = v;
            }
            if let Some(v) = patch.benefits {
                next.benefits = v;
            }
            if let Some(v) = patch.requirements {
                next.requirements = v;
            }
            if let Some(v) = patch.price {
                next.price = v;
            }
            Ok(EditOutcome::from_tree(next))
        }
        EditAction::SetThumbnail(file) => {
            let mut released = Vec::new();
            if let Some(old) = &next.thumbnail {
                if let Some(p) = old.preview_ref() {
                    released.push(p.to_string());
                }
            }
            let id = ids.next_id();
            let staged = vec![StagedRef {
                attachment_id: id.clone(),
                file_ref: file.file_ref.clone(),
            }];
            next.thumbnail = Some(Attachment::staged(id, &file));
            let mut outcome = EditOutcome::from_tree(next);
            outcome.staged = staged;
            outcome.released_previews = released;
            Ok(outcome)
        }
        EditAction::ClearThumbnail => {
            let mut released = Vec::new();
            if let Some(old) = next.thumbnail.take() {
                if let Some(p) = old.preview_ref() {
                    released.push(p.to_string());
                }
            }
            let mut outcome = EditOutcome::from_tree(next);
            outcome.released_previews = released;
            Ok(outcome)
        }
        EditAction::AddChapter { title, description } => {
            let id = ids.next_id();
            next.chapters.push(Chapter::empty(id.clone(), title, description));
            let mut outcome = EditOutcome::from_tree(next);
            outcome.created_id = Some(id);
            Ok(outcome)
        }
        EditAction::UpdateChapter { chapter_id, patch } => {
            let chapter = next
                .chapter_mut(&chapter_id)
                .ok_or(EditError::UnknownChapter(chapter_id))?;
            if let Some(v) = patch.title {
                chapter.title = v;
            }
            if let Some(v) = patch.description {
                chapter.description = v;
            }
            Ok(EditOutcome::from_tree(next))
        }
        EditAction::RemoveChapter { chapter_id } => {
            let idx = next
                .chapters
                .iter()
                .position(|c| c.id == chapter_id)
                .ok_or(EditError::UnknownChapter(chapter_id))?;
            let removed = next.chapters.remove(idx);
            let mut outcome = EditOutcome::from_tree(next);
            outcome.released_previews = chapter_previews(&removed);
            Ok(outcome)
        }
        EditAction::ReorderChapters { order } => {
            let current: BTreeSet<String> =
                next.chapters.iter().map(|c| c.id.clone()).collect();
            if !is_permutation(&order, &current) {
                return Err(EditError::BadOrder("chapters"));
            }
            let mut by_id: HashMap<String, Chapter> = next
                .chapters
                .drain(..)
                .map(|c| (c.id.clone(), c))
                .collect();
            next.chapters = order.iter().filter_map(|id| by_id.remove(id)).collect();
            Ok(EditOutcome::from_tree(next))
        }
        EditAction::AddLesson {
            chapter_id,
            title,
            description,
        } => {
            let id = ids.next_id();
            let chapter = next
                .chapter_mut(&chapter_id)
                .ok_or(EditError::UnknownChapter(chapter_id))?;
            chapter
                .lessons
                .push(Lesson::empty(id.clone(), title, description));
            let mut outcome = EditOutcome::from_tree(next);
            outcome.created_id = Some(id);
            Ok(outcome)
        }
        EditAction::UpdateLesson { lesson_id, patch } => {
            let lesson = next
                .lesson_mut(&lesson_id)
                .ok_or(EditError::UnknownLesson(lesson_id))?;
            if let Some(v) = patch.title {
                lesson.title = v;
            }
            if let Some(v) = patch.description {
                lesson.description = v;
            }
            Ok(EditOutcome::from_tree(next))
        }
        EditAction::RemoveLesson { lesson_id } => {
            let mut removed: Option<Lesson> = None;
            for chapter in next.chapters.iter_mut() {
                if let Some(idx) = chapter.lessons.iter().position(|l| l.id == lesson_id) {
                    removed = Some(chapter.lessons.remove(idx));
                    break;
                }
            }
            let removed = removed.ok_or(EditError::UnknownLesson(lesson_id))?;
            let mut outcome = EditOutcome::from_tree(next);
            outcome.released_previews = lesson_previews(&removed);
            Ok(outcome)
        }
        EditAction::ReorderLessons { chapter_id, order } => {
            let chapter = next
                .chapter_mut(&chapter_id)
                .ok_or(EditError::UnknownChapter(chapter_id))?;
            let current: BTreeSet<String> =
                chapter.lessons.iter().map(|l| l.id.clone()).collect();
            if !is_permutation(&order, &current) {
                return Err(EditError::BadOrder("lessons"));
            }
            let mut by_id: HashMap<String, Lesson> = chapter
                .lessons
                .drain(..)
                .map(|l| (l.id.clone(), l))
                .collect();
            chapter.lessons = order.iter().filter_map(|id| by_id.remove(id)).collect();
            Ok(EditOutcome::from_tree(next))
        }
        EditAction::AddAttachments {
            lesson_id,
            kind,
            files,
        } => {
            if next.lesson(&lesson_id).is_none() {
                return Err(EditError::UnknownLesson(lesson_id));
            }
            let mut staged = Vec::new();
            let mut rejected = Vec::new();
            let mut accepted = Vec::new();
            for file in files {
                match screen_file(kind, &file) {
                    Some(reason) => rejected.push(RejectedFile {
                        name: file.name.clone(),
                        file_ref: file.file_ref.clone(),
                        reason,
                    }),
                    None => {
                        let id = ids.next_id();
                        staged.push(StagedRef {
                            attachment_id: id.clone(),
                            file_ref: file.file_ref.clone(),
                        });
                        accepted.push(Attachment::staged(id, &file));
                    }
                }
            }
            let lesson = next
                .lesson_mut(&lesson_id)
                .ok_or(EditError::UnknownLesson(lesson_id))?;
            lesson.attachments_mut(kind).extend(accepted);
            let mut outcome = EditOutcome::from_tree(next);
            outcome.staged = staged;
            outcome.rejected = rejected;
            Ok(outcome)
        }
        EditAction::RemoveAttachment {
            lesson_id,
            attachment_id,
        } => {
            let lesson = next
                .lesson_mut(&lesson_id)
                .ok_or(EditError::UnknownLesson(lesson_id))?;
            let mut removed: Option<Attachment> = None;
            for kind in [AttachmentKind::Document, AttachmentKind::Video] {
                let list = lesson.attachments_mut(kind);
                if let Some(idx) = list.iter().position(|a| a.id == attachment_id) {
                    removed = Some(list.remove(idx));
                    break;
                }
            }
            let removed = removed.ok_or(EditError::UnknownAttachment(attachment_id))?;
            let mut outcome = EditOutcome::from_tree(next);
            if let Some(p) = removed.preview_ref() {
                outcome.released_previews.push(p.to_string());
            }
            Ok(outcome)
        }
    }
}
