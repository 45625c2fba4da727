use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::idgen::IdGen;
use crate::model::{Attachment, AttachmentSource, Chapter, CurriculumTree, Lesson};

// Inbound: the persisted course record as the backend returns it for an
// edit session. Absent collections deserialize to empty, never null, so
// nothing downstream re-checks optionality.

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerCourse {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub benefits: String,
    #[serde(default)]
    pub requirements: String,
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub category: Option<ServerCategory>,
    #[serde(default)]
    pub thumbnail_image: Option<String>,
    #[serde(default)]
    pub chapters: Vec<ServerChapter>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerCategory {
    pub id: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerChapter {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub lessons: Vec<ServerLesson>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerLesson {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub documents: Vec<ServerFile>,
    #[serde(default)]
    pub videos: Vec<ServerFile>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerFile {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub signed_url: String,
    #[serde(default)]
    pub file_name: String,
    #[serde(default)]
    pub original_name: String,
}

// Outbound: the submission payload. Locally minted ids pass through as
// temporary markers (create), server ids pass through unchanged (update).

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum OutboundKind {
    Existing,
    Staged,
}

#[derive(Debug, Clone, Serialize)]
pub struct OutboundFile {
    pub kind: OutboundKind,
    #[serde(rename = "ref")]
    pub reference: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutboundLesson {
    pub id: String,
    pub title: String,
    pub description: String,
    pub documents: Vec<OutboundFile>,
    pub videos: Vec<OutboundFile>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutboundChapter {
    pub id: String,
    pub title: String,
    pub description: String,
    pub lessons: Vec<OutboundLesson>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutboundPayload {
    pub title: String,
    pub description: String,
    pub benefits: String,
    pub requirements: String,
    pub price: f64,
    pub category: String,
    pub thumbnail: OutboundFile,
    pub chapters: Vec<OutboundChapter>,
}

/// The tree reached the outbound translator in a state the step validator
/// should have excluded. A caller-ordering bug, not a user error.
#[derive(Debug, Error)]
pub enum TranslateError {
    #[error("a submittable course must have a thumbnail")]
    MissingThumbnail,
    #[error("a submittable course must have a category")]
    MissingCategory,
}

/// MIME-ish tag for a server-side file we only know by name. Good enough
/// for the editor's type badges; staged files carry the browser-reported
/// type instead.
fn guess_mime(file_name: &str, url: &str) -> String {
    let name = if file_name.trim().is_empty() {
        url.split(['?', '#']).next().unwrap_or("")
    } else {
        file_name
    };
    let ext = name
        .rsplit('.')
        .next()
        .unwrap_or("")
        .to_ascii_lowercase();
    match ext.as_str() {
        "pdf" => "application/pdf",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "ppt" => "application/vnd.ms-powerpoint",
        "pptx" => "application/vnd.openxmlformats-officedocument.presentationml.presentation",
        "txt" => "text/plain",
        "mp4" => "video/mp4",
        "webm" => "video/webm",
        "mov" => "video/quicktime",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "webp" => "image/webp",
        _ => "application/octet-stream",
    }
    .to_string()
}

fn existing_attachment(
    ids: &mut IdGen,
    file: &ServerFile,
    lesson_title: &str,
    label: &str,
    ordinal: usize,
) -> Attachment {
    let id = file.id.clone().unwrap_or_else(|| ids.next_id());
    // Display name comes from lesson title + ordinal, not originalName;
    // the server name is carried on the attachment untouched.
    let display_name = if lesson_title.trim().is_empty() {
        format!("{} {}", label, ordinal)
    } else {
        format!("{} - {} {}", lesson_title.trim(), label, ordinal)
    };
    let original_name = if file.original_name.trim().is_empty() {
        None
    } else {
        Some(file.original_name.clone())
    };
    Attachment::existing(
        id,
        display_name,
        guess_mime(&file.file_name, &file.signed_url),
        file.signed_url.clone(),
        file.id.clone(),
        original_name,
    )
}

/// Translates the persisted course record into the editable tree. Missing
/// ids are minted defensively; a well-formed record always has them.
pub fn from_server(ids: &mut IdGen, course: &ServerCourse) -> CurriculumTree {
    let thumbnail = course.thumbnail_image.as_ref().map(|url| {
        Attachment::existing(
            ids.next_id(),
            "Course thumbnail".to_string(),
            guess_mime("", url),
            url.clone(),
            None,
            None,
        )
    });

    let chapters = course
        .chapters
        .iter()
        .map(|sc| {
            let lessons = sc
                .lessons
                .iter()
                .map(|sl| {
                    let documents = sl
                        .documents
                        .iter()
                        .enumerate()
                        .map(|(i, f)| existing_attachment(ids, f, &sl.title, "Document", i + 1))
                        .collect();
                    let videos = sl
                        .videos
                        .iter()
                        .enumerate()
                        .map(|(i, f)| existing_attachment(ids, f, &sl.title, "Video", i + 1))
                        .collect();
                    Lesson {
                        id: sl.id.clone().unwrap_or_else(|| ids.next_id()),
                        title: sl.title.clone(),
                        description: sl.description.clone(),
                        documents,
                        videos,
                    }
                })
                .collect();
            Chapter {
                id: sc.id.clone().unwrap_or_else(|| ids.next_id()),
                title: sc.title.clone(),
                description: sc.description.clone(),
                lessons,
            }
        })
        .collect();

    CurriculumTree {
        title: course.title.clone(),
        category_id: course.category.as_ref().map(|c| c.id.clone()),
        description: course.description.clone(),
        benefits: course.benefits.clone(),
        requirements: course.requirements.clone(),
        price: course.price,
        thumbnail,
        chapters,
    }
}

fn outbound_file(att: &Attachment) -> OutboundFile {
    match &att.source {
        AttachmentSource::Existing { url, server_id, .. } => OutboundFile {
            kind: OutboundKind::Existing,
            reference: server_id.clone().unwrap_or_else(|| url.clone()),
        },
        AttachmentSource::Staged { .. } => OutboundFile {
            kind: OutboundKind::Staged,
            reference: att.id.clone(),
        },
    }
}

pub fn to_server_payload(tree: &CurriculumTree) -> Result<OutboundPayload, TranslateError> {
    let thumbnail = tree
        .thumbnail
        .as_ref()
        .map(outbound_file)
        .ok_or(TranslateError::MissingThumbnail)?;
    let category = tree
        .category_id
        .clone()
        .ok_or(TranslateError::MissingCategory)?;

    let chapters = tree
        .chapters
        .iter()
        .map(|c| OutboundChapter {
            id: c.id.clone(),
            title: c.title.clone(),
            description: c.description.clone(),
            lessons: c
                .lessons
                .iter()
                .map(|l| OutboundLesson {
                    id: l.id.clone(),
                    title: l.title.clone(),
                    description: l.description.clone(),
                    documents: l.documents.iter().map(outbound_file).collect(),
                    videos: l.videos.iter().map(outbound_file).collect(),
                })
                .collect(),
        })
        .collect();

    Ok(OutboundPayload {
        title: tree.title.clone(),
        description: tree.description.clone(),
        benefits: tree.benefits.clone(),
        requirements: tree.requirements.clone(),
        price: tree.price,
        category,
        thumbnail,
        chapters,
    })
}
