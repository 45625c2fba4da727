use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AttachmentKind {
    Document,
    Video,
}

/// A file the editor picked in the authoring surface. The engine only ever
/// sees this descriptor; the bytes stay with the UI, addressed by `file_ref`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StagedFile {
    pub name: String,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub mime_type: String,
    pub file_ref: String,
    #[serde(default)]
    pub preview_ref: Option<String>,
}

/// Where an attachment's binary lives. Exactly one side is ever populated:
/// a staged file is a local binary the server has not seen, an existing file
/// is a server-side object referenced by URL.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum AttachmentSource {
    #[serde(rename_all = "camelCase")]
    Staged {
        file_ref: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        preview_ref: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    Existing {
        url: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        server_id: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        original_name: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    pub id: String,
    pub display_name: String,
    /// 0 for existing attachments whose size is not locally known.
    pub size_bytes: u64,
    pub mime_type: String,
    #[serde(flatten)]
    pub source: AttachmentSource,
}

impl Attachment {
    pub fn staged(id: String, file: &StagedFile) -> Self {
        Self {
            id,
            display_name: file.name.clone(),
            size_bytes: file.size,
            mime_type: file.mime_type.clone(),
            source: AttachmentSource::Staged {
                file_ref: file.file_ref.clone(),
                preview_ref: file.preview_ref.clone(),
            },
        }
    }

    pub fn existing(
        id: String,
        display_name: String,
        mime_type: String,
        url: String,
        server_id: Option<String>,
        original_name: Option<String>,
    ) -> Self {
        Self {
            id,
            display_name,
            size_bytes: 0,
            mime_type,
            source: AttachmentSource::Existing {
                url,
                server_id,
                original_name,
            },
        }
    }

    pub fn is_existing(&self) -> bool {
        matches!(self.source, AttachmentSource::Existing { .. })
    }

    pub fn preview_ref(&self) -> Option<&str> {
        match &self.source {
            AttachmentSource::Staged { preview_ref, .. } => preview_ref.as_deref(),
            AttachmentSource::Existing { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Lesson {
    pub id: String,
    pub title: String,
    pub description: String,
    pub documents: Vec<Attachment>,
    pub videos: Vec<Attachment>,
}

impl Lesson {
    pub fn empty(id: String, title: String, description: String) -> Self {
        Self {
            id,
            title,
            description,
            documents: Vec::new(),
            videos: Vec::new(),
        }
    }

    pub fn attachments_mut(&mut self, kind: AttachmentKind) -> &mut Vec<Attachment> {
        match kind {
            AttachmentKind::Document => &mut self.documents,
            AttachmentKind::Video => &mut self.videos,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Chapter {
    pub id: String,
    pub title: String,
    pub description: String,
    pub lessons: Vec<Lesson>,
}

impl Chapter {
    pub fn empty(id: String, title: String, description: String) -> Self {
        Self {
            id,
            title,
            description,
            lessons: Vec::new(),
        }
    }
}

/// An entry of the category list the surrounding application supplies when a
/// session opens. The engine never fetches categories itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryRef {
    pub id: String,
    #[serde(default)]
    pub name: String,
}

/// The aggregate root the whole engine operates on. Exclusively owned by the
/// wizard session; every mutation derives a fresh tree from the old one.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CurriculumTree {
    pub title: String,
    pub category_id: Option<String>,
    pub description: String,
    pub benefits: String,
    pub requirements: String,
    pub price: f64,
    pub thumbnail: Option<Attachment>,
    pub chapters: Vec<Chapter>,
}

impl CurriculumTree {
    pub fn empty() -> Self {
        Self {
            title: String::new(),
            category_id: None,
            description: String::new(),
            benefits: String::new(),
            requirements: String::new(),
            price: 0.0,
            thumbnail: None,
            chapters: Vec::new(),
        }
    }

    pub fn chapter_mut(&mut self, chapter_id: &str) -> Option<&mut Chapter> {
        self.chapters.iter_mut().find(|c| c.id == chapter_id)
    }

    /// Lesson ids are unique tree-wide, so a lesson can be addressed without
    /// naming its chapter.
    pub fn lesson(&self, lesson_id: &str) -> Option<&Lesson> {
        self.chapters
            .iter()
            .flat_map(|c| c.lessons.iter())
            .find(|l| l.id == lesson_id)
    }

    pub fn lesson_mut(&mut self, lesson_id: &str) -> Option<&mut Lesson> {
        self.chapters
            .iter_mut()
            .flat_map(|c| c.lessons.iter_mut())
            .find(|l| l.id == lesson_id)
    }

    /// Every preview reference currently held by staged attachments,
    /// thumbnail included. Used when the whole tree is discarded.
    pub fn preview_refs(&self) -> Vec<String> {
        let mut out = Vec::new();
        if let Some(thumb) = &self.thumbnail {
            if let Some(p) = thumb.preview_ref() {
                out.push(p.to_string());
            }
        }
        for chapter in &self.chapters {
            for lesson in &chapter.lessons {
                for att in lesson.documents.iter().chain(lesson.videos.iter()) {
                    if let Some(p) = att.preview_ref() {
                        out.push(p.to_string());
                    }
                }
            }
        }
        out
    }

    /// Ids of every node reachable from the tree. Chapters, lessons and
    /// attachments share one id space for the lifetime of the session.
    pub fn node_ids(&self) -> BTreeSet<String> {
        let mut out = BTreeSet::new();
        if let Some(thumb) = &self.thumbnail {
            out.insert(thumb.id.clone());
        }
        for chapter in &self.chapters {
            out.insert(chapter.id.clone());
            for lesson in &chapter.lessons {
                out.insert(lesson.id.clone());
                for att in lesson.documents.iter().chain(lesson.videos.iter()) {
                    out.insert(att.id.clone());
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn staged_file(name: &str, preview: Option<&str>) -> StagedFile {
        StagedFile {
            name: name.to_string(),
            size: 1024,
            mime_type: "application/pdf".to_string(),
            file_ref: format!("blob:{name}"),
            preview_ref: preview.map(|p| p.to_string()),
        }
    }

    #[test]
    fn lesson_lookup_crosses_chapters() {
        let mut tree = CurriculumTree::empty();
        let mut ch1 = Chapter::empty("c1".into(), "One".into(), "d".into());
        ch1.lessons
            .push(Lesson::empty("l1".into(), "A".into(), "d".into()));
        let mut ch2 = Chapter::empty("c2".into(), "Two".into(), "d".into());
        ch2.lessons
            .push(Lesson::empty("l2".into(), "B".into(), "d".into()));
        tree.chapters.push(ch1);
        tree.chapters.push(ch2);

        assert_eq!(tree.lesson("l2").map(|l| l.title.as_str()), Some("B"));
        assert!(tree.lesson("l3").is_none());
    }

    #[test]
    fn preview_refs_only_come_from_staged_sources() {
        let mut tree = CurriculumTree::empty();
        tree.thumbnail = Some(Attachment::staged(
            "t1".into(),
            &staged_file("cover.png", Some("blob:preview-1")),
        ));
        let mut chapter = Chapter::empty("c1".into(), "One".into(), "d".into());
        let mut lesson = Lesson::empty("l1".into(), "A".into(), "d".into());
        lesson.documents.push(Attachment::staged(
            "a1".into(),
            &staged_file("notes.pdf", None),
        ));
        lesson.videos.push(Attachment::existing(
            "a2".into(),
            "A - Video 1".into(),
            "video/mp4".into(),
            "https://cdn.example/a2".into(),
            Some("srv-2".into()),
            None,
        ));
        chapter.lessons.push(lesson);
        tree.chapters.push(chapter);

        assert_eq!(tree.preview_refs(), vec!["blob:preview-1".to_string()]);
        assert_eq!(tree.node_ids().len(), 5);
    }
}
