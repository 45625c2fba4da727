use std::collections::BTreeMap;

use serde::Serialize;

use crate::model::{CategoryRef, CurriculumTree};

pub const TITLE_MIN_CHARS: usize = 5;
pub const TITLE_MAX_CHARS: usize = 100;
// Character count, not word count. This mirrors the platform's shipped
// behavior; see DESIGN.md before "fixing" it.
pub const DESCRIPTION_MIN_CHARS: usize = 100;
pub const BENEFITS_MIN_CHARS: usize = 20;
pub const REQUIREMENTS_MIN_CHARS: usize = 10;

pub const THUMBNAIL_IMAGE_TYPES: &[&str] = &["image/jpeg", "image/png", "image/webp"];

/// The two gated steps of the authoring wizard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Metadata,
    Structure,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub valid: bool,
    pub field_errors: BTreeMap<String, String>,
}

impl ValidationReport {
    fn new() -> Self {
        Self {
            valid: true,
            field_errors: BTreeMap::new(),
        }
    }

    fn flag(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.valid = false;
        self.field_errors.insert(field.into(), message.into());
    }
}

fn trimmed_len(s: &str) -> usize {
    s.trim().chars().count()
}

fn check_metadata(tree: &CurriculumTree, categories: &[CategoryRef]) -> ValidationReport {
    let mut report = ValidationReport::new();

    let title_len = trimmed_len(&tree.title);
    if title_len < TITLE_MIN_CHARS || title_len > TITLE_MAX_CHARS {
        report.flag(
            "title",
            format!(
                "title must be {} to {} characters",
                TITLE_MIN_CHARS, TITLE_MAX_CHARS
            ),
        );
    }

    match tree.category_id.as_deref().map(str::trim) {
        None | Some("") => report.flag("category", "select a category"),
        Some(id) => {
            if !categories.is_empty() && !categories.iter().any(|c| c.id == id) {
                report.flag("category", "category is not in the supplied list");
            }
        }
    }

    if trimmed_len(&tree.description) < DESCRIPTION_MIN_CHARS {
        report.flag(
            "description",
            format!("description must be at least {} characters", DESCRIPTION_MIN_CHARS),
        );
    }
    if trimmed_len(&tree.benefits) < BENEFITS_MIN_CHARS {
        report.flag(
            "benefits",
            format!("benefits must be at least {} characters", BENEFITS_MIN_CHARS),
        );
    }
    if trimmed_len(&tree.requirements) < REQUIREMENTS_MIN_CHARS {
        report.flag(
            "requirements",
            format!(
                "requirements must be at least {} characters",
                REQUIREMENTS_MIN_CHARS
            ),
        );
    }

    if !tree.price.is_finite() || tree.price < 0.0 {
        report.flag("price", "price must be a non-negative number");
    }

    match &tree.thumbnail {
        None => report.flag("thumbnail", "add a thumbnail image"),
        // The type check only applies to staged files; an existing
        // thumbnail already passed it when it was first uploaded.
        Some(thumb) if !thumb.is_existing() => {
            if !THUMBNAIL_IMAGE_TYPES
                .iter()
                .any(|t| t.eq_ignore_ascii_case(thumb.mime_type.trim()))
            {
                report.flag("thumbnail", "thumbnail must be a JPEG, PNG or WebP image");
            }
        }
        Some(_) => {}
    }

    report
}

fn check_structure(tree: &CurriculumTree) -> ValidationReport {
    let mut report = ValidationReport::new();

    if tree.chapters.is_empty() {
        report.flag("chapters", "add at least one chapter");
        return report;
    }

    for (ci, chapter) in tree.chapters.iter().enumerate() {
        if chapter.title.trim().is_empty() {
            report.flag(format!("chapters[{ci}].title"), "chapter title is required");
        }
        if chapter.description.trim().is_empty() {
            report.flag(
                format!("chapters[{ci}].description"),
                "chapter description is required",
            );
        }
        if chapter.lessons.is_empty() {
            report.flag(
                format!("chapters[{ci}].lessons"),
                "every chapter needs at least one lesson",
            );
        }
        for (li, lesson) in chapter.lessons.iter().enumerate() {
            if lesson.title.trim().is_empty() {
                report.flag(
                    format!("chapters[{ci}].lessons[{li}].title"),
                    "lesson title is required",
                );
            }
            if lesson.description.trim().is_empty() {
                report.flag(
                    format!("chapters[{ci}].lessons[{li}].description"),
                    "lesson description is required",
                );
            }
        }
    }

    report
}

/// Pure and side-effect free: never mutates the tree, returns the same
/// report for the same inputs.
pub fn validate(
    step: Step,
    tree: &CurriculumTree,
    categories: &[CategoryRef],
) -> ValidationReport {
    match step {
        Step::Metadata => check_metadata(tree, categories),
        Step::Structure => check_structure(tree),
    }
}
