mod test_support;

use serde_json::json;
use test_support::{categories, request_err, request_ok, spawn_sidecar};

const DOC_SIZE_CEILING: u64 = 50 * 1024 * 1024;

fn open_structure_session(
    stdin: &mut std::process::ChildStdin,
    reader: &mut std::io::BufReader<std::process::ChildStdout>,
) -> (String, String) {
    let _ = request_ok(
        stdin,
        reader,
        "s1",
        "session.openCreate",
        json!({ "categories": categories() }),
    );
    let chapter = request_ok(
        stdin,
        reader,
        "s2",
        "chapters.add",
        json!({ "title": "Intro", "description": "Start" }),
    );
    let chapter_id = chapter
        .get("chapterId")
        .and_then(|v| v.as_str())
        .expect("chapterId")
        .to_string();
    let lesson = request_ok(
        stdin,
        reader,
        "s3",
        "lessons.add",
        json!({ "chapterId": chapter_id, "title": "Welcome", "description": "Hello" }),
    );
    let lesson_id = lesson
        .get("lessonId")
        .and_then(|v| v.as_str())
        .expect("lessonId")
        .to_string();
    (chapter_id, lesson_id)
}

#[test]
fn attachment_batch_keeps_valid_files_and_reports_the_oversized_one() {
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    let (_chapter_id, lesson_id) = open_structure_session(&mut stdin, &mut reader);

    let added = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "attachments.add",
        json!({
            "lessonId": lesson_id,
            "kind": "document",
            "files": [
                { "name": "a.pdf", "size": 1024, "mimeType": "application/pdf",
                  "fileRef": "blob:a", "previewRef": "preview:a" },
                { "name": "huge.pdf", "size": DOC_SIZE_CEILING + 1,
                  "mimeType": "application/pdf", "fileRef": "blob:huge" },
                { "name": "b.pdf", "size": 2048, "mimeType": "application/pdf",
                  "fileRef": "blob:b" }
            ]
        }),
    );
    let staged = added.get("staged").and_then(|v| v.as_array()).unwrap();
    let rejected = added.get("rejected").and_then(|v| v.as_array()).unwrap();
    assert_eq!(staged.len(), 2);
    assert_eq!(rejected.len(), 1);
    assert_eq!(
        rejected[0].get("name").and_then(|v| v.as_str()),
        Some("huge.pdf")
    );
    assert_eq!(
        rejected[0].get("reason").and_then(|v| v.as_str()),
        Some("too_large")
    );

    // Removing a staged attachment reports its preview for revocation.
    let first_id = staged[0]
        .get("attachmentId")
        .and_then(|v| v.as_str())
        .unwrap()
        .to_string();
    let removed = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "attachments.remove",
        json!({ "lessonId": lesson_id, "attachmentId": first_id }),
    );
    assert_eq!(
        removed.get("releasedPreviews").and_then(|v| v.as_array()),
        Some(&vec![json!("preview:a")])
    );
}

#[test]
fn removing_a_chapter_cascades_to_lessons_and_attachments() {
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    let (chapter_id, lesson_id) = open_structure_session(&mut stdin, &mut reader);

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "attachments.add",
        json!({
            "lessonId": lesson_id,
            "kind": "video",
            "files": [{ "name": "intro.mp4", "size": 9000, "mimeType": "video/mp4",
                        "fileRef": "blob:intro", "previewRef": "preview:intro" }]
        }),
    );

    let removed = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "chapters.remove",
        json!({ "chapterId": chapter_id }),
    );
    assert_eq!(
        removed.get("releasedPreviews").and_then(|v| v.as_array()),
        Some(&vec![json!("preview:intro")])
    );

    let course = request_ok(&mut stdin, &mut reader, "3", "course.get", json!({}));
    assert_eq!(
        course
            .pointer("/course/chapters")
            .and_then(|v| v.as_array())
            .map(|a| a.len()),
        Some(0)
    );

    let error = request_err(
        &mut stdin,
        &mut reader,
        "4",
        "lessons.update",
        json!({ "lessonId": lesson_id, "patch": { "title": "Orphan?" } }),
    );
    assert_eq!(error.get("code").and_then(|v| v.as_str()), Some("not_found"));
}

#[test]
fn reorder_applies_and_rejects_partial_orders() {
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    let (first, _lesson) = open_structure_session(&mut stdin, &mut reader);

    let second = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "chapters.add",
        json!({ "title": "Advanced", "description": "Deep end" }),
    )
    .get("chapterId")
    .and_then(|v| v.as_str())
    .unwrap()
    .to_string();

    let error = request_err(
        &mut stdin,
        &mut reader,
        "2",
        "chapters.reorder",
        json!({ "chapterIdOrder": [second] }),
    );
    assert_eq!(error.get("code").and_then(|v| v.as_str()), Some("bad_params"));

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "chapters.reorder",
        json!({ "chapterIdOrder": [second, first] }),
    );
    let course = request_ok(&mut stdin, &mut reader, "4", "course.get", json!({}));
    assert_eq!(
        course
            .pointer("/course/chapters/0/title")
            .and_then(|v| v.as_str()),
        Some("Advanced")
    );
}

#[test]
fn unsupported_attachment_type_is_rejected_without_aborting_the_batch() {
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    let (_chapter_id, lesson_id) = open_structure_session(&mut stdin, &mut reader);

    let added = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "attachments.add",
        json!({
            "lessonId": lesson_id,
            "kind": "video",
            "files": [
                { "name": "talk.mp4", "size": 5000, "mimeType": "video/mp4",
                  "fileRef": "blob:talk" },
                { "name": "talk.avi", "size": 5000, "mimeType": "video/x-msvideo",
                  "fileRef": "blob:avi" }
            ]
        }),
    );
    assert_eq!(
        added.get("staged").and_then(|v| v.as_array()).map(|a| a.len()),
        Some(1)
    );
    assert_eq!(
        added
            .pointer("/rejected/0/reason")
            .and_then(|v| v.as_str()),
        Some("unsupported_type")
    );
}
