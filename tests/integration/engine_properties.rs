//! Behavioral properties of a full request: planning, diffing and committing.

use super::dir_entries;
use agent_edit::{
    atomic, EditEngine, EditErrorKind, EditOperation, EditRequest, EngineOptions, IoStage,
    PlannerOptions,
};
use std::fs;
use tempfile::TempDir;

fn engine() -> EditEngine {
    EditEngine::new(EngineOptions::default())
}

#[test]
fn test_operations_see_previous_results() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("seq.txt");
    fs::write(&file, "A B").unwrap();

    let request = EditRequest::new(
        &file,
        vec![EditOperation::new("A", "C"), EditOperation::new("C B", "D")],
    );
    let result = engine().apply(&request).unwrap();

    assert_eq!(fs::read_to_string(&file).unwrap(), "D");
    assert_eq!(result.actual_replacements, 2);
}

#[test]
fn test_create_then_edit_in_one_request() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("new.rs");

    let request = EditRequest::new(
        &file,
        vec![
            EditOperation::create("fn main() {\n    todo!()\n}\n"),
            EditOperation::new("todo!()", "println!(\"hi\")"),
        ],
    );
    let result = engine().apply(&request).unwrap();

    assert!(result.created);
    assert_eq!(result.actual_replacements, 1);
    assert!(result.message.contains("1 replacement(s) applied after creation"));
    assert_eq!(
        fs::read_to_string(&file).unwrap(),
        "fn main() {\n    println!(\"hi\")\n}\n"
    );
}

#[test]
fn test_create_existing_file_rejected() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("exists.txt");
    fs::write(&file, "keep").unwrap();

    let err = engine()
        .apply(&EditRequest::single(&file, EditOperation::create("X")))
        .unwrap_err();

    assert_eq!(err.kind(), EditErrorKind::AttemptCreateExistingFile);
    assert_eq!(err.kind().code(), "ATTEMPT_TO_CREATE_EXISTING_FILE");
    assert!(err.to_string().starts_with("File exists"));
    assert_eq!(fs::read_to_string(&file).unwrap(), "keep");
}

#[test]
fn test_missing_file_without_creation() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("absent.txt");

    let err = engine()
        .apply(&EditRequest::single(&file, EditOperation::new("a", "b")))
        .unwrap_err();

    assert_eq!(err.kind(), EditErrorKind::NotFound);
    assert_eq!(err.operation_index(), Some(0));
    assert!(!file.exists());
}

#[test]
fn test_expectation_mismatch_writes_nothing() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("a.txt");
    fs::write(&file, "a a a").unwrap();

    let request = EditRequest::single(&file, EditOperation::new("a", "b").expect(2));
    let err = engine().apply(&request).unwrap_err();

    match &err {
        agent_edit::EditError::ExpectedReplacementsMismatch {
            expected, actual, ..
        } => {
            assert_eq!(*expected, 2);
            assert_eq!(*actual, 3);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(fs::read_to_string(&file).unwrap(), "a a a");
}

#[test]
fn test_diff_single_hunk() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("foo.txt");
    fs::write(&file, "foo\n").unwrap();

    let result = engine()
        .apply(&EditRequest::single(&file, EditOperation::new("foo", "bar")))
        .unwrap();

    assert_eq!(result.diff.matches("@@ ").count(), 1);
    assert!(result.diff.contains("\n-foo\n"));
    assert!(result.diff.contains("\n+bar\n"));
    assert!(result.diff.contains(&file.display().to_string()));
}

#[test]
fn test_directory_target_fails_first() {
    let dir = TempDir::new().unwrap();
    let target = dir.path().join("sub");
    fs::create_dir(&target).unwrap();

    // The operation itself would also be rejected; the directory check wins.
    let request = EditRequest::single(&target, EditOperation::new("same", "same"));
    let err = engine().apply(&request).unwrap_err();

    assert_eq!(err.kind(), EditErrorKind::FileIsDirectory);
    assert!(err.to_string().starts_with("Is a directory"));
}

#[test]
fn test_non_utf8_file_is_io_error() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("bin.dat");
    fs::write(&file, [0xff, 0xfe, 0x00]).unwrap();

    let err = engine()
        .apply(&EditRequest::single(&file, EditOperation::new("a", "b")))
        .unwrap_err();

    assert_eq!(err.kind(), EditErrorKind::IoError);
    assert_eq!(err.io_stage(), Some(IoStage::Read));
}

#[test]
fn test_no_temp_files_left_behind() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("a.txt");
    fs::write(&file, "one two").unwrap();

    engine()
        .apply(&EditRequest::single(&file, EditOperation::new("one", "1")))
        .unwrap();
    engine()
        .apply(&EditRequest::single(&file, EditOperation::new("missing", "x")))
        .unwrap_err();

    assert_eq!(dir_entries(dir.path()), vec!["a.txt".to_string()]);
}

#[test]
fn test_commit_round_trip() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("bytes.txt");
    let content = "line one\r\nline two\n\u{1F980} trailing";

    atomic::commit(&file, content.as_bytes()).unwrap();
    assert_eq!(fs::read(&file).unwrap(), content.as_bytes());
}

#[test]
fn test_unescape_fallback_opt_in() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("a.txt");
    fs::write(&file, "first\nsecond\n").unwrap();
    let request = EditRequest::single(&file, EditOperation::new(r"first\nsecond", r"one\ntwo"));

    let strict = engine().apply(&request).unwrap_err();
    assert_eq!(strict.kind(), EditErrorKind::NoOccurrenceFound);

    let lenient = EditEngine::new(EngineOptions {
        planner: PlannerOptions {
            unescape_fallback: true,
        },
        ..EngineOptions::default()
    });
    lenient.apply(&request).unwrap();
    assert_eq!(fs::read_to_string(&file).unwrap(), "one\ntwo\n");
}
