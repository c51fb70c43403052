//! No partial commits: whichever operation fails, the file keeps its bytes.

use agent_edit::{EditEngine, EditErrorKind, EditOperation, EditRequest, EngineOptions};
use proptest::prelude::*;
use std::fs;
use tempfile::TempDir;

/// Ways an operation can be made to fail against the token file.
#[derive(Debug, Clone, Copy)]
enum Failure {
    Missing,
    Identical,
    WrongExpectation,
    CreateExisting,
}

impl Failure {
    fn operation(self, k: usize) -> EditOperation {
        match self {
            Failure::Missing => EditOperation::new(format!("missing{k}"), "x"),
            Failure::Identical => EditOperation::new(format!("t{k}"), format!("t{k}")),
            Failure::WrongExpectation => EditOperation::new(format!("t{k}"), "x").expect(2),
            Failure::CreateExisting => EditOperation::create("x"),
        }
    }

    fn kind(self) -> EditErrorKind {
        match self {
            Failure::Missing => EditErrorKind::NoOccurrenceFound,
            Failure::Identical => EditErrorKind::OldNewIdentical,
            Failure::WrongExpectation => EditErrorKind::ExpectedReplacementsMismatch,
            Failure::CreateExisting => EditErrorKind::AttemptCreateExistingFile,
        }
    }
}

fn failure() -> impl Strategy<Value = Failure> {
    prop_oneof![
        Just(Failure::Missing),
        Just(Failure::Identical),
        Just(Failure::WrongExpectation),
        Just(Failure::CreateExisting),
    ]
}

/// `n` operations each renaming a distinct token, plus the matching content.
fn token_request(n: usize) -> (String, Vec<EditOperation>) {
    let content = (0..n)
        .map(|i| format!("t{i};"))
        .collect::<Vec<_>>()
        .join("\n");
    let ops = (0..n)
        .map(|i| EditOperation::new(format!("t{i};"), format!("u{i};")))
        .collect();
    (content, ops)
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 48, .. ProptestConfig::default() })]

    #[test]
    fn proptest_failing_operation_leaves_file_unchanged(
        (n, k) in (1usize..8).prop_flat_map(|n| (Just(n), 0..n)),
        failure in failure(),
    ) {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("tokens.txt");
        let (content, mut ops) = token_request(n);
        fs::write(&file, &content).unwrap();
        ops[k] = failure.operation(k);

        let engine = EditEngine::new(EngineOptions::default());
        let err = engine.apply(&EditRequest::new(&file, ops)).unwrap_err();

        prop_assert_eq!(err.kind(), failure.kind());
        prop_assert_eq!(err.operation_index(), Some(k));
        prop_assert_eq!(fs::read_to_string(&file).unwrap(), content);
        prop_assert_eq!(super::dir_entries(dir.path()), vec!["tokens.txt".to_string()]);
    }

    #[test]
    fn proptest_successful_request_applies_every_operation(n in 1usize..8) {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("tokens.txt");
        let (content, ops) = token_request(n);
        fs::write(&file, &content).unwrap();

        let engine = EditEngine::new(EngineOptions::default());
        let result = engine.apply(&EditRequest::new(&file, ops)).unwrap();

        prop_assert_eq!(result.actual_replacements, n);
        prop_assert_eq!(fs::read_to_string(&file).unwrap(), content.replace('t', "u"));
    }
}
