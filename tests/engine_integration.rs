//! Integration tests for the check engine.
//!
//! These tests drive `TreeOrchestrator` and `CheckStep` against an in-memory
//! content tree and a mock classifier.

use std::sync::Arc;

use serde_json::{json, Value};

use fraudcheck::classifier::mock::MockClassifier;
use fraudcheck::classifier::ClassifierError;
use fraudcheck::content::memory::{ContentOperation, FailOn};
use fraudcheck::content::{ContentError, MemoryContentService};
use fraudcheck::core::config::MapConfigStore;
use fraudcheck::core::types::{CheckResult, ContentPart, DetailOutcome, Node, NodeId};
use fraudcheck::engine::{CheckStep, EngineError, Runtime, StepOutcome, TreeOrchestrator};
use fraudcheck::mapping::{Bindings, ExpressionError, ExpressionEvaluator};

// =============================================================================
// Helpers
// =============================================================================

fn passed() -> CheckResult {
    CheckResult {
        valid: true,
        success: true,
        status_text: "SUCCESS".to_string(),
        details: vec![],
    }
}

fn rejected() -> CheckResult {
    CheckResult {
        valid: false,
        success: true,
        status_text: "SUCCESS".to_string(),
        details: vec![DetailOutcome {
            name: "MRZ".to_string(),
            success: false,
            status_text: "FAILED".to_string(),
            description: "checksum mismatch".to_string(),
        }],
    }
}

fn id(s: &str) -> NodeId {
    NodeId::new(s)
}

fn runtime(content: &MemoryContentService, classifier: &MockClassifier) -> Runtime {
    Runtime::new(Arc::new(content.clone()), Arc::new(classifier.clone()))
}

/// A document leaf with one content part named `<id>.png`.
fn add_document(tree: &MemoryContentService, parent: &str, doc: &str, doc_type: &str) {
    tree.insert_child(&id(parent), Node::leaf(doc, doc, [doc_type]));
    tree.set_content(
        &id(doc),
        vec![ContentPart::new(format!("{}.png", doc), b"\x89PNG".to_vec())],
    );
}

/// folder (FOLDER1)
/// ├── inv (INVOICE)
/// ├── photo (PHOTO)
/// └── sub (SUBFOLDER)
///     └── contract (CONTRACT)
fn case_tree() -> MemoryContentService {
    let tree = MemoryContentService::new();
    tree.insert(Node::container("folder", "Customer folder", ["FOLDER1"]));
    add_document(&tree, "folder", "inv", "INVOICE");
    add_document(&tree, "folder", "photo", "PHOTO");
    tree.insert_child(&id("folder"), Node::container("sub", "Archive", ["SUBFOLDER"]));
    add_document(&tree, "sub", "contract", "CONTRACT");
    tree
}

fn case_config() -> MapConfigStore {
    MapConfigStore::from_pairs([
        ("subscriptionKey", "secret"),
        ("master.FOLDER1.details", "INVOICE, CONTRACT"),
        ("detail.INVOICE.algorithm", "RIB"),
    ])
}

// =============================================================================
// processDetail
// =============================================================================

mod process_detail {
    use super::*;

    #[tokio::test]
    async fn valid_detail_without_rules_writes_nothing() {
        let tree = MemoryContentService::new();
        tree.insert(Node::leaf("inv", "invoice", ["INVOICE"]));
        tree.set_content(&id("inv"), vec![ContentPart::new("invoice.png", b"img".to_vec())]);
        let classifier = MockClassifier::new().with_result(passed());
        let store = MapConfigStore::from_pairs([("detail.INVOICE.algorithm", "RIB")]);
        let rt = runtime(&tree, &classifier);
        let orchestrator = TreeOrchestrator::new(&rt, &store);

        let detail = Node::leaf("inv", "invoice", ["INVOICE"]);
        let valid = orchestrator.process_detail(&detail, &detail).await.unwrap();

        assert!(valid);
        assert_eq!(classifier.calls().len(), 1);
        assert_eq!(classifier.calls()[0].algorithm, "RIB");
        assert_eq!(tree.write_count(), 0);
    }

    #[tokio::test]
    async fn algorithm_defaults_to_all() {
        let tree = MemoryContentService::new();
        tree.insert(Node::leaf("doc", "doc", ["SCAN"]));
        tree.set_content(&id("doc"), vec![ContentPart::new("doc.jpg", vec![1])]);
        let classifier = MockClassifier::new().with_result(passed());
        let store = MapConfigStore::new();
        let rt = runtime(&tree, &classifier);

        let detail = Node::leaf("doc", "doc", ["SCAN"]);
        TreeOrchestrator::new(&rt, &store)
            .process_detail(&detail, &detail)
            .await
            .unwrap();

        assert_eq!(classifier.calls()[0].algorithm, "ALL");
    }

    #[tokio::test]
    async fn invalid_rule_is_skipped_and_valid_rule_written() {
        let tree = MemoryContentService::new();
        tree.insert(Node::leaf("inv", "invoice", ["INVOICE"]));
        tree.set_content(&id("inv"), vec![ContentPart::new("invoice.png", vec![0])]);
        let classifier = MockClassifier::new().with_result(rejected());
        let store = MapConfigStore::from_pairs([
            ("mapping.detail.INVOICE.broken", "result.valid &&"),
            ("mapping.detail.INVOICE.fraudChecked", "true"),
            ("mapping.detail.INVOICE.fraudValid", "result.valid"),
        ]);
        let rt = runtime(&tree, &classifier);

        let detail = Node::leaf("inv", "invoice", ["INVOICE"]);
        let valid = TreeOrchestrator::new(&rt, &store)
            .process_detail(&detail, &detail)
            .await
            .unwrap();

        assert!(!valid);
        let props = tree.properties(&id("inv"));
        assert_eq!(props.get("fraudChecked"), Some(&json!(true)));
        assert_eq!(props.get("fraudValid"), Some(&json!(false)));
        assert!(!props.contains_key("broken"));
        assert_eq!(tree.write_count(), 1);
    }

    #[tokio::test]
    async fn rules_see_details_and_status() {
        let tree = MemoryContentService::new();
        tree.insert(Node::leaf("inv", "invoice", ["INVOICE"]));
        tree.set_content(&id("inv"), vec![ContentPart::new("invoice.png", vec![0])]);
        let classifier = MockClassifier::new().with_result(rejected());
        let store = MapConfigStore::from_pairs([
            ("mapping.detail.*.firstFailure", "result.details[0].name + ': ' + result.details[0].description"),
            ("mapping.detail.*.status", "result.statusText"),
            ("mapping.detail.*.failures", "result.details.length"),
        ]);
        let rt = runtime(&tree, &classifier);

        let detail = Node::leaf("inv", "invoice", ["INVOICE"]);
        TreeOrchestrator::new(&rt, &store)
            .process_detail(&detail, &detail)
            .await
            .unwrap();

        let props = tree.properties(&id("inv"));
        assert_eq!(props["firstFailure"], json!("MRZ: checksum mismatch"));
        assert_eq!(props["status"], json!("SUCCESS"));
        assert_eq!(props["failures"], json!(1));
    }

    #[tokio::test]
    async fn specific_rules_override_wildcards() {
        let tree = MemoryContentService::new();
        tree.insert(Node::leaf("inv", "invoice", ["INVOICE"]));
        tree.set_content(&id("inv"), vec![ContentPart::new("invoice.png", vec![0])]);
        let classifier = MockClassifier::new().with_result(passed());
        let store = MapConfigStore::from_pairs([
            ("mapping.detail.*.origin", "'global'"),
            ("mapping.detail.INVOICE.origin", "'detail'"),
            ("mapping.master.FOLDER1.detail.*.origin", "'master'"),
            ("mapping.master.FOLDER1.detail.INVOICE.origin", "'pair'"),
            ("mapping.detail.*.onlyGlobal", "'global'"),
        ]);
        let rt = runtime(&tree, &classifier);

        let master = Node::container("folder", "folder", ["FOLDER1"]);
        let detail = Node::leaf("inv", "invoice", ["INVOICE"]);
        TreeOrchestrator::new(&rt, &store)
            .process_detail(&master, &detail)
            .await
            .unwrap();

        let props = tree.properties(&id("inv"));
        assert_eq!(props["origin"], json!("pair"));
        assert_eq!(props["onlyGlobal"], json!("global"));
    }

    #[tokio::test]
    async fn container_detail_checks_its_first_child() {
        let tree = MemoryContentService::new();
        tree.insert(Node::container("bundle", "bundle", ["INVOICE"]));
        add_document(&tree, "bundle", "page1", "PAGE");
        add_document(&tree, "bundle", "page2", "PAGE");
        let classifier = MockClassifier::new().with_result(passed());
        let store = MapConfigStore::new();
        let rt = runtime(&tree, &classifier);

        let detail = Node::container("bundle", "bundle", ["INVOICE"]);
        assert!(TreeOrchestrator::new(&rt, &store)
            .process_detail(&detail, &detail)
            .await
            .unwrap());

        let calls = classifier.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].filename, "page1.png");
    }

    #[tokio::test]
    async fn empty_container_detail_is_invalid_without_call() {
        let tree = MemoryContentService::new();
        tree.insert(Node::container("bundle", "bundle", ["INVOICE"]));
        let classifier = MockClassifier::new().with_result(passed());
        let store = MapConfigStore::from_pairs([("mapping.detail.*.fraudValid", "result.valid")]);
        let rt = runtime(&tree, &classifier);

        let detail = Node::container("bundle", "bundle", ["INVOICE"]);
        let valid = TreeOrchestrator::new(&rt, &store)
            .process_detail(&detail, &detail)
            .await
            .unwrap();

        assert!(!valid);
        assert!(classifier.calls().is_empty());
        assert_eq!(tree.properties(&id("bundle"))["fraudValid"], json!(false));
    }

    #[tokio::test]
    async fn only_first_content_part_is_sent() {
        let tree = MemoryContentService::new();
        tree.insert(Node::leaf("doc", "doc", ["INVOICE"]));
        tree.set_content(
            &id("doc"),
            vec![
                ContentPart::new("recto.png", vec![1, 2, 3]),
                ContentPart::new("verso.png", vec![4]),
            ],
        );
        let classifier = MockClassifier::new().with_result(passed());
        let store = MapConfigStore::new();
        let rt = runtime(&tree, &classifier);

        let detail = Node::leaf("doc", "doc", ["INVOICE"]);
        TreeOrchestrator::new(&rt, &store)
            .process_detail(&detail, &detail)
            .await
            .unwrap();

        let calls = classifier.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].filename, "recto.png");
        assert_eq!(calls[0].size, 3);
    }

    /// Answers every rule with the same value.
    struct FixedEvaluator(Value);

    impl ExpressionEvaluator for FixedEvaluator {
        fn evaluate(&self, _source: &str, _bindings: &Bindings) -> Result<Value, ExpressionError> {
            Ok(self.0.clone())
        }
    }

    #[tokio::test]
    async fn injected_evaluator_produces_properties() {
        let tree = MemoryContentService::new();
        tree.insert(Node::leaf("inv", "invoice", ["INVOICE"]));
        tree.set_content(&id("inv"), vec![ContentPart::new("invoice.png", b"img".to_vec())]);
        let classifier = MockClassifier::new().with_result(passed());
        let store = MapConfigStore::from_pairs([("mapping.detail.*.fraudStatus", "ignored(")]);
        let rt = runtime(&tree, &classifier)
            .with_evaluator(Arc::new(FixedEvaluator(json!("stubbed"))));

        let detail = Node::leaf("inv", "invoice", ["INVOICE"]);
        let valid = TreeOrchestrator::new(&rt, &store)
            .process_detail(&detail, &detail)
            .await
            .unwrap();

        assert!(valid);
        assert_eq!(tree.properties(&id("inv"))["fraudStatus"], json!("stubbed"));
    }
}

// =============================================================================
// check_node
// =============================================================================

mod check_node {
    use super::*;

    #[tokio::test]
    async fn absent_node_is_invalid_without_call() {
        let tree = MemoryContentService::new();
        let classifier = MockClassifier::new().with_result(passed());
        let store = MapConfigStore::new();
        let rt = runtime(&tree, &classifier);

        let result = TreeOrchestrator::new(&rt, &store)
            .check_node("ALL", None)
            .await
            .unwrap();

        assert!(!result.valid);
        assert!(!result.success);
        assert!(classifier.calls().is_empty());
        assert!(tree.operations().is_empty());
    }

    #[tokio::test]
    async fn document_without_content_is_invalid_without_call() {
        let tree = MemoryContentService::new();
        tree.insert(Node::leaf("doc", "doc", ["INVOICE"]));
        let classifier = MockClassifier::new().with_result(passed());
        let store = MapConfigStore::new();
        let rt = runtime(&tree, &classifier);

        let node = Node::leaf("doc", "doc", ["INVOICE"]);
        let result = TreeOrchestrator::new(&rt, &store)
            .check_node("ALL", Some(&node))
            .await
            .unwrap();

        assert!(!result.valid);
        assert!(classifier.calls().is_empty());
    }

    #[tokio::test]
    async fn container_that_contains_itself_is_an_error() {
        let tree = MemoryContentService::new();
        tree.insert(Node::container("loop", "loop", ["FOLDER1"]));
        tree.insert_child(&id("loop"), Node::container("loop", "loop", ["FOLDER1"]));
        let classifier = MockClassifier::new().with_result(passed());
        let store = MapConfigStore::new();
        let rt = runtime(&tree, &classifier);

        let node = Node::container("loop", "loop", ["FOLDER1"]);
        let err = TreeOrchestrator::new(&rt, &store)
            .check_node("ALL", Some(&node))
            .await
            .unwrap_err();

        assert!(matches!(err, EngineError::Content(ContentError::Cycle(ref n)) if n == &id("loop")));
        assert!(classifier.calls().is_empty());
    }
}

// =============================================================================
// processTree / processMaster
// =============================================================================

mod traversal {
    use super::*;

    #[tokio::test]
    async fn only_configured_detail_types_are_checked() {
        let tree = MemoryContentService::new();
        tree.insert(Node::container("folder", "folder", ["FOLDER1"]));
        add_document(&tree, "folder", "inv", "INVOICE");
        add_document(&tree, "folder", "photo", "PHOTO");
        let classifier = MockClassifier::new().with_result(passed());
        let store = MapConfigStore::from_pairs([("master.FOLDER1.details", "INVOICE,CONTRACT")]);
        let rt = runtime(&tree, &classifier);

        let valid = TreeOrchestrator::new(&rt, &store)
            .process_master(&id("folder"))
            .await
            .unwrap();

        assert!(valid);
        let calls = classifier.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].filename, "inv.png");
    }

    #[tokio::test]
    async fn nested_details_are_found() {
        let tree = case_tree();
        let classifier = MockClassifier::new().with_result(passed());
        let store = case_config();
        let rt = runtime(&tree, &classifier);

        assert!(TreeOrchestrator::new(&rt, &store)
            .process_master(&id("folder"))
            .await
            .unwrap());

        let files: Vec<_> = classifier.calls().into_iter().map(|c| c.filename).collect();
        assert_eq!(files, vec!["inv.png", "contract.png"]);
        assert_eq!(classifier.calls()[0].algorithm, "RIB");
        assert_eq!(classifier.calls()[1].algorithm, "ALL");
    }

    #[tokio::test]
    async fn one_invalid_detail_fails_master_but_all_are_checked() {
        let tree = case_tree();
        let classifier = MockClassifier::new()
            .with_result(passed())
            .with_result_for("inv.png", rejected());
        let store = {
            let mut s = case_config();
            s.insert("mapping.detail.*.fraudValid", "result.valid");
            s
        };
        let rt = runtime(&tree, &classifier);

        let valid = TreeOrchestrator::new(&rt, &store)
            .process_master(&id("folder"))
            .await
            .unwrap();

        assert!(!valid);
        assert_eq!(classifier.calls().len(), 2);
        assert_eq!(tree.properties(&id("inv"))["fraudValid"], json!(false));
        assert_eq!(tree.properties(&id("contract"))["fraudValid"], json!(true));
    }

    #[tokio::test]
    async fn container_without_matches_is_true() {
        let tree = MemoryContentService::new();
        tree.insert(Node::container("folder", "folder", ["FOLDER1"]));
        tree.insert_child(&id("folder"), Node::container("empty", "empty", ["SUBFOLDER"]));
        add_document(&tree, "folder", "photo", "PHOTO");
        let classifier = MockClassifier::new();
        let store = MapConfigStore::from_pairs([("master.FOLDER1.details", "INVOICE")]);
        let rt = runtime(&tree, &classifier);

        assert!(TreeOrchestrator::new(&rt, &store)
            .process_master(&id("folder"))
            .await
            .unwrap());
        assert!(classifier.calls().is_empty());
    }

    #[tokio::test]
    async fn master_without_detail_config_is_its_own_detail() {
        let tree = MemoryContentService::new();
        tree.insert(Node::container("folder", "folder", ["FOLDER2"]));
        add_document(&tree, "folder", "inv", "INVOICE");
        let classifier = MockClassifier::new().with_result(passed());
        let store = MapConfigStore::from_pairs([("mapping.detail.*.checked", "true")]);
        let rt = runtime(&tree, &classifier);

        assert!(TreeOrchestrator::new(&rt, &store)
            .process_master(&id("folder"))
            .await
            .unwrap());

        // The container is checked through its first child; properties land on the master.
        assert_eq!(classifier.calls()[0].filename, "inv.png");
        assert_eq!(tree.properties(&id("folder"))["checked"], json!(true));
        assert!(tree.properties(&id("inv")).is_empty());
    }

    #[tokio::test]
    async fn leaf_master_is_checked_directly() {
        let tree = MemoryContentService::new();
        tree.insert(Node::leaf("doc", "doc", ["FOLDER1"]));
        tree.set_content(&id("doc"), vec![ContentPart::new("doc.pdf", vec![1])]);
        let classifier = MockClassifier::new().with_result(passed());
        let store = MapConfigStore::from_pairs([("master.FOLDER1.details", "INVOICE")]);
        let rt = runtime(&tree, &classifier);

        assert!(TreeOrchestrator::new(&rt, &store)
            .process_master(&id("doc"))
            .await
            .unwrap());
        assert_eq!(classifier.calls().len(), 1);
        assert!(!tree
            .operations()
            .iter()
            .any(|op| matches!(op, ContentOperation::ChildItems { .. })));
    }

    #[tokio::test]
    async fn missing_master_is_an_error() {
        let tree = MemoryContentService::new();
        let classifier = MockClassifier::new();
        let store = MapConfigStore::new();
        let rt = runtime(&tree, &classifier);

        let err = TreeOrchestrator::new(&rt, &store)
            .process_master(&id("nope"))
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Content(ContentError::NotFound(_))));
    }

    #[tokio::test]
    async fn classifier_failure_aborts() {
        let tree = case_tree();
        let classifier = MockClassifier::new().fail_with(ClassifierError::Api {
            status: 401,
            message: "bad key".to_string(),
        });
        let store = case_config();
        let rt = runtime(&tree, &classifier);

        let err = TreeOrchestrator::new(&rt, &store)
            .process_master(&id("folder"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::Classifier(ClassifierError::Api { status: 401, .. })
        ));
        assert_eq!(classifier.calls().len(), 1);
    }

    #[tokio::test]
    async fn property_write_failure_aborts() {
        let tree = case_tree().fail_on(FailOn::ModifyProperties(ContentError::Backend(
            "read-only".to_string(),
        )));
        let classifier = MockClassifier::new().with_result(passed());
        let store = {
            let mut s = case_config();
            s.insert("mapping.detail.*.checked", "true");
            s
        };
        let rt = runtime(&tree, &classifier);

        let err = TreeOrchestrator::new(&rt, &store)
            .process_master(&id("folder"))
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Content(ContentError::Backend(_))));
    }

    #[tokio::test]
    async fn cyclic_tree_is_an_error() {
        // f1 -> f2 -> f1
        let tree = MemoryContentService::new();
        tree.insert(Node::container("f1", "outer", ["FOLDER1"]));
        tree.insert_child(&id("f1"), Node::container("f2", "inner", ["SUBFOLDER"]));
        add_document(&tree, "f2", "inv", "INVOICE");
        tree.insert_child(&id("f2"), Node::container("f1", "outer", ["FOLDER1"]));
        let classifier = MockClassifier::new().with_result(passed());
        let store = case_config();
        let rt = runtime(&tree, &classifier);

        let err = TreeOrchestrator::new(&rt, &store)
            .process_master(&id("f1"))
            .await
            .unwrap_err();

        assert!(matches!(err, EngineError::Content(ContentError::Cycle(ref n)) if n == &id("f1")));
        assert_eq!(classifier.calls().len(), 1);
    }

    #[tokio::test]
    async fn shared_subfolder_is_visited_twice() {
        let tree = MemoryContentService::new();
        tree.insert(Node::container("folder", "folder", ["FOLDER1"]));
        tree.insert_child(&id("folder"), Node::container("a", "a", ["SUBFOLDER"]));
        tree.insert_child(&id("folder"), Node::container("b", "b", ["SUBFOLDER"]));
        tree.insert_child(&id("a"), Node::container("shared", "shared", ["SUBFOLDER"]));
        tree.insert_child(&id("b"), Node::container("shared", "shared", ["SUBFOLDER"]));
        add_document(&tree, "shared", "inv", "INVOICE");
        let classifier = MockClassifier::new().with_result(passed());
        let store = case_config();
        let rt = runtime(&tree, &classifier);

        let valid = TreeOrchestrator::new(&rt, &store)
            .process_master(&id("folder"))
            .await
            .unwrap();

        assert!(valid);
        assert_eq!(classifier.calls().len(), 2);
    }
}

// =============================================================================
// CheckStep
// =============================================================================

mod step {
    use super::*;

    fn two_folders() -> MemoryContentService {
        let tree = MemoryContentService::new();
        tree.insert(Node::container("a", "a", ["FOLDER1"]));
        add_document(&tree, "a", "a-inv", "INVOICE");
        tree.insert(Node::container("b", "b", ["FOLDER1"]));
        add_document(&tree, "b", "b-inv", "INVOICE");
        tree
    }

    #[tokio::test]
    async fn all_valid_completes() {
        let tree = two_folders();
        let classifier = MockClassifier::new().with_result(passed());
        let store = case_config();
        let rt = runtime(&tree, &classifier);

        let outcome = CheckStep::new(&rt, &store, Some("FRAUD".to_string()))
            .execute(&[id("a"), id("b")])
            .await
            .unwrap();

        assert_eq!(outcome, StepOutcome::Complete { passed: true });
    }

    #[tokio::test]
    async fn invalid_with_error_code_fails_after_checking_every_root() {
        let tree = two_folders();
        let classifier = MockClassifier::new()
            .with_result(passed())
            .with_result_for("a-inv.png", rejected());
        let store = case_config();
        let rt = runtime(&tree, &classifier);

        let outcome = CheckStep::new(&rt, &store, Some("FRAUD".to_string()))
            .execute(&[id("a"), id("b")])
            .await
            .unwrap();

        assert_eq!(
            outcome,
            StepOutcome::Fail {
                error_code: "FRAUD".to_string()
            }
        );
        assert_eq!(classifier.calls().len(), 2);
    }

    #[tokio::test]
    async fn invalid_without_error_code_completes() {
        let tree = two_folders();
        let classifier = MockClassifier::new().with_result(rejected());
        let store = case_config();
        let rt = runtime(&tree, &classifier);

        for code in [None, Some(String::new())] {
            let outcome = CheckStep::new(&rt, &store, code)
                .execute(&[id("a")])
                .await
                .unwrap();
            assert_eq!(outcome, StepOutcome::Complete { passed: false });
        }
    }

    #[tokio::test]
    async fn no_roots_passes() {
        let tree = MemoryContentService::new();
        let classifier = MockClassifier::new();
        let store = MapConfigStore::new();
        let rt = runtime(&tree, &classifier);

        let outcome = CheckStep::new(&rt, &store, Some("FRAUD".to_string()))
            .execute(&[])
            .await
            .unwrap();
        assert!(outcome.passed());
    }
}
