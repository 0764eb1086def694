use focusgate::{ExecutionRequest, TestVector};
use serde_json::json;

use crate::{require_program, runner};

#[tokio::test]
async fn passing_vectors_produce_a_full_report() {
    require_program!("node");

    let request = ExecutionRequest::new(
        "javascript",
        "function add(a, b) {\n    return a + b;\n}\n",
        "add",
    )
    .with_vectors(vec![
        TestVector::new(json!([2, 3]), json!(5)),
        TestVector::new(json!(["ab", "cd"]), json!("abcd")),
    ]);

    let outcome = runner().run_tests(&request).await;
    assert!(outcome.success, "unexpected failure: {:?}", outcome.error);
    assert_eq!(outcome.results.len(), 2);
    assert!(outcome.results.iter().all(|case| case.passed));
    assert_eq!(outcome.results[1].actual, json!("abcd"));
}

#[tokio::test]
async fn a_throwing_vector_fails_alone() {
    require_program!("node");

    let source = "function pick(items, index) {\n    if (index >= items.length) {\n        throw new Error(\"out of range\");\n    }\n    return items[index];\n}\n";
    let request = ExecutionRequest::new("javascript", source, "pick").with_vectors(vec![
        TestVector::new(json!([["a", "b"], 1]), json!("b")),
        TestVector::new(json!([["a", "b"], 5]), json!("?")),
    ]);

    let outcome = runner().run_tests(&request).await;
    assert!(!outcome.success);
    assert_eq!(outcome.error, None);
    assert!(outcome.results[0].passed);
    assert!(!outcome.results[1].passed);
    assert!(outcome.results[1].log.contains("out of range"));
}

#[tokio::test]
async fn an_undefined_return_is_reported_as_null() {
    require_program!("node");

    let request = ExecutionRequest::new(
        "javascript",
        "function noop() {\n}\n",
        "noop",
    )
    .with_vectors(vec![TestVector::new(json!([]), json!(null))]);

    let outcome = runner().run_tests(&request).await;
    assert!(outcome.success, "unexpected failure: {:?}", outcome.error);
    assert_eq!(outcome.results[0].actual, json!(null));
    assert!(outcome.results[0].passed);
}
