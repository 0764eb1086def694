use focusgate::{ExecutionRequest, TestVector};
use serde_json::json;

use crate::{require_program, runner};

#[tokio::test]
async fn passing_vectors_produce_a_full_report() {
    require_program!("php");

    let request = ExecutionRequest::new(
        "php",
        "function add($a, $b) {\n    return $a + $b;\n}\n",
        "add",
    )
    .with_vectors(vec![
        TestVector::new(json!([2, 3]), json!(5)),
        TestVector::new(json!([10, -4]), json!(6)),
    ]);

    let outcome = runner().run_tests(&request).await;
    assert!(outcome.success, "unexpected failure: {:?}", outcome.error);
    assert_eq!(outcome.results.len(), 2);
    assert!(outcome.results.iter().all(|case| case.passed));
    assert_eq!(outcome.results[0].actual, json!(5));
}

#[tokio::test]
async fn a_throwing_vector_fails_alone() {
    require_program!("php");

    let source = "function reciprocal($n) {\n    if ($n === 0) {\n        throw new InvalidArgumentException(\"zero has no reciprocal\");\n    }\n    return intdiv(100, $n);\n}\n";
    let request = ExecutionRequest::new("php", source, "reciprocal").with_vectors(vec![
        TestVector::new(json!(4), json!(25)),
        TestVector::new(json!(0), json!(0)),
    ]);

    let outcome = runner().run_tests(&request).await;
    assert!(!outcome.success);
    assert_eq!(outcome.error, None);
    assert!(outcome.results[0].passed);
    assert!(!outcome.results[1].passed);
    assert!(outcome.results[1].log.contains("zero has no reciprocal"));
}
