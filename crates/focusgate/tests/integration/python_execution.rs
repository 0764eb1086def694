use focusgate::{ExecutionRequest, Runner, TestVector};
use serde_json::json;

use crate::{require_program, runner};

#[tokio::test]
async fn passing_vectors_produce_a_full_report() {
    require_program!("python3");

    let request = ExecutionRequest::new(
        "python",
        "def add(a, b):\n    return a + b\n",
        "add",
    )
    .with_vectors(vec![
        TestVector::new(json!([2, 3]), json!(5)),
        TestVector::new(json!([-1, 1]), json!(0)),
    ]);

    let outcome = runner().run_tests(&request).await;
    assert!(outcome.success, "unexpected failure: {:?}", outcome.error);
    assert_eq!(outcome.error, None);
    assert_eq!(outcome.results.len(), 2);
    assert_eq!(outcome.results[0].input, json!([2, 3]));
    assert_eq!(outcome.results[0].expected, json!(5));
    assert_eq!(outcome.results[0].actual, json!(5));
    assert!(outcome.results[0].passed);
    assert_eq!(outcome.results[0].log, "");
}

#[tokio::test]
async fn scalar_inputs_are_passed_as_a_single_argument() {
    require_program!("python3");

    let request = ExecutionRequest::new(
        "python",
        "def square(x):\n    return x * x\n",
        "square",
    )
    .with_vectors(vec![TestVector::new(json!(5), json!(25))]);

    let outcome = runner().run_tests(&request).await;
    assert!(outcome.success, "unexpected failure: {:?}", outcome.error);
    assert!(outcome.results[0].passed);
}

#[tokio::test]
async fn a_raising_vector_fails_alone_with_a_traceback() {
    require_program!("python3");

    let source = "def checked_div(a, b):\n    return a // b\n";
    let request = ExecutionRequest::new("python", source, "checked_div").with_vectors(vec![
        TestVector::new(json!([6, 3]), json!(2)),
        TestVector::new(json!([1, 0]), json!(0)),
        TestVector::new(json!([9, 2]), json!(4)),
    ]);

    let outcome = runner().run_tests(&request).await;
    assert!(!outcome.success);
    assert_eq!(outcome.error, None, "faults stay per-vector");
    assert_eq!(outcome.results.len(), 3);
    assert!(outcome.results[0].passed);
    assert!(!outcome.results[1].passed);
    assert!(outcome.results[1].log.contains("ZeroDivisionError"));
    assert!(outcome.results[2].passed);
    assert_eq!(outcome.results[2].log, "");
}

#[tokio::test]
async fn a_spinning_driver_is_reported_as_timed_out() {
    require_program!("python3");

    let mut config = focusgate::Config::default();
    config.runner.timeout = 0.5;
    let runner = Runner::new(config);

    let request = ExecutionRequest::new(
        "python",
        "def spin():\n    while True:\n        pass\n",
        "spin",
    )
    .with_vectors(vec![TestVector::new(json!([]), json!(null))]);

    let outcome = runner.run_tests(&request).await;
    assert!(!outcome.success);
    assert_eq!(outcome.error.as_deref(), Some("ExecutionTimedOut"));
    assert!(outcome.results.is_empty());
}

#[tokio::test]
async fn a_broken_submission_surfaces_the_interpreter_diagnostics() {
    require_program!("python3");

    let request = ExecutionRequest::new("python", "def add(a, b:\n", "add")
        .with_vectors(vec![TestVector::new(json!([1, 2]), json!(3))]);

    let outcome = runner().run_tests(&request).await;
    assert!(!outcome.success);
    let error = outcome.error.expect("stderr should be surfaced");
    assert!(error.contains("SyntaxError"), "got: {error}");
    assert!(outcome.results.is_empty());
}

#[tokio::test]
async fn a_driver_that_prints_no_report_is_an_invalid_output_error() {
    require_program!("python3");

    let source = "import os\n\ndef bail():\n    os._exit(0)\n";
    let request = ExecutionRequest::new("python", source, "bail")
        .with_vectors(vec![TestVector::new(json!([]), json!(null))]);

    let outcome = runner().run_tests(&request).await;
    assert!(!outcome.success);
    let error = outcome.error.expect("parse failure should be surfaced");
    assert!(error.starts_with("invalid output"), "got: {error}");
}
