use focusgate::{CType, ExecutionRequest, TestVector, TypeInfo};
use serde_json::json;

use crate::{require_program, runner};

#[tokio::test]
async fn an_int_function_compiles_and_passes() {
    require_program!("cc");

    let request = ExecutionRequest::new(
        "c",
        "int add(int a, int b) {\n    return a + b;\n}\n",
        "add",
    )
    .with_vectors(vec![
        TestVector::new(json!([2, 3]), json!(5)),
        TestVector::new(json!([-2, 2]), json!(0)),
    ])
    .with_types(TypeInfo {
        params: vec![CType::Int, CType::Int],
        ret: CType::Int,
    });

    let outcome = runner().run_tests(&request).await;
    assert!(outcome.success, "unexpected failure: {:?}", outcome.error);
    assert_eq!(outcome.results.len(), 2);
    assert!(outcome.results.iter().all(|case| case.passed));
    assert_eq!(outcome.results[0].actual, json!(5));
}

#[tokio::test]
async fn a_string_return_is_compared_by_contents() {
    require_program!("cc");

    let source = "const char *sign_name(int n) {\n    if (n < 0) {\n        return \"negative\";\n    }\n    return n == 0 ? \"zero\" : \"positive\";\n}\n";
    let request = ExecutionRequest::new("c", source, "sign_name")
        .with_vectors(vec![
            TestVector::new(json!(-5), json!("negative")),
            TestVector::new(json!(0), json!("zero")),
            TestVector::new(json!(9), json!("positive")),
        ])
        .with_types(TypeInfo {
            params: vec![CType::Int],
            ret: CType::Str,
        });

    let outcome = runner().run_tests(&request).await;
    assert!(outcome.success, "unexpected failure: {:?}", outcome.error);
    assert!(outcome.results.iter().all(|case| case.passed));
}

#[tokio::test]
async fn a_double_return_is_compared_with_tolerance() {
    require_program!("cc");

    let request = ExecutionRequest::new(
        "c",
        "double halve(int n) {\n    return n / 2.0;\n}\n",
        "halve",
    )
    .with_vectors(vec![TestVector::new(json!(5), json!(2.5))])
    .with_types(TypeInfo {
        params: vec![CType::Int],
        ret: CType::Double,
    });

    let outcome = runner().run_tests(&request).await;
    assert!(outcome.success, "unexpected failure: {:?}", outcome.error);
    assert_eq!(outcome.results[0].actual, json!(2.5));
}

#[tokio::test]
async fn a_wrong_return_value_fails_its_vector() {
    require_program!("cc");

    let request = ExecutionRequest::new(
        "c",
        "int add(int a, int b) {\n    return a + b;\n}\n",
        "add",
    )
    .with_vectors(vec![
        TestVector::new(json!([2, 2]), json!(5)),
        TestVector::new(json!([2, 3]), json!(5)),
    ])
    .with_types(TypeInfo {
        params: vec![CType::Int, CType::Int],
        ret: CType::Int,
    });

    let outcome = runner().run_tests(&request).await;
    assert!(!outcome.success);
    assert_eq!(outcome.error, None);
    assert!(!outcome.results[0].passed);
    assert_eq!(outcome.results[0].actual, json!(4));
    assert!(outcome.results[1].passed);
}

#[tokio::test]
async fn a_broken_submission_surfaces_compiler_diagnostics() {
    require_program!("cc");

    let request = ExecutionRequest::new("c", "int broken(\n", "broken")
        .with_vectors(vec![TestVector::new(json!([]), json!(0))])
        .with_types(TypeInfo {
            params: vec![],
            ret: CType::Int,
        });

    let outcome = runner().run_tests(&request).await;
    assert!(!outcome.success);
    let error = outcome.error.expect("compiler output should be surfaced");
    assert!(error.starts_with("compilation failed"), "got: {error}");
    assert!(outcome.results.is_empty());
}
