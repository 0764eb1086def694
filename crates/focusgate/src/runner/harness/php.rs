//! PHP driver generation

use crate::runner::harness::single_quoted;

/// Build the PHP driver.
///
/// JSON objects and arrays both decode to PHP arrays, so a list input is one
/// whose keys are 0..n in order. Comparison uses `==`, which compares arrays
/// structurally. `\Throwable` catches engine errors such as calling an
/// undefined function, keeping faults per vector.
pub(super) fn driver(source: &str, entry_point: &str, vectors_json: &str) -> String {
    let vectors_literal = single_quoted(vectors_json);
    format!(
        r#"<?php
{source}

$vectors = json_decode({vectors_literal}, true);
$results = [];
$allPassed = true;
foreach ($vectors as $vec) {{
    $log = "";
    try {{
        $input = $vec["input"];
        if (is_array($input) && array_is_list($input)) {{
            $actual = {entry_point}(...$input);
        }} else {{
            $actual = {entry_point}($input);
        }}
        $passed = $actual == $vec["expected"];
    }} catch (\Throwable $e) {{
        $actual = "Error";
        $passed = false;
        $log = $e->getMessage();
    }}
    if (!$passed) {{
        $allPassed = false;
    }}
    $results[] = ["input" => $vec["input"], "expected" => $vec["expected"], "actual" => $actual, "passed" => $passed, "log" => $log];
}}
echo json_encode(["success" => $allPassed, "results" => $results]), "\n";
"#
    )
}
