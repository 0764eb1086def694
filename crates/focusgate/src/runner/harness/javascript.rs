//! Node.js driver generation

use crate::runner::harness::single_quoted;

/// Build the Node.js driver.
///
/// Equality is structural via `JSON.stringify` on both sides. An `undefined`
/// return is reported as `null` so the report stays well-formed JSON.
pub(super) fn driver(source: &str, entry_point: &str, vectors_json: &str) -> String {
    let vectors_literal = single_quoted(vectors_json);
    format!(
        r#"{source}

const vectors = JSON.parse({vectors_literal});
const results = [];
let allPassed = true;
for (const vec of vectors) {{
    let actual;
    let passed = false;
    let log = "";
    try {{
        if (Array.isArray(vec.input)) {{
            actual = {entry_point}(...vec.input);
        }} else {{
            actual = {entry_point}(vec.input);
        }}
        if (actual === undefined) {{
            actual = null;
        }}
        passed = JSON.stringify(actual) === JSON.stringify(vec.expected);
    }} catch (err) {{
        actual = "Error";
        log = String(err);
    }}
    if (!passed) {{
        allPassed = false;
    }}
    results.push({{ input: vec.input, expected: vec.expected, actual: actual, passed: passed, log: log }});
}}
console.log(JSON.stringify({{ success: allPassed, results: results }}));
"#
    )
}
