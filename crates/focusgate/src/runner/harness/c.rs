//! C driver generation
//!
//! C cannot decode JSON at runtime without a library, so the vectors are
//! compiled in: every argument and expected value becomes a typed literal,
//! and the original JSON text of each vector is embedded as a string
//! constant that the driver echoes back into the report. Values that do not
//! fit the declared signature are rejected at synthesis time.

use serde_json::Value;

use crate::runner::RunnerError;
use crate::types::{CType, ExecutionRequest, TestVector, TypeInfo};

pub(super) fn driver(request: &ExecutionRequest) -> Result<String, RunnerError> {
    let types = request
        .types
        .as_ref()
        .ok_or_else(|| RunnerError::MissingTypeInfo {
            language: request.language.clone(),
        })?;

    let mut cases = String::new();
    for (index, vector) in request.vectors.iter().enumerate() {
        case_block(&mut cases, index, vector, &request.entry_point, types)?;
    }

    let source = &request.source;
    Ok(format!(
        r#"#include <math.h>
#include <stdbool.h>
#include <stdio.h>
#include <string.h>

{source}

static void driver_emit_double(double value) {{
    if (isfinite(value)) {{
        printf("%.17g", value);
    }} else {{
        fputs("null", stdout);
    }}
}}

static void driver_emit_str(const char *value) {{
    if (value == NULL) {{
        fputs("null", stdout);
        return;
    }}
    putchar('"');
    for (const unsigned char *p = (const unsigned char *)value; *p != 0; p++) {{
        if (*p == '"' || *p == '\\') {{
            putchar('\\');
            putchar(*p);
        }} else if (*p == '\n') {{
            fputs("\\n", stdout);
        }} else if (*p == '\r') {{
            fputs("\\r", stdout);
        }} else if (*p == '\t') {{
            fputs("\\t", stdout);
        }} else if (*p < 0x20) {{
            printf("\\u%04x", (unsigned int)*p);
        }} else {{
            putchar(*p);
        }}
    }}
    putchar('"');
}}

static void driver_case_head(int index, const char *input_json, const char *expected_json) {{
    if (index > 0) {{
        putchar(',');
    }}
    printf("{{\"input\": %s, \"expected\": %s, \"actual\": ", input_json, expected_json);
}}

static void driver_case_tail(bool passed) {{
    printf(", \"passed\": %s, \"log\": \"\"}}", passed ? "true" : "false");
}}

int main(void) {{
    bool all_passed = true;
    fputs("{{\"results\": [", stdout);
{cases}    printf("], \"success\": %s}}\n", all_passed ? "true" : "false");
    return 0;
}}
"#
    ))
}

fn case_block(
    out: &mut String,
    index: usize,
    vector: &TestVector,
    entry_point: &str,
    types: &TypeInfo,
) -> Result<(), RunnerError> {
    let arguments = call_arguments(vector, types)?;
    let input_json = c_string_literal(&serde_json::to_string(&vector.input)?);
    let expected_json = c_string_literal(&serde_json::to_string(&vector.expected)?);

    let (declaration, comparison, emit) = match types.ret {
        CType::Int => (
            "int actual",
            format!("actual == {}", literal(&vector.expected, CType::Int)?),
            "printf(\"%d\", actual);".to_string(),
        ),
        CType::Long => (
            "long long actual",
            format!("actual == {}", literal(&vector.expected, CType::Long)?),
            "printf(\"%lld\", actual);".to_string(),
        ),
        CType::Double => (
            "double actual",
            format!(
                "fabs(actual - ({})) < 1e-9",
                literal(&vector.expected, CType::Double)?
            ),
            "driver_emit_double(actual);".to_string(),
        ),
        CType::Bool => (
            "bool actual",
            format!("actual == {}", literal(&vector.expected, CType::Bool)?),
            "fputs(actual ? \"true\" : \"false\", stdout);".to_string(),
        ),
        CType::Str => (
            "const char *actual",
            format!(
                "actual != NULL && strcmp(actual, {}) == 0",
                literal(&vector.expected, CType::Str)?
            ),
            "driver_emit_str(actual);".to_string(),
        ),
    };

    out.push_str(&format!(
        "    {{\n        {declaration} = {entry_point}({arguments});\n        \
         bool passed = {comparison};\n        \
         if (!passed) {{\n            all_passed = false;\n        }}\n        \
         driver_case_head({index}, {input_json}, {expected_json});\n        \
         {emit}\n        \
         driver_case_tail(passed);\n    }}\n"
    ));
    Ok(())
}

/// Argument list for one vector, arity-checked against the signature
fn call_arguments(vector: &TestVector, types: &TypeInfo) -> Result<String, RunnerError> {
    let inputs: Vec<&Value> = match &vector.input {
        Value::Array(items) => items.iter().collect(),
        other => vec![other],
    };
    if inputs.len() != types.params.len() {
        return Err(RunnerError::UnsupportedValue {
            detail: format!(
                "vector supplies {} arguments but the signature takes {}",
                inputs.len(),
                types.params.len()
            ),
        });
    }
    let arguments = inputs
        .iter()
        .zip(&types.params)
        .map(|(value, &param)| literal(value, param))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(arguments.join(", "))
}

/// Render a JSON value as a C literal of the given type
fn literal(value: &Value, ctype: CType) -> Result<String, RunnerError> {
    let mismatch = || RunnerError::UnsupportedValue {
        detail: format!("expected {} value, got {value}", c_name(ctype)),
    };
    match ctype {
        CType::Int => {
            let n = value.as_i64().ok_or_else(mismatch)?;
            let n = i32::try_from(n).map_err(|_| RunnerError::UnsupportedValue {
                detail: format!("{n} does not fit in int"),
            })?;
            // INT_MIN has no direct decimal spelling in C
            if n == i32::MIN {
                Ok("(-2147483647 - 1)".to_string())
            } else {
                Ok(n.to_string())
            }
        }
        CType::Long => {
            let n = value.as_i64().ok_or_else(mismatch)?;
            if n == i64::MIN {
                Ok("(-9223372036854775807LL - 1)".to_string())
            } else {
                Ok(format!("{n}LL"))
            }
        }
        CType::Double => {
            let f = value.as_f64().ok_or_else(mismatch)?;
            // Debug formatting always keeps a decimal point or exponent
            Ok(format!("{f:?}"))
        }
        CType::Bool => {
            let b = value.as_bool().ok_or_else(mismatch)?;
            Ok(b.to_string())
        }
        CType::Str => {
            let s = value.as_str().ok_or_else(mismatch)?;
            Ok(c_string_literal(s))
        }
    }
}

fn c_name(ctype: CType) -> &'static str {
    match ctype {
        CType::Int => "int",
        CType::Long => "long long",
        CType::Double => "double",
        CType::Bool => "bool",
        CType::Str => "string",
    }
}

fn c_string_literal(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for c in text.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            // Octal escapes are at most three digits, so a digit after one
            // cannot extend the escape
            c if (c as u32) < 0x20 => {
                out.push_str(&format!("\\{:03o}", c as u32));
            }
            c => out.push(c),
        }
    }
    out.push('"');
    out
}
