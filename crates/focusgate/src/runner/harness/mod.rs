//! Driver synthesis for supported languages
//!
//! Each generator wraps the submitted source in a fixed template: the source
//! occupies its own segment, the entry point must be a plain identifier, and
//! the test vectors travel as an escaped string literal decoded with the
//! target language's own JSON facility. Vector data therefore can never
//! escape into code position.

use crate::config::{HarnessKind, Language};
use crate::runner::RunnerError;
use crate::types::ExecutionRequest;

mod c;
mod javascript;
mod php;
mod python;

/// Generate the driver program for a request.
///
/// # Errors
///
/// Returns [`RunnerError::InvalidEntryPoint`] when the entry point is not an
/// identifier, [`RunnerError::MissingTypeInfo`] when the target language
/// needs type metadata the request lacks, and
/// [`RunnerError::UnsupportedValue`] when a vector cannot be expressed in a
/// statically typed driver.
pub(crate) fn generate(
    request: &ExecutionRequest,
    language: &Language,
) -> Result<String, RunnerError> {
    validate_entry_point(&request.entry_point)?;
    let vectors_json = serde_json::to_string(&request.vectors)?;

    match language.kind {
        HarnessKind::Python => Ok(python::driver(
            &request.source,
            &request.entry_point,
            &vectors_json,
        )),
        HarnessKind::Javascript => Ok(javascript::driver(
            &request.source,
            &request.entry_point,
            &vectors_json,
        )),
        HarnessKind::Php => Ok(php::driver(
            &request.source,
            &request.entry_point,
            &vectors_json,
        )),
        HarnessKind::C => c::driver(request),
    }
}

/// Entry points are interpolated into code, so only plain identifiers pass
fn validate_entry_point(name: &str) -> Result<(), RunnerError> {
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(first) => {
            (first.is_ascii_alphabetic() || first == '_')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        None => false,
    };
    if valid {
        Ok(())
    } else {
        Err(RunnerError::InvalidEntryPoint {
            name: name.to_string(),
        })
    }
}

/// Quote JSON text as a single-quoted string literal.
///
/// The two escapes produced here mean the same thing in Python, JavaScript,
/// and PHP single-quoted strings, and compact JSON never contains raw
/// control characters, so the literal is valid in all three.
fn single_quoted(json: &str) -> String {
    let escaped = json.replace('\\', "\\\\").replace('\'', "\\'");
    format!("'{escaped}'")
}
