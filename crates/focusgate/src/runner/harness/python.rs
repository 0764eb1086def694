//! Python driver generation

use crate::runner::harness::single_quoted;

/// Build the Python driver.
///
/// A list input spreads into positional arguments, anything else is passed
/// as the single argument. Faults raised by the submitted function are
/// captured per vector with a full traceback; the report is always the last
/// line on stdout. `default=repr` keeps the final dump from failing when the
/// function returns something JSON cannot represent.
pub(super) fn driver(source: &str, entry_point: &str, vectors_json: &str) -> String {
    let vectors_literal = single_quoted(vectors_json);
    format!(
        r#"import json
import traceback

{source}

_vectors = json.loads({vectors_literal})
_results = []
_all_passed = True
for _vec in _vectors:
    _log = ""
    try:
        _input = _vec["input"]
        if isinstance(_input, list):
            _actual = {entry_point}(*_input)
        else:
            _actual = {entry_point}(_input)
        _passed = _actual == _vec["expected"]
    except Exception:
        _actual = "Error"
        _passed = False
        _log = traceback.format_exc()
    if not _passed:
        _all_passed = False
    _results.append(dict(input=_vec["input"], expected=_vec["expected"], actual=_actual, passed=_passed, log=_log))

print(json.dumps(dict(success=_all_passed, results=_results), default=repr))
"#
    )
}
