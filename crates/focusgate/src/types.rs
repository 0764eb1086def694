use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One input/expected-output pair used to validate submitted code.
///
/// An `input` that is a JSON array is passed to the entry point as positional
/// arguments; any other value is passed as the sole argument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestVector {
    /// Argument(s) for the entry point
    pub input: Value,

    /// Expected return value
    pub expected: Value,
}

impl TestVector {
    pub fn new(input: impl Into<Value>, expected: impl Into<Value>) -> Self {
        Self {
            input: input.into(),
            expected: expected.into(),
        }
    }

    /// Whether the input spreads into positional arguments
    #[must_use]
    pub fn is_positional(&self) -> bool {
        self.input.is_array()
    }
}

/// Scalar type tag for statically typed target languages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CType {
    Int,
    Long,
    Double,
    Bool,
    Str,
}

/// Parameter and return types, required by targets that cannot infer them
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeInfo {
    /// Entry-point parameter types, in positional order
    pub params: Vec<CType>,

    /// Entry-point return type
    #[serde(rename = "return")]
    pub ret: CType,
}

/// A single code evaluation: source, entry point, and the vectors to run it against
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionRequest {
    /// User-submitted source code, embedded verbatim into the driver
    pub source: String,

    /// Name of the function the driver invokes
    pub entry_point: String,

    /// Vectors evaluated in order
    pub vectors: Vec<TestVector>,

    /// Language tag, resolved against the configured languages
    pub language: String,

    /// Type metadata for statically typed targets
    #[serde(default)]
    pub types: Option<TypeInfo>,
}

impl ExecutionRequest {
    pub fn new(
        language: impl Into<String>,
        source: impl Into<String>,
        entry_point: impl Into<String>,
    ) -> Self {
        Self {
            source: source.into(),
            entry_point: entry_point.into(),
            vectors: Vec::new(),
            language: language.into(),
            types: None,
        }
    }

    /// Set the test vectors
    pub fn with_vectors(mut self, vectors: Vec<TestVector>) -> Self {
        self.vectors = vectors;
        self
    }

    /// Set type metadata for statically typed targets
    pub fn with_types(mut self, types: TypeInfo) -> Self {
        self.types = Some(types);
        self
    }
}

/// Evaluation of one test vector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseResult {
    /// The vector's input, echoed for user-facing diffing
    pub input: Value,

    /// The vector's expected value, echoed
    pub expected: Value,

    /// What the entry point actually returned
    pub actual: Value,

    /// Structural equality of actual and expected
    pub passed: bool,

    /// Diagnostic text captured when this vector faulted, empty otherwise
    #[serde(default)]
    pub log: String,
}

/// Result of one execution request.
///
/// This is the wire document handed to callers: `success` is the logical AND
/// of all per-vector `passed` flags, `error` carries a request-level failure
/// (timeout, bad language, crashed driver) with `results` empty in that case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionOutcome {
    pub success: bool,

    /// Request-level failure, `null` when the driver ran to completion
    pub error: Option<String>,

    /// Per-vector results in input order
    pub results: Vec<CaseResult>,
}

impl ExecutionOutcome {
    /// Lift a driver report into an outcome with no request-level error
    pub fn from_report(report: DriverReport) -> Self {
        Self {
            success: report.success,
            error: None,
            results: report.results,
        }
    }

    /// Outcome for a request that failed before producing any results
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            results: Vec::new(),
        }
    }

    /// Whether every vector ran and passed
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.success && self.error.is_none()
    }
}

/// The document a generated driver prints as its final line of stdout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriverReport {
    pub success: bool,

    #[serde(default)]
    pub results: Vec<CaseResult>,
}
