use std::collections::HashMap;

use serde::{Deserialize, Deserializer, Serialize, de};

use crate::config::ConfigError;

const INVALID_FILE_EXT_CHARS: [char; 2] = ['/', '.'];

/// Configuration for a challenge target language
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Language {
    /// Human-readable name for the language (e.g., "Python 3")
    pub name: String,

    /// File extension
    pub extension: FileExtension,

    /// Which driver template this language uses
    pub kind: HarnessKind,

    /// Compilation configuration (None for interpreted languages)
    #[serde(default)]
    pub compile: Option<CompileConfig>,

    /// Execution configuration
    pub run: RunConfig,
}

impl Language {
    /// Check if the language is compiled
    pub fn is_compiled(&self) -> bool {
        self.compile.is_some()
    }

    /// File name the generated driver is written under
    pub fn driver_name(&self) -> String {
        format!("driver.{}", self.extension)
    }

    /// Expand placeholders in the given command
    pub fn expand_command(command: &[String], driver: &str, binary: &str) -> Vec<String> {
        command
            .iter()
            .map(|arg| arg.replace("{driver}", driver).replace("{binary}", binary))
            .collect()
    }
}

/// Driver template selector.
///
/// Language tags in the configuration are free-form; the kind pins each one to
/// a known harness shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HarnessKind {
    Python,
    Javascript,
    Php,
    C,
}

impl HarnessKind {
    /// Whether drivers for this kind need parameter/return type metadata
    #[must_use]
    pub fn requires_types(&self) -> bool {
        matches!(self, HarnessKind::C)
    }
}

/// File extension without dot (e.g., "py")
#[derive(Debug, Clone, Serialize)]
pub struct FileExtension(String);

impl FileExtension {
    pub fn new(extension: &str) -> Result<Self, ConfigError> {
        let contains_invalid = extension
            .chars()
            .any(|c| INVALID_FILE_EXT_CHARS.contains(&c));
        if contains_invalid {
            return Err(ConfigError::InvalidFileExtChars);
        }
        Ok(Self(extension.to_owned()))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<'de> Deserialize<'de> for FileExtension {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        FileExtension::new(&s).map_err(|_| {
            de::Error::invalid_value(
                de::Unexpected::Str(&s),
                &"a file extension without '/' or '.' characters",
            )
        })
    }
}

impl std::fmt::Display for FileExtension {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Compile step for languages that build a binary before running
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompileConfig {
    /// Compiler invocation with placeholders
    /// Placeholders: {driver}, {binary}
    pub command: Vec<String>,

    /// Environment variables set during compilation
    #[serde(default)]
    pub env: HashMap<String, String>,
}

/// Default PATH for driver execution
pub const DEFAULT_SANDBOX_PATH: &str = "/usr/bin:/bin";

/// How a generated driver is launched
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Interpreter or binary invocation with placeholders
    /// Placeholders: {driver}, {binary}
    pub command: Vec<String>,

    /// Environment variables to set
    #[serde(default)]
    pub env: HashMap<String, String>,

    /// PATH environment variable for the driver process
    ///
    /// Defaults to "/usr/bin:/bin" if not specified.
    #[serde(default = "default_sandbox_path")]
    pub path: String,
}

fn default_sandbox_path() -> String {
    DEFAULT_SANDBOX_PATH.to_owned()
}
