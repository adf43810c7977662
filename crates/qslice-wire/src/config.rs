//! Codec configuration.
//!
//! Supports loading configuration from:
//! 1. Configuration files (YAML)
//! 2. Environment variables (with QSLICE_ prefix)
//!
//! Configuration precedence (highest to lowest):
//! 1. Environment variables
//! 2. Configuration file
//! 3. Default values

use qslice_ir::FlattenLimits;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Complete codec configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CodecConfig {
    /// Which values the encoder interns in the constant table
    #[serde(default)]
    pub encoding: EncodingPolicy,

    /// Ceilings applied while decoding
    #[serde(default)]
    pub decoding: DecodingLimits,

    /// Ceilings applied when flattening before encoding
    #[serde(default)]
    pub flatten: FlattenLimits,
}

/// Interning choices of the encoder.
///
/// Every combination decodes to the same circuit; they only trade message
/// size against encoding work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncodingPolicy {
    /// Reference qubits by constant index
    #[serde(default = "default_true")]
    pub intern_qubits: bool,

    /// Write circuit moments as constant indices
    #[serde(default = "default_true")]
    pub intern_moments: bool,

    /// Write gate operations as constant indices
    #[serde(default = "default_true")]
    pub intern_operations: bool,

    /// Reference tags by constant index
    #[serde(default = "default_true")]
    pub intern_tags: bool,

    /// Reference called sub-circuits by constant index
    #[serde(default = "default_true")]
    pub intern_circuits: bool,

    /// Strings at least this long are interned; `None` disables
    #[serde(default = "default_string_intern_min_len")]
    pub string_intern_min_len: Option<usize>,
}

/// Ceilings applied while decoding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecodingLimits {
    /// Maximum nesting of recursive arguments
    #[serde(default = "default_max_arg_depth")]
    pub max_arg_depth: usize,

    /// Maximum encoded message size in bytes
    #[serde(default = "default_max_message_size")]
    pub max_message_size_bytes: usize,
}

// Default value functions
fn default_true() -> bool {
    true
}

fn default_string_intern_min_len() -> Option<usize> {
    Some(16)
}

fn default_max_arg_depth() -> usize {
    64
}

fn default_max_message_size() -> usize {
    64 * 1024 * 1024 // 64MB
}

impl Default for EncodingPolicy {
    fn default() -> Self {
        Self {
            intern_qubits: default_true(),
            intern_moments: default_true(),
            intern_operations: default_true(),
            intern_tags: default_true(),
            intern_circuits: default_true(),
            string_intern_min_len: default_string_intern_min_len(),
        }
    }
}

impl EncodingPolicy {
    /// Intern nothing: every value is written inline.
    pub fn inline() -> Self {
        Self {
            intern_qubits: false,
            intern_moments: false,
            intern_operations: false,
            intern_tags: false,
            intern_circuits: false,
            string_intern_min_len: None,
        }
    }

    /// Whether `s` goes into the constant table.
    pub fn interns_string(&self, s: &str) -> bool {
        self.string_intern_min_len.is_some_and(|min| s.len() >= min)
    }
}

impl Default for DecodingLimits {
    fn default() -> Self {
        Self {
            max_arg_depth: default_max_arg_depth(),
            max_message_size_bytes: default_max_message_size(),
        }
    }
}

impl CodecConfig {
    /// Load configuration from a YAML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents =
            std::fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;
        Self::from_yaml(&contents)
    }

    /// Parse configuration from a YAML document.
    pub fn from_yaml(contents: &str) -> Result<Self, ConfigError> {
        let config: CodecConfig =
            serde_yaml_ng::from_str(contents).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from environment variables over the defaults.
    pub fn from_env() -> Self {
        CodecConfig::default().merge_env()
    }

    /// Load configuration with the following precedence:
    /// 1. Load from file if provided
    /// 2. Apply environment variable overrides
    pub fn load(config_file: Option<&str>) -> Result<Self, ConfigError> {
        let config = if let Some(path) = config_file {
            Self::from_file(path)?
        } else {
            CodecConfig::default()
        };

        let config = config.merge_env();
        config.validate()?;
        Ok(config)
    }

    /// Merge environment variables into this configuration.
    ///
    /// Only variables that are set and parse override the current values.
    fn merge_env(mut self) -> Self {
        let flag = |name: &str, field: &mut bool| {
            if let Ok(v) = std::env::var(name) {
                if let Ok(val) = v.parse() {
                    *field = val;
                }
            }
        };

        // Encoding
        flag("QSLICE_INTERN_QUBITS", &mut self.encoding.intern_qubits);
        flag("QSLICE_INTERN_MOMENTS", &mut self.encoding.intern_moments);
        flag("QSLICE_INTERN_OPERATIONS", &mut self.encoding.intern_operations);
        flag("QSLICE_INTERN_TAGS", &mut self.encoding.intern_tags);
        flag("QSLICE_INTERN_CIRCUITS", &mut self.encoding.intern_circuits);
        if let Ok(v) = std::env::var("QSLICE_STRING_INTERN_MIN_LEN") {
            if let Some(val) = parse_optional(&v) {
                self.encoding.string_intern_min_len = val;
            }
        }

        // Decoding
        if let Ok(v) = std::env::var("QSLICE_MAX_ARG_DEPTH") {
            if let Ok(val) = v.parse() {
                self.decoding.max_arg_depth = val;
            }
        }
        if let Ok(v) = std::env::var("QSLICE_MAX_MESSAGE_SIZE") {
            if let Ok(val) = v.parse() {
                self.decoding.max_message_size_bytes = val;
            }
        }

        // Flattening
        if let Ok(v) = std::env::var("QSLICE_FLATTEN_MAX_DEPTH") {
            if let Some(val) = parse_optional(&v) {
                self.flatten.max_depth = val;
            }
        }
        if let Ok(v) = std::env::var("QSLICE_FLATTEN_MAX_OPERATIONS") {
            if let Some(val) = parse_optional(&v) {
                self.flatten.max_operations = val;
            }
        }

        self
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.encoding.string_intern_min_len == Some(0) {
            return Err(ConfigError::ValidationError(
                "string_intern_min_len must be greater than 0; use null to disable".to_string(),
            ));
        }

        if self.decoding.max_arg_depth == 0 {
            return Err(ConfigError::ValidationError(
                "max_arg_depth must be greater than 0".to_string(),
            ));
        }

        if self.decoding.max_message_size_bytes == 0 {
            return Err(ConfigError::ValidationError(
                "max_message_size_bytes must be greater than 0".to_string(),
            ));
        }

        if self.flatten.max_operations == Some(0) {
            return Err(ConfigError::ValidationError(
                "flatten.max_operations must be greater than 0; use null to disable".to_string(),
            ));
        }

        Ok(())
    }
}

/// `"none"`/`"off"` disable a ceiling, a number sets it.
fn parse_optional(v: &str) -> Option<Option<usize>> {
    match v.trim().to_ascii_lowercase().as_str() {
        "none" | "off" | "null" => Some(None),
        other => other.parse().ok().map(Some),
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),
}
