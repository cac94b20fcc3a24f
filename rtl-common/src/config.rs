// Configuration
//
// Interpreter behaviour that callers may tune, loadable from TOML:
//
// ```toml
// [interpreter]
// endianness = "big-endian"
// undefined-reads = "fail"
// unknown-opcodes = "skip"
// step-limit = 100000
//
// [logging]
// level = "debug"
// ```

use std::fs;
use std::path::Path;

use rtl_error::ConfigError;
use serde::{Deserialize, Serialize};

use crate::logging::LoggingConfig;

/// Byte order of multi-byte memory accesses, fixed per interpreter instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Endianness {
    #[default]
    #[serde(alias = "big")]
    BigEndian,
    #[serde(alias = "little")]
    LittleEndian,
}

/// What a read of a never-written (or undefined) register does
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UndefinedReadMode {
    /// Abort with `InterpreterError::UndefinedRegisterRead`
    #[default]
    Fail,
    /// Read as zero
    Zero,
}

/// What the interpreter does with `unkn` instructions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UnknownOpcodeMode {
    #[default]
    Fail,
    Skip,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct InterpreterConfig {
    pub endianness: Endianness,
    pub undefined_reads: UndefinedReadMode,
    pub unknown_opcodes: UnknownOpcodeMode,
    /// Abort after this many executed IR instructions
    pub step_limit: Option<u64>,
}

impl InterpreterConfig {
    pub fn new(endianness: Endianness) -> Self {
        Self {
            endianness,
            ..Self::default()
        }
    }

    pub fn with_undefined_reads(mut self, mode: UndefinedReadMode) -> Self {
        self.undefined_reads = mode;
        self
    }

    pub fn with_unknown_opcodes(mut self, mode: UnknownOpcodeMode) -> Self {
        self.unknown_opcodes = mode;
        self
    }

    pub fn with_step_limit(mut self, limit: u64) -> Self {
        self.step_limit = Some(limit);
        self
    }

    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        toml::from_str(source).map_err(|e| ConfigError::ParseError(e.to_string()))
    }
}

/// Whole configuration file
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RtlConfig {
    pub interpreter: InterpreterConfig,
    pub logging: LoggingConfig,
}

impl RtlConfig {
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: RtlConfig =
            toml::from_str(source).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = fs::read_to_string(path)
            .map_err(|e| ConfigError::FileAccessError(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&source)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.interpreter.step_limit == Some(0) {
            return Err(ConfigError::InvalidValue(
                "interpreter.step-limit".to_string(),
                "0".to_string(),
            ));
        }
        Ok(())
    }
}
