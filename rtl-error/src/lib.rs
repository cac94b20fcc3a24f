//! Unified error handling for the RTL lifter workspace
//!
//! Every crate in the workspace reports failures through one of the enums in
//! this module. Translation and interpretation errors are surfaced to the
//! immediate caller and never retried: both stages are deterministic functions
//! of their inputs.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Unified error type for all workspace components
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RtlError {
    #[error("Translation error: {source}")]
    Translation {
        #[from]
        source: TranslationError,
    },

    #[error("Interpreter error: {source}")]
    Interpreter {
        #[from]
        source: InterpreterError,
    },

    #[error("IR error: {source}")]
    Ir {
        #[from]
        source: IrError,
    },

    #[error("Configuration error: {source}")]
    Configuration {
        #[from]
        source: ConfigError,
    },
}

/// Errors raised while lifting one native instruction
///
/// A translator that fails leaves the caller's output sequence untouched.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TranslationError {
    #[error("Unsupported mnemonic: {0}")]
    UnsupportedMnemonic(String),

    #[error("{mnemonic}: expected {expected} operands, found {found}")]
    OperandCount {
        mnemonic: String,
        expected: String,
        found: usize,
    },

    #[error("{mnemonic}: operand {index} is invalid: {reason}")]
    InvalidOperand {
        mnemonic: String,
        index: usize,
        reason: String,
    },

    #[error("Register {0} has no size prefix and is unknown to the register catalog")]
    UnknownRegister(String),

    #[error("Malformed operand tree: {0}")]
    MalformedOperand(String),

    #[error("{0}: jump to a label that was never bound")]
    UnboundLabel(String),
}

impl TranslationError {
    pub fn invalid_operand(
        mnemonic: impl Into<String>,
        index: usize,
        reason: impl Into<String>,
    ) -> Self {
        TranslationError::InvalidOperand {
            mnemonic: mnemonic.into(),
            index,
            reason: reason.into(),
        }
    }
}

/// Errors raised by the IR interpreter
///
/// Addresses are rendered in `native.offset` form. State written before the
/// failing instruction stays in place.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum InterpreterError {
    #[error("Jump at {address} targets unmapped address {target}")]
    UnmappedTarget { address: String, target: String },

    #[error("Read of undefined register {register} at {address}")]
    UndefinedRegisterRead { register: String, address: String },

    #[error("Width mismatch at {address}: {detail}")]
    WidthMismatch { address: String, detail: String },

    #[error("Unsupported opcode {opcode} at {address}")]
    UnsupportedOpcode { opcode: String, address: String },

    #[error("Invalid operand at {address}: {reason}")]
    InvalidOperand { address: String, reason: String },

    #[error("Division by zero at {address}")]
    DivisionByZero { address: String },

    #[error("Step limit of {limit} instructions exceeded")]
    StepLimitExceeded { limit: u64 },
}

/// Errors raised while assembling IR programs
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum IrError {
    #[error("Duplicate IR address: {0}")]
    DuplicateAddress(String),

    #[error("Invalid operand size: {0}")]
    InvalidSize(String),
}

/// Configuration errors
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigError {
    #[error("Configuration parsing error: {0}")]
    ParseError(String),

    #[error("Configuration file access error: {0}")]
    FileAccessError(String),

    #[error("Invalid configuration value: {0} = {1}")]
    InvalidValue(String, String),
}

/// Result type alias for convenience
pub type RtlResult<T> = Result<T, RtlError>;

/// Trait for converting component errors to [`RtlError`]
pub trait IntoRtlError<T> {
    fn into_rtl_error(self) -> RtlResult<T>;
}

impl<T, E> IntoRtlError<T> for Result<T, E>
where
    E: Into<RtlError>,
{
    fn into_rtl_error(self) -> RtlResult<T> {
        self.map_err(Into::into)
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Warning = 0,
    Error = 1,
    Critical = 2,
}

impl fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorSeverity::Warning => write!(f, "WARNING"),
            ErrorSeverity::Error => write!(f, "ERROR"),
            ErrorSeverity::Critical => write!(f, "CRITICAL"),
        }
    }
}

/// Utility functions for error handling
pub mod utils {
    use super::*;

    /// Get error severity level
    ///
    /// Malformed input and programs that read undefined state are caller
    /// errors; a broken configuration or an IR program the interpreter cannot
    /// run at all is critical.
    pub fn error_severity(error: &RtlError) -> ErrorSeverity {
        match error {
            RtlError::Translation { .. } => ErrorSeverity::Error,
            RtlError::Interpreter {
                source: InterpreterError::UndefinedRegisterRead { .. },
            } => ErrorSeverity::Warning,
            RtlError::Interpreter {
                source: InterpreterError::UnsupportedOpcode { .. },
            } => ErrorSeverity::Critical,
            RtlError::Interpreter { .. } => ErrorSeverity::Error,
            RtlError::Ir { .. } => ErrorSeverity::Error,
            RtlError::Configuration { .. } => ErrorSeverity::Critical,
        }
    }

    /// Log error with its severity
    pub fn log_error(error: &RtlError, component: &str) {
        match error_severity(error) {
            ErrorSeverity::Warning => log::warn!("{}: {}", component, error),
            ErrorSeverity::Error | ErrorSeverity::Critical => {
                log::error!("{}: {}", component, error)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_translation_error_conversion() {
        let result: Result<(), TranslationError> =
            Err(TranslationError::UnsupportedMnemonic("frobnicate".to_string()));

        let error = result.into_rtl_error().unwrap_err();
        assert!(matches!(error, RtlError::Translation { .. }));
        assert!(error.to_string().contains("frobnicate"));
    }

    #[test]
    fn test_interpreter_error_display() {
        let error = InterpreterError::UnmappedTarget {
            address: "0x100.03".to_string(),
            target: "0x2000.00".to_string(),
        };

        assert_eq!(
            error.to_string(),
            "Jump at 0x100.03 targets unmapped address 0x2000.00"
        );
    }

    #[test]
    fn test_error_severity() {
        let undefined: RtlError = InterpreterError::UndefinedRegisterRead {
            register: "%r3".to_string(),
            address: "0x100.00".to_string(),
        }
        .into();
        assert_eq!(utils::error_severity(&undefined), ErrorSeverity::Warning);

        let unsupported: RtlError = InterpreterError::UnsupportedOpcode {
            opcode: "unkn".to_string(),
            address: "0x100.00".to_string(),
        }
        .into();
        assert_eq!(utils::error_severity(&unsupported), ErrorSeverity::Critical);
    }

    #[test]
    fn test_invalid_operand_helper() {
        let error = TranslationError::invalid_operand("addme", 1, "expected a register");
        assert_eq!(
            error,
            TranslationError::InvalidOperand {
                mnemonic: "addme".to_string(),
                index: 1,
                reason: "expected a register".to_string(),
            }
        );
    }
}
