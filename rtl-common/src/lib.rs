//! Shared services for the RTL lifter workspace
//!
//! Configuration loading and logging bootstrap.

pub mod config;
pub mod logging;

pub use config::{
    Endianness, InterpreterConfig, RtlConfig, UndefinedReadMode, UnknownOpcodeMode,
};
pub use logging::{init_logging, init_test_logging, LogLevel, LoggingConfig};
