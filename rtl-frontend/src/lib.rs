//! Native instruction lifting
//!
//! This crate turns decoded native instructions into RTL IR:
//! - [`operand`]: operand trees as handed over by a decoder, and their resolution
//! - [`translation`]: the translator trait, registry, emitter and shared
//!   arithmetic helpers
//! - [`ppc`]: the 32-bit PowerPC translators
//!
//! Architecture support is feature gated; `ppc` is enabled by default.

pub mod operand;
pub mod translation;

#[cfg(feature = "ppc")]
pub mod ppc;

pub use operand::{NativeInstruction, OperandNode, ResolvedOperand, resolve_operand};
pub use translation::{
    InstructionTranslator, IrEmitter, Label, StandardEnvironment, TranslationEnvironment,
    TranslatorRegistry,
};

#[cfg(feature = "ppc")]
pub use ppc::PpcTranslator;
