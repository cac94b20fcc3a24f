//! Translation infrastructure shared by all architectures
//!
//! A translator lifts one native mnemonic. Translators are registered by
//! mnemonic in a [`TranslatorRegistry`]; most are plain functions that emit
//! through an [`IrEmitter`].

pub mod arith;
mod emitter;
mod environment;

use std::collections::HashMap;

use rtl_error::TranslationError;
use rtl_ir::IrInstruction;

use crate::operand::NativeInstruction;

pub use emitter::{IrEmitter, Label};
pub use environment::{StandardEnvironment, TranslationEnvironment};

/// Lifts one native instruction
///
/// On error nothing has been appended to `out`.
pub trait InstructionTranslator: Send + Sync {
    fn translate(
        &self,
        env: &mut dyn TranslationEnvironment,
        instruction: &NativeInstruction,
        out: &mut Vec<IrInstruction>,
    ) -> Result<(), TranslationError>;
}

/// Adapter running an emitter function as a translator
struct EmitterTranslator<F>(F);

impl<F> InstructionTranslator for EmitterTranslator<F>
where
    F: Fn(&mut IrEmitter<'_>, &NativeInstruction) -> Result<(), TranslationError> + Send + Sync,
{
    fn translate(
        &self,
        env: &mut dyn TranslationEnvironment,
        instruction: &NativeInstruction,
        out: &mut Vec<IrInstruction>,
    ) -> Result<(), TranslationError> {
        let mut em = IrEmitter::new(env, instruction.address).with_comment(instruction.to_string());
        (self.0)(&mut em, instruction)?;
        em.finish(out)?;
        Ok(())
    }
}

/// Mnemonic → translator table
#[derive(Default)]
pub struct TranslatorRegistry {
    translators: HashMap<String, Box<dyn InstructionTranslator>>,
}

impl TranslatorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a translator; a later registration for the same mnemonic
    /// replaces the earlier one
    pub fn register(&mut self, mnemonic: impl Into<String>, translator: Box<dyn InstructionTranslator>) {
        self.translators.insert(mnemonic.into(), translator);
    }

    pub fn register_fn<F>(&mut self, mnemonic: impl Into<String>, f: F)
    where
        F: Fn(&mut IrEmitter<'_>, &NativeInstruction) -> Result<(), TranslationError>
            + Send
            + Sync
            + 'static,
    {
        self.register(mnemonic, Box::new(EmitterTranslator(f)));
    }

    pub fn get(&self, mnemonic: &str) -> Option<&dyn InstructionTranslator> {
        self.translators.get(mnemonic).map(|t| t.as_ref())
    }

    pub fn contains(&self, mnemonic: &str) -> bool {
        self.translators.contains_key(mnemonic)
    }

    pub fn mnemonics(&self) -> impl Iterator<Item = &str> {
        self.translators.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.translators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.translators.is_empty()
    }
}

impl InstructionTranslator for TranslatorRegistry {
    fn translate(
        &self,
        env: &mut dyn TranslationEnvironment,
        instruction: &NativeInstruction,
        out: &mut Vec<IrInstruction>,
    ) -> Result<(), TranslationError> {
        let translator = self.get(&instruction.mnemonic).ok_or_else(|| {
            log::warn!("no translator for {} at {:#x}", instruction.mnemonic, instruction.address);
            TranslationError::UnsupportedMnemonic(instruction.mnemonic.clone())
        })?;

        let before = out.len();
        translator.translate(env, instruction, out)?;
        log::debug!(
            "{:#x}: {} -> {} IR instructions",
            instruction.address,
            instruction,
            out.len() - before
        );
        Ok(())
    }
}
