//! PowerPC (32-bit) lifter
//!
//! [`PpcTranslator`] owns a registry with one translator per supported
//! mnemonic spelling, including the `o` and `.` forms. Carry, overflow and
//! condition bits are written as ordinary byte registers (`XERCA`, `CR0EQ`).

mod arithmetic;
mod branch;
mod compare;
mod flags;
mod logic;
mod memory;
mod operands;
mod shift;

use std::sync::Arc;

use rtl_error::{utils, RtlError, TranslationError};
use rtl_ir::{IrInstruction, Program};
use rtl_register::{CpuPolicy, PpcPolicy};

use crate::operand::NativeInstruction;
use crate::translation::{InstructionTranslator, StandardEnvironment, TranslationEnvironment, TranslatorRegistry};

pub struct PpcTranslator {
    registry: TranslatorRegistry,
    policy: Arc<PpcPolicy>,
}

impl PpcTranslator {
    pub fn new() -> Self {
        let mut registry = TranslatorRegistry::new();
        arithmetic::register(&mut registry);
        logic::register(&mut registry);
        shift::register(&mut registry);
        compare::register(&mut registry);
        memory::register(&mut registry);
        branch::register(&mut registry);
        log::debug!("PowerPC translator with {} mnemonics", registry.len());

        Self {
            registry,
            policy: Arc::new(PpcPolicy::new()),
        }
    }

    pub fn policy(&self) -> Arc<dyn CpuPolicy> {
        self.policy.clone()
    }

    /// Fresh environment resolving register widths against the PPC catalog
    pub fn environment(&self) -> StandardEnvironment {
        StandardEnvironment::with_policy(self.policy())
    }

    pub fn supports(&self, mnemonic: &str) -> bool {
        self.registry.contains(mnemonic)
    }

    pub fn mnemonics(&self) -> impl Iterator<Item = &str> {
        self.registry.mnemonics()
    }

    /// Translate a sequence of instructions sharing one environment
    ///
    /// Stops at the first failure; the error names the offending mnemonic.
    pub fn translate_block(
        &self,
        env: &mut dyn TranslationEnvironment,
        instructions: &[NativeInstruction],
    ) -> Result<Vec<IrInstruction>, TranslationError> {
        let mut out = Vec::new();
        for instruction in instructions {
            self.registry.translate(env, instruction, &mut out)?;
        }
        Ok(out)
    }

    /// Translate `instructions` in a fresh environment into a program
    ///
    /// Failures are logged at their severity before being returned.
    pub fn lift(&self, instructions: &[NativeInstruction]) -> Result<Program, RtlError> {
        self.lift_block(instructions)
            .inspect_err(|error| utils::log_error(error, "ppc"))
    }

    fn lift_block(&self, instructions: &[NativeInstruction]) -> Result<Program, RtlError> {
        let mut env = self.environment();
        let ir = self.translate_block(&mut env, instructions)?;
        log::info!(
            "lifted {} native instructions into {} IR instructions",
            instructions.len(),
            ir.len()
        );
        Ok(Program::from_instructions(ir)?)
    }
}

impl Default for PpcTranslator {
    fn default() -> Self {
        Self::new()
    }
}

impl InstructionTranslator for PpcTranslator {
    fn translate(
        &self,
        env: &mut dyn TranslationEnvironment,
        instruction: &NativeInstruction,
        out: &mut Vec<IrInstruction>,
    ) -> Result<(), TranslationError> {
        self.registry.translate(env, instruction, out)
    }
}
