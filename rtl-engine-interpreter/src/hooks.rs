//! Interpreter hooks

use rtl_error::InterpreterError;
use rtl_ir::{IrAddress, IrInstruction};

use crate::ExecStats;

/// Observer called around the fetch/execute loop
///
/// `next_instruction` runs after fetch and before the instruction has any
/// effect. Returning an error aborts interpretation with that error.
pub trait InterpreterPolicy {
    fn start(&mut self, _entry: IrAddress) {}

    fn next_instruction(&mut self, _instruction: &IrInstruction) -> Result<(), InterpreterError> {
        Ok(())
    }

    fn end(&mut self, _stats: &ExecStats) {}
}

/// Hooks that do nothing
#[derive(Debug, Default, Clone, Copy)]
pub struct EmptyInterpreterPolicy;

impl InterpreterPolicy for EmptyInterpreterPolicy {}
