//! IR programs
//!
//! A program maps IR addresses to instructions. Sequential fallthrough is
//! the next key in address order; `jcc` is the only other edge.

use crate::address::IrAddress;
use crate::instruction::IrInstruction;
use rtl_error::IrError;
use std::collections::BTreeMap;
use std::ops::Bound;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Program {
    instructions: BTreeMap<IrAddress, IrInstruction>,
}

impl Program {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a program, rejecting two instructions at the same address
    pub fn from_instructions<I>(instructions: I) -> Result<Self, IrError>
    where
        I: IntoIterator<Item = IrInstruction>,
    {
        let mut program = Self::new();
        for instruction in instructions {
            program.insert(instruction)?;
        }
        Ok(program)
    }

    pub fn insert(&mut self, instruction: IrInstruction) -> Result<(), IrError> {
        if self.instructions.contains_key(&instruction.address) {
            return Err(IrError::DuplicateAddress(instruction.address.to_string()));
        }
        self.instructions.insert(instruction.address, instruction);
        Ok(())
    }

    pub fn get(&self, address: IrAddress) -> Option<&IrInstruction> {
        self.instructions.get(&address)
    }

    pub fn contains(&self, address: IrAddress) -> bool {
        self.instructions.contains_key(&address)
    }

    /// Fallthrough successor: the next offset at the same native address, or
    /// the first instruction of the next native address
    pub fn next_address(&self, address: IrAddress) -> Option<IrAddress> {
        self.instructions
            .range((Bound::Excluded(address), Bound::Unbounded))
            .next()
            .map(|(address, _)| *address)
    }

    pub fn first_address(&self) -> Option<IrAddress> {
        self.instructions.keys().next().copied()
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &IrInstruction> {
        self.instructions.values()
    }
}
