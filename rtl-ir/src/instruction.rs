//! IR instruction set
//!
//! A deliberately small three-address catalog. `op1` and `op2` are sources,
//! `op3` is the destination (or the jump target / store address).

use crate::address::IrAddress;
use crate::operand::IrOperand;
use crate::size::OperandSize;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Opcode {
    // Arithmetic
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    /// Shift `op1` by the signed amount in `op2`: positive left, negative right
    Bsh,

    // Bitwise
    And,
    Or,
    Xor,

    // Comparison
    /// `op3 = (op1 == 0)`
    Bisz,

    // Control transfer
    /// Jump to `op3` when `op1` is non-zero
    Jcc,

    // Memory / register transfer
    Ldm,
    Stm,
    Str,

    // Other
    Nop,
    Undef,
    Unkn,
    Halt,
}

impl Opcode {
    pub fn mnemonic(&self) -> &'static str {
        match self {
            Opcode::Add => "add",
            Opcode::Sub => "sub",
            Opcode::Mul => "mul",
            Opcode::Div => "div",
            Opcode::Mod => "mod",
            Opcode::Bsh => "bsh",
            Opcode::And => "and",
            Opcode::Or => "or",
            Opcode::Xor => "xor",
            Opcode::Bisz => "bisz",
            Opcode::Jcc => "jcc",
            Opcode::Ldm => "ldm",
            Opcode::Stm => "stm",
            Opcode::Str => "str",
            Opcode::Nop => "nop",
            Opcode::Undef => "undef",
            Opcode::Unkn => "unkn",
            Opcode::Halt => "halt",
        }
    }

    /// Opcodes whose `op3` is a register written by the instruction
    pub fn writes_register(&self) -> bool {
        matches!(
            self,
            Opcode::Add
                | Opcode::Sub
                | Opcode::Mul
                | Opcode::Div
                | Opcode::Mod
                | Opcode::Bsh
                | Opcode::And
                | Opcode::Or
                | Opcode::Xor
                | Opcode::Bisz
                | Opcode::Ldm
                | Opcode::Str
        )
    }

    pub fn is_jump(&self) -> bool {
        matches!(self, Opcode::Jcc)
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IrInstruction {
    pub address: IrAddress,
    pub opcode: Opcode,
    pub op1: IrOperand,
    pub op2: IrOperand,
    pub op3: IrOperand,
    pub comment: Option<String>,
}

impl IrInstruction {
    pub fn new(
        address: IrAddress,
        opcode: Opcode,
        op1: IrOperand,
        op2: IrOperand,
        op3: IrOperand,
    ) -> Self {
        Self {
            address,
            opcode,
            op1,
            op2,
            op3,
            comment: None,
        }
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    /// Width of the destination operand
    pub fn width(&self) -> OperandSize {
        self.op3.size
    }
}

impl fmt::Display for IrInstruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} [{}, {}, {}]",
            self.address, self.opcode, self.op1, self.op2, self.op3
        )?;
        if let Some(comment) = &self.comment {
            write!(f, " ; {}", comment)?;
        }
        Ok(())
    }
}
