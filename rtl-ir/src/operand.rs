//! IR operands
//!
//! Each of the three operand slots of an IR instruction holds an
//! [`IrOperand`]: a register, an integer literal, an IR sub-address or
//! nothing, always paired with an explicit size.

use crate::address::IrAddress;
use crate::size::OperandSize;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OperandKind {
    Empty,
    Register(String),
    Integer(u128),
    SubAddress(IrAddress),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IrOperand {
    pub kind: OperandKind,
    pub size: OperandSize,
}

impl IrOperand {
    pub fn empty() -> Self {
        Self {
            kind: OperandKind::Empty,
            size: OperandSize::Byte,
        }
    }

    pub fn register(name: impl Into<String>, size: OperandSize) -> Self {
        Self {
            kind: OperandKind::Register(name.into()),
            size,
        }
    }

    /// Integer literal, reduced to `size`
    pub fn integer(value: u128, size: OperandSize) -> Self {
        Self {
            kind: OperandKind::Integer(size.truncate(value)),
            size,
        }
    }

    /// Two's complement encoding of `value` in `size`
    pub fn signed(value: i128, size: OperandSize) -> Self {
        Self::integer(value as u128, size)
    }

    pub fn sub_address(address: IrAddress) -> Self {
        Self {
            kind: OperandKind::SubAddress(address),
            size: OperandSize::Qword,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self.kind, OperandKind::Empty)
    }

    pub fn register_name(&self) -> Option<&str> {
        match &self.kind {
            OperandKind::Register(name) => Some(name),
            _ => None,
        }
    }

    pub fn integer_value(&self) -> Option<u128> {
        match self.kind {
            OperandKind::Integer(value) => Some(value),
            _ => None,
        }
    }
}

impl fmt::Display for IrOperand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            OperandKind::Empty => Ok(()),
            OperandKind::Register(name) => write!(f, "{} {}", self.size, name),
            OperandKind::Integer(value) => write!(f, "{} {}", self.size, value),
            OperandKind::SubAddress(address) => write!(f, "{} {}", self.size, address),
        }
    }
}
