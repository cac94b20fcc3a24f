use crate::size::OperandSize;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RegisterStatus {
    Defined,
    Undefined,
}

/// Contents of one register
///
/// The value is always reduced to `size`. An `Undefined` register keeps its
/// stale value, which consumers that check the status must ignore.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterValue {
    value: u128,
    size: OperandSize,
    status: RegisterStatus,
}

impl RegisterValue {
    pub fn new(value: u128, size: OperandSize, status: RegisterStatus) -> Self {
        Self {
            value: size.truncate(value),
            size,
            status,
        }
    }

    pub fn defined(value: u128, size: OperandSize) -> Self {
        Self::new(value, size, RegisterStatus::Defined)
    }

    pub fn value(&self) -> u128 {
        self.value
    }

    pub fn size(&self) -> OperandSize {
        self.size
    }

    pub fn status(&self) -> RegisterStatus {
        self.status
    }

    pub fn is_defined(&self) -> bool {
        self.status == RegisterStatus::Defined
    }

    /// Same stale value, marked undefined
    pub fn undefine(self) -> Self {
        Self {
            status: RegisterStatus::Undefined,
            ..self
        }
    }
}
