//! Operand sizes
//!
//! Every IR operand carries one of these widths. Values are held in a `u128`
//! and reduced with [`OperandSize::truncate`] whenever they cross a width
//! boundary.

use rtl_error::IrError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperandSize {
    Byte,
    Word,
    Dword,
    Qword,
    Oword,
}

impl OperandSize {
    pub const fn bits(self) -> u32 {
        match self {
            OperandSize::Byte => 8,
            OperandSize::Word => 16,
            OperandSize::Dword => 32,
            OperandSize::Qword => 64,
            OperandSize::Oword => 128,
        }
    }

    pub const fn bytes(self) -> usize {
        (self.bits() / 8) as usize
    }

    /// All-ones value of this width
    pub const fn mask(self) -> u128 {
        match self {
            OperandSize::Oword => u128::MAX,
            _ => (1u128 << self.bits()) - 1,
        }
    }

    pub const fn sign_bit(self) -> u128 {
        1u128 << (self.bits() - 1)
    }

    /// Next larger size, used as the evaluation width for carry detection
    pub const fn wider(self) -> Option<OperandSize> {
        match self {
            OperandSize::Byte => Some(OperandSize::Word),
            OperandSize::Word => Some(OperandSize::Dword),
            OperandSize::Dword => Some(OperandSize::Qword),
            OperandSize::Qword => Some(OperandSize::Oword),
            OperandSize::Oword => None,
        }
    }

    pub const fn from_bits(bits: u32) -> Option<OperandSize> {
        match bits {
            8 => Some(OperandSize::Byte),
            16 => Some(OperandSize::Word),
            32 => Some(OperandSize::Dword),
            64 => Some(OperandSize::Qword),
            128 => Some(OperandSize::Oword),
            _ => None,
        }
    }

    pub const fn truncate(self, value: u128) -> u128 {
        value & self.mask()
    }

    /// Reinterpret the low `bits()` of `value` as a two's complement number
    pub const fn to_signed(self, value: u128) -> i128 {
        let value = self.truncate(value);
        if value & self.sign_bit() != 0 {
            // sign-extend by filling every bit above the width
            (value | !self.mask()) as i128
        } else {
            value as i128
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            OperandSize::Byte => "byte",
            OperandSize::Word => "word",
            OperandSize::Dword => "dword",
            OperandSize::Qword => "qword",
            OperandSize::Oword => "oword",
        }
    }
}

impl fmt::Display for OperandSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OperandSize {
    type Err = IrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "byte" | "b8" => Ok(OperandSize::Byte),
            "word" | "b16" => Ok(OperandSize::Word),
            "dword" | "b32" => Ok(OperandSize::Dword),
            "qword" | "b64" => Ok(OperandSize::Qword),
            "oword" | "b128" => Ok(OperandSize::Oword),
            _ => Err(IrError::InvalidSize(s.to_string())),
        }
    }
}
