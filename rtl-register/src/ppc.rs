//! PowerPC (32-bit) register catalog
//!
//! General purpose registers are `%r0` .. `%r31`. XER and the condition
//! register are split into one register per bit (`XERCA`, `CR0LT`, ...), each
//! a byte wide, so flag updates are ordinary register writes.

use crate::{CpuPolicy, RegisterCatalog, RegisterClass, RegisterInfo};
use rtl_ir::OperandSize;

pub const GPR_COUNT: u8 = 32;
pub const CR_FIELD_COUNT: u8 = 8;

pub const GPR_SIZE: OperandSize = OperandSize::Dword;
pub const FLAG_SIZE: OperandSize = OperandSize::Byte;

pub const XER_CA: &str = "XERCA";
pub const XER_OV: &str = "XEROV";
pub const XER_SO: &str = "XERSO";
pub const LR: &str = "LR";
pub const CTR: &str = "CTR";
pub const PC: &str = "PC";

/// Bits of one condition-register field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CrBit {
    Lt,
    Gt,
    Eq,
    So,
}

impl CrBit {
    pub const ALL: [CrBit; 4] = [CrBit::Lt, CrBit::Gt, CrBit::Eq, CrBit::So];

    fn suffix(self) -> &'static str {
        match self {
            CrBit::Lt => "LT",
            CrBit::Gt => "GT",
            CrBit::Eq => "EQ",
            CrBit::So => "SO",
        }
    }
}

pub fn gpr(index: u8) -> String {
    format!("%r{}", index)
}

/// Name of one condition-register bit, e.g. `CR0EQ`
pub fn cr_bit(field: u8, bit: CrBit) -> String {
    format!("CR{}{}", field, bit.suffix())
}

/// Parse a general purpose register name (`%r5`, `r5`) into its index
pub fn parse_gpr(name: &str) -> Option<u8> {
    let digits = name.strip_prefix('%').unwrap_or(name).strip_prefix('r')?;
    let index: u8 = digits.parse().ok()?;
    (index < GPR_COUNT).then_some(index)
}

/// Parse a condition-register field name (`%cr3`, `cr3`) into its index
pub fn parse_cr_field(name: &str) -> Option<u8> {
    let digits = name.strip_prefix('%').unwrap_or(name).strip_prefix("cr")?;
    let index: u8 = digits.parse().ok()?;
    (index < CR_FIELD_COUNT).then_some(index)
}

#[derive(Debug, Clone)]
pub struct PpcPolicy {
    catalog: RegisterCatalog,
}

impl PpcPolicy {
    pub fn new() -> Self {
        let gprs = (0..GPR_COUNT)
            .map(|i| RegisterInfo::new(gpr(i), GPR_SIZE, RegisterClass::GeneralPurpose));
        let flags = [XER_CA, XER_OV, XER_SO]
            .into_iter()
            .map(|name| RegisterInfo::new(name, FLAG_SIZE, RegisterClass::Flag));
        let conditions = (0..CR_FIELD_COUNT).flat_map(|field| {
            CrBit::ALL
                .into_iter()
                .map(move |bit| RegisterInfo::new(cr_bit(field, bit), FLAG_SIZE, RegisterClass::Condition))
        });
        let special = [LR, CTR, PC]
            .into_iter()
            .map(|name| RegisterInfo::new(name, GPR_SIZE, RegisterClass::Special));

        Self {
            catalog: gprs.chain(flags).chain(conditions).chain(special).collect(),
        }
    }
}

impl Default for PpcPolicy {
    fn default() -> Self {
        Self::new()
    }
}

impl CpuPolicy for PpcPolicy {
    fn name(&self) -> &str {
        "PowerPC"
    }

    fn catalog(&self) -> &RegisterCatalog {
        &self.catalog
    }

    fn program_counter(&self) -> &str {
        PC
    }
}
