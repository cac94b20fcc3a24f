//! Operand extraction for PPC translators

use std::ops::RangeInclusive;

use rtl_error::TranslationError;
use rtl_ir::IrOperand;
use rtl_register::ppc::{self, GPR_SIZE};

use crate::operand::{resolve_operand, NativeInstruction, OperandNode, ResolvedOperand};
use crate::translation::IrEmitter;

pub(crate) const SIMM16: RangeInclusive<i64> = -0x8000..=0x7FFF;
pub(crate) const UIMM16: RangeInclusive<i64> = 0..=0xFFFF;
/// `addis`/`lis` accept both signed and unsigned spellings
pub(crate) const HIGH16: RangeInclusive<i64> = -0x8000..=0xFFFF;
pub(crate) const SHIFT5: RangeInclusive<i64> = 0..=31;

pub(crate) fn expect_count(instr: &NativeInstruction, expected: usize) -> Result<(), TranslationError> {
    if instr.operands.len() != expected {
        return Err(TranslationError::OperandCount {
            mnemonic: instr.mnemonic.clone(),
            expected: expected.to_string(),
            found: instr.operands.len(),
        });
    }
    Ok(())
}

fn node<'i>(instr: &'i NativeInstruction, index: usize) -> Result<&'i OperandNode, TranslationError> {
    instr
        .operands
        .get(index)
        .ok_or_else(|| TranslationError::invalid_operand(&instr.mnemonic, index, "missing"))
}

fn gpr_index(em: &IrEmitter<'_>, instr: &NativeInstruction, index: usize) -> Result<u8, TranslationError> {
    match resolve_operand(em.env(), node(instr, index)?)? {
        ResolvedOperand::Register { name, size } => {
            let i = ppc::parse_gpr(&name).ok_or_else(|| {
                TranslationError::invalid_operand(
                    &instr.mnemonic,
                    index,
                    format!("{} is not a general purpose register", name),
                )
            })?;
            if size != GPR_SIZE {
                return Err(TranslationError::invalid_operand(
                    &instr.mnemonic,
                    index,
                    format!("expected a {} register, {} is {}", GPR_SIZE, name, size),
                ));
            }
            Ok(i)
        }
        other => Err(TranslationError::invalid_operand(
            &instr.mnemonic,
            index,
            format!("expected a register, found {:?}", other),
        )),
    }
}

/// General purpose register operand, canonically named
pub(crate) fn gpr(
    em: &IrEmitter<'_>,
    instr: &NativeInstruction,
    index: usize,
) -> Result<IrOperand, TranslationError> {
    let i = gpr_index(em, instr, index)?;
    Ok(IrOperand::register(ppc::gpr(i), GPR_SIZE))
}

/// `(rA|0)`: `%r0` in a base position reads as the literal zero
pub(crate) fn gpr_or_zero(
    em: &IrEmitter<'_>,
    instr: &NativeInstruction,
    index: usize,
) -> Result<IrOperand, TranslationError> {
    let i = gpr_index(em, instr, index)?;
    Ok(if i == 0 {
        IrOperand::integer(0, GPR_SIZE)
    } else {
        IrOperand::register(ppc::gpr(i), GPR_SIZE)
    })
}

pub(crate) fn immediate(
    em: &IrEmitter<'_>,
    instr: &NativeInstruction,
    index: usize,
    range: RangeInclusive<i64>,
) -> Result<i64, TranslationError> {
    match resolve_operand(em.env(), node(instr, index)?)? {
        ResolvedOperand::Literal { value, .. } if range.contains(&value) => Ok(value),
        ResolvedOperand::Literal { value, .. } => Err(TranslationError::invalid_operand(
            &instr.mnemonic,
            index,
            format!("immediate {} outside {:?}", value, range),
        )),
        other => Err(TranslationError::invalid_operand(
            &instr.mnemonic,
            index,
            format!("expected an immediate, found {:?}", other),
        )),
    }
}

/// Branch target: an absolute native address
pub(crate) fn target(
    em: &IrEmitter<'_>,
    instr: &NativeInstruction,
    index: usize,
) -> Result<IrOperand, TranslationError> {
    let value = immediate(em, instr, index, 0..=i64::from(u32::MAX))?;
    Ok(IrOperand::integer(value as u128, GPR_SIZE))
}

/// `d(rA)` memory operand as `(base, displacement)`; base `%r0` reads as zero
pub(crate) fn displacement(
    em: &IrEmitter<'_>,
    instr: &NativeInstruction,
    index: usize,
) -> Result<(IrOperand, i64), TranslationError> {
    match resolve_operand(em.env(), node(instr, index)?)? {
        ResolvedOperand::Memory {
            base: Some(base),
            index: None,
            displacement,
            ..
        } => {
            if !SIMM16.contains(&displacement) {
                return Err(TranslationError::invalid_operand(
                    &instr.mnemonic,
                    index,
                    format!("displacement {} outside 16 bits", displacement),
                ));
            }
            let i = ppc::parse_gpr(&base).ok_or_else(|| {
                TranslationError::invalid_operand(
                    &instr.mnemonic,
                    index,
                    format!("{} is not a general purpose register", base),
                )
            })?;
            let base = if i == 0 {
                IrOperand::integer(0, GPR_SIZE)
            } else {
                IrOperand::register(ppc::gpr(i), GPR_SIZE)
            };
            Ok((base, displacement))
        }
        other => Err(TranslationError::invalid_operand(
            &instr.mnemonic,
            index,
            format!("expected d(rA), found {:?}", other),
        )),
    }
}

/// Leading `%crN` operand of compares and conditional branches
///
/// Returns the field (0 when omitted) and the index of the next operand.
pub(crate) fn optional_cr_field(instr: &NativeInstruction) -> (u8, usize) {
    let mut first = instr.operands.first();
    while let Some(OperandNode::SizePrefix(_, child)) = first {
        first = Some(child.as_ref());
    }
    match first {
        Some(OperandNode::Register(name)) => match ppc::parse_cr_field(name) {
            Some(field) => (field, 1),
            None => (0, 0),
        },
        _ => (0, 0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::translation::StandardEnvironment;
    use rtl_register::PpcPolicy;
    use std::sync::Arc;

    fn instr(operands: Vec<OperandNode>) -> NativeInstruction {
        NativeInstruction::new(0x100, "test", operands)
    }

    #[test]
    fn test_gpr_canonical_name() {
        let mut env = StandardEnvironment::with_policy(Arc::new(PpcPolicy::new()));
        let em = IrEmitter::new(&mut env, 0);
        let i = instr(vec![
            OperandNode::sized(rtl_ir::OperandSize::Dword, OperandNode::register("r7")),
            OperandNode::register("%r0"),
            OperandNode::register("XERCA"),
        ]);

        assert_eq!(gpr(&em, &i, 0).unwrap().register_name(), Some("%r7"));
        assert_eq!(gpr_or_zero(&em, &i, 1).unwrap().integer_value(), Some(0));
        assert!(gpr(&em, &i, 2).is_err());
        assert!(gpr(&em, &i, 3).is_err());
    }

    #[test]
    fn test_gpr_rejects_narrow_prefix() {
        let mut env = StandardEnvironment::with_policy(Arc::new(PpcPolicy::new()));
        let em = IrEmitter::new(&mut env, 0);
        let i = instr(vec![
            OperandNode::sized(rtl_ir::OperandSize::Byte, OperandNode::register("%r0")),
            OperandNode::sized(rtl_ir::OperandSize::Word, OperandNode::register("%r4")),
        ]);

        assert!(matches!(
            gpr(&em, &i, 0),
            Err(TranslationError::InvalidOperand { index: 0, .. })
        ));
        assert!(matches!(
            gpr_or_zero(&em, &i, 1),
            Err(TranslationError::InvalidOperand { index: 1, .. })
        ));
    }

    #[test]
    fn test_immediate_range() {
        let mut env = StandardEnvironment::new();
        let em = IrEmitter::new(&mut env, 0);
        let i = instr(vec![OperandNode::immediate(0x8000)]);

        assert!(immediate(&em, &i, 0, SIMM16).is_err());
        assert_eq!(immediate(&em, &i, 0, UIMM16).unwrap(), 0x8000);
    }

    #[test]
    fn test_displacement_operand() {
        let mut env = StandardEnvironment::with_policy(Arc::new(PpcPolicy::new()));
        let em = IrEmitter::new(&mut env, 0);
        let i = instr(vec![
            OperandNode::displacement(-16, "%r1"),
            OperandNode::displacement(4, "%r0"),
        ]);

        let (base, disp) = displacement(&em, &i, 0).unwrap();
        assert_eq!(base.register_name(), Some("%r1"));
        assert_eq!(disp, -16);

        let (base, _) = displacement(&em, &i, 1).unwrap();
        assert_eq!(base.integer_value(), Some(0));
    }

    #[test]
    fn test_optional_cr_field() {
        let with = instr(vec![OperandNode::register("%cr6"), OperandNode::register("%r3")]);
        assert_eq!(optional_cr_field(&with), (6, 1));

        let without = instr(vec![OperandNode::register("%r3")]);
        assert_eq!(optional_cr_field(&without), (0, 0));
    }
}
