//! Shifts and rotate-and-mask

use rtl_error::TranslationError;
use rtl_ir::{IrOperand, Opcode, OperandSize};
use rtl_register::ppc::{GPR_SIZE, XER_CA};

use super::flags::{flag, record_cr0, variants};
use super::operands::{expect_count, gpr, immediate, SHIFT5};
use crate::operand::NativeInstruction;
use crate::translation::arith::{emit_binary, emit_is_nonzero, emit_sign_bit, emit_sign_extend};
use crate::translation::{IrEmitter, TranslatorRegistry};

/// Mask with PPC bits `mb..=me` set, bit 0 being the most significant;
/// wraps around when `mb > me`
pub(crate) fn rotate_mask(mb: u32, me: u32) -> u32 {
    let begin = u32::MAX >> mb;
    let end = u32::MAX << (31 - me);
    if mb <= me { begin & end } else { begin | end }
}

/// `-amount` in the amount's size, which `bsh` reads as a right shift
fn negate(em: &mut IrEmitter<'_>, amount: IrOperand) -> IrOperand {
    let size = amount.size;
    emit_binary(em, Opcode::Sub, IrOperand::integer(0, size), amount)
}

/// Shift amount from `rB`: the low six bits, so 32..63 shift everything out
fn register_amount(em: &mut IrEmitter<'_>, rb: IrOperand) -> IrOperand {
    emit_binary(em, Opcode::And, rb, IrOperand::integer(0x3F, GPR_SIZE))
}

/// `slw[.]` / `srw[.]`
fn translate_shift(
    em: &mut IrEmitter<'_>,
    instr: &NativeInstruction,
    left: bool,
    record: bool,
) -> Result<(), TranslationError> {
    expect_count(instr, 3)?;
    let ra = gpr(em, instr, 0)?;
    let rs = gpr(em, instr, 1)?;
    let rb = gpr(em, instr, 2)?;

    let amount = register_amount(em, rb);
    let amount = if left { amount } else { negate(em, amount) };
    let result = em.temporary(GPR_SIZE);
    em.emit(Opcode::Bsh, rs, amount, result.clone());
    em.copy(result, ra.clone());

    if record {
        record_cr0(em, &ra);
    }
    Ok(())
}

/// Arithmetic right shift of `rs` by `amount` (0..=63)
///
/// The value is sign-extended to 128 bits so a logical shift keeps the sign.
/// CA is set when `rs` is negative and any one bits were shifted out.
fn emit_shift_right_algebraic(
    em: &mut IrEmitter<'_>,
    rs: &IrOperand,
    amount: IrOperand,
) -> (IrOperand, IrOperand) {
    let wide = emit_sign_extend(em, rs, OperandSize::Oword);
    let right = negate(em, amount.clone());
    let shifted = em.temporary(OperandSize::Oword);
    em.emit(Opcode::Bsh, wide.clone(), right, shifted.clone());

    let back = em.temporary(OperandSize::Oword);
    em.emit(Opcode::Bsh, shifted.clone(), amount, back.clone());
    let lost = emit_binary(em, Opcode::Xor, back, wide);
    let any_lost = emit_is_nonzero(em, &lost);
    let negative = emit_sign_bit(em, rs);
    let carry = emit_binary(em, Opcode::And, negative, any_lost);

    let result = em.temporary(GPR_SIZE);
    em.copy(shifted, result.clone());
    (result, carry)
}

/// `sraw[.]` / `srawi[.]`
fn translate_sraw(
    em: &mut IrEmitter<'_>,
    instr: &NativeInstruction,
    immediate_amount: bool,
    record: bool,
) -> Result<(), TranslationError> {
    expect_count(instr, 3)?;
    let ra = gpr(em, instr, 0)?;
    let rs = gpr(em, instr, 1)?;
    let amount = if immediate_amount {
        IrOperand::integer(immediate(em, instr, 2, SHIFT5)? as u128, GPR_SIZE)
    } else {
        let rb = gpr(em, instr, 2)?;
        register_amount(em, rb)
    };

    let (result, carry) = emit_shift_right_algebraic(em, &rs, amount);
    em.copy(result, ra.clone());
    em.copy(carry, flag(XER_CA));

    if record {
        record_cr0(em, &ra);
    }
    Ok(())
}

fn emit_rotate_and_mask(
    em: &mut IrEmitter<'_>,
    rs: IrOperand,
    sh: u32,
    mask: u32,
    ra: &IrOperand,
) {
    let rotated = if sh == 0 {
        rs
    } else {
        let high = em.temporary(GPR_SIZE);
        em.emit(
            Opcode::Bsh,
            rs.clone(),
            IrOperand::integer(u128::from(sh), GPR_SIZE),
            high.clone(),
        );
        let low = em.temporary(GPR_SIZE);
        em.emit(
            Opcode::Bsh,
            rs,
            IrOperand::signed(-i128::from(32 - sh), GPR_SIZE),
            low.clone(),
        );
        emit_binary(em, Opcode::Or, high, low)
    };
    let result = emit_binary(em, Opcode::And, rotated, IrOperand::integer(u128::from(mask), GPR_SIZE));
    em.copy(result, ra.clone());
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RotateForm {
    /// `rlwinm rA, rS, SH, MB, ME`
    Full,
    /// `slwi rA, rS, n` = `rlwinm rA, rS, n, 0, 31-n`
    ShiftLeft,
    /// `srwi rA, rS, n` = `rlwinm rA, rS, 32-n, n, 31`
    ShiftRight,
    /// `rotlwi rA, rS, n` = `rlwinm rA, rS, n, 0, 31`
    Rotate,
}

fn translate_rotate(
    em: &mut IrEmitter<'_>,
    instr: &NativeInstruction,
    form: RotateForm,
    record: bool,
) -> Result<(), TranslationError> {
    expect_count(instr, if form == RotateForm::Full { 5 } else { 3 })?;
    let ra = gpr(em, instr, 0)?;
    let rs = gpr(em, instr, 1)?;
    let n = immediate(em, instr, 2, SHIFT5)? as u32;

    let (sh, mb, me) = match form {
        RotateForm::Full => (
            n,
            immediate(em, instr, 3, SHIFT5)? as u32,
            immediate(em, instr, 4, SHIFT5)? as u32,
        ),
        RotateForm::ShiftLeft => (n, 0, 31 - n),
        RotateForm::ShiftRight => ((32 - n) % 32, n, 31),
        RotateForm::Rotate => (n, 0, 31),
    };

    emit_rotate_and_mask(em, rs, sh, rotate_mask(mb, me), &ra);
    if record {
        record_cr0(em, &ra);
    }
    Ok(())
}

pub(crate) fn register(registry: &mut TranslatorRegistry) {
    for (base, left) in [("slw", true), ("srw", false)] {
        for (mnemonic, _, record) in variants(base, false) {
            registry.register_fn(mnemonic, move |em: &mut IrEmitter<'_>, instr: &NativeInstruction| {
                translate_shift(em, instr, left, record)
            });
        }
    }

    for (base, immediate_amount) in [("sraw", false), ("srawi", true)] {
        for (mnemonic, _, record) in variants(base, false) {
            registry.register_fn(mnemonic, move |em: &mut IrEmitter<'_>, instr: &NativeInstruction| {
                translate_sraw(em, instr, immediate_amount, record)
            });
        }
    }

    let rotates = [
        ("rlwinm", RotateForm::Full),
        ("slwi", RotateForm::ShiftLeft),
        ("srwi", RotateForm::ShiftRight),
        ("rotlwi", RotateForm::Rotate),
    ];
    for (base, form) in rotates {
        for (mnemonic, _, record) in variants(base, false) {
            registry.register_fn(mnemonic, move |em: &mut IrEmitter<'_>, instr: &NativeInstruction| {
                translate_rotate(em, instr, form, record)
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rotate_mask() {
        assert_eq!(rotate_mask(0, 31), 0xFFFF_FFFF);
        assert_eq!(rotate_mask(0, 0), 0x8000_0000);
        assert_eq!(rotate_mask(31, 31), 0x0000_0001);
        assert_eq!(rotate_mask(16, 31), 0x0000_FFFF);
        assert_eq!(rotate_mask(24, 7), 0xFF00_00FF);
    }
}
