//! Arithmetic building blocks shared by all translators
//!
//! Carry and overflow are never special-cased by the interpreter. They are
//! computed here from ordinary IR: sums are evaluated in a temporary one size
//! wider than the operands, the natural-width result is masked out and the
//! carry is the bit just above it.

use rtl_error::TranslationError;
use rtl_ir::{IrOperand, Opcode, OperandSize};

use super::IrEmitter;

const FLAG: OperandSize = OperandSize::Byte;

/// Which side outputs an addition should compute
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AddFlags {
    pub carry: bool,
    pub overflow: bool,
}

impl AddFlags {
    pub const NONE: AddFlags = AddFlags {
        carry: false,
        overflow: false,
    };

    pub fn new(carry: bool, overflow: bool) -> Self {
        Self { carry, overflow }
    }
}

/// Temporaries holding the outputs of [`emit_add_with_carry`]
#[derive(Debug, Clone)]
pub struct AddOutputs {
    /// Sum truncated to the operand size
    pub result: IrOperand,
    /// Byte, 1 on unsigned carry out
    pub carry: Option<IrOperand>,
    /// Byte, 1 on signed overflow
    pub overflow: Option<IrOperand>,
}

/// `lhs + rhs + carry_in` with optional carry and overflow outputs
///
/// `lhs` and `rhs` must have the same size; `carry_in` is 0 or 1 of any size.
pub fn emit_add_with_carry(
    em: &mut IrEmitter<'_>,
    lhs: &IrOperand,
    rhs: &IrOperand,
    carry_in: Option<&IrOperand>,
    flags: AddFlags,
) -> Result<AddOutputs, TranslationError> {
    let size = lhs.size;
    if rhs.size != size {
        return Err(TranslationError::MalformedOperand(format!(
            "addition of {} and {} operands",
            size, rhs.size
        )));
    }
    let wide = size.wider().ok_or_else(|| {
        TranslationError::MalformedOperand(format!("no wider size than {} for carry", size))
    })?;

    let mut sum = em.temporary(wide);
    em.emit(Opcode::Add, lhs.clone(), rhs.clone(), sum.clone());
    if let Some(carry_in) = carry_in {
        let with_carry = em.temporary(wide);
        em.emit(Opcode::Add, sum, carry_in.clone(), with_carry.clone());
        sum = with_carry;
    }

    let result = em.temporary(size);
    em.emit(
        Opcode::And,
        sum.clone(),
        IrOperand::integer(size.mask(), wide),
        result.clone(),
    );

    let carry = flags.carry.then(|| {
        let carry = em.temporary(FLAG);
        em.emit(
            Opcode::Bsh,
            sum.clone(),
            IrOperand::signed(-i128::from(size.bits()), wide),
            carry.clone(),
        );
        carry
    });

    // sign bit of (lhs ^ result) & (rhs ^ result)
    let overflow = flags.overflow.then(|| {
        let lhs_diff = emit_binary(em, Opcode::Xor, lhs.clone(), result.clone());
        let rhs_diff = emit_binary(em, Opcode::Xor, rhs.clone(), result.clone());
        let both = emit_binary(em, Opcode::And, lhs_diff, rhs_diff);
        emit_sign_bit(em, &both)
    });

    Ok(AddOutputs {
        result,
        carry,
        overflow,
    })
}

/// `op1 <opcode> op2` into a fresh temporary of `op1`'s size
pub fn emit_binary(em: &mut IrEmitter<'_>, opcode: Opcode, op1: IrOperand, op2: IrOperand) -> IrOperand {
    let out = em.temporary(op1.size);
    em.emit(opcode, op1, op2, out.clone());
    out
}

/// Bitwise complement
pub fn emit_not(em: &mut IrEmitter<'_>, value: &IrOperand) -> IrOperand {
    let mask = IrOperand::integer(value.size.mask(), value.size);
    emit_binary(em, Opcode::Xor, value.clone(), mask)
}

/// Complement of a 0/1 flag
pub fn emit_flag_not(em: &mut IrEmitter<'_>, flag: &IrOperand) -> IrOperand {
    let one = IrOperand::integer(1, flag.size);
    emit_binary(em, Opcode::Xor, flag.clone(), one)
}

/// Most significant bit as a byte flag
pub fn emit_sign_bit(em: &mut IrEmitter<'_>, value: &IrOperand) -> IrOperand {
    let out = em.temporary(FLAG);
    em.emit(
        Opcode::Bsh,
        value.clone(),
        IrOperand::signed(-(i128::from(value.size.bits()) - 1), value.size),
        out.clone(),
    );
    out
}

pub fn emit_is_zero(em: &mut IrEmitter<'_>, value: &IrOperand) -> IrOperand {
    let out = em.temporary(FLAG);
    em.emit(Opcode::Bisz, value.clone(), IrOperand::empty(), out.clone());
    out
}

pub fn emit_is_nonzero(em: &mut IrEmitter<'_>, value: &IrOperand) -> IrOperand {
    let zero = emit_is_zero(em, value);
    emit_flag_not(em, &zero)
}

pub fn emit_equal(em: &mut IrEmitter<'_>, lhs: &IrOperand, rhs: &IrOperand) -> IrOperand {
    let diff = emit_binary(em, Opcode::Xor, lhs.clone(), rhs.clone());
    emit_is_zero(em, &diff)
}

/// Unsigned `lhs < rhs`: the borrow of `lhs - rhs` evaluated one size wider
pub fn emit_unsigned_less(
    em: &mut IrEmitter<'_>,
    lhs: &IrOperand,
    rhs: &IrOperand,
) -> Result<IrOperand, TranslationError> {
    let wide = lhs.size.max(rhs.size).wider().ok_or_else(|| {
        TranslationError::MalformedOperand(format!("no wider size than {} for borrow", lhs.size))
    })?;
    let diff = em.temporary(wide);
    em.emit(Opcode::Sub, lhs.clone(), rhs.clone(), diff.clone());
    Ok(emit_sign_bit(em, &diff))
}

/// Signed `lhs < rhs`: flipping both sign bits maps the signed order onto
/// the unsigned one
pub fn emit_signed_less(
    em: &mut IrEmitter<'_>,
    lhs: &IrOperand,
    rhs: &IrOperand,
) -> Result<IrOperand, TranslationError> {
    let lhs = flip_sign(em, lhs);
    let rhs = flip_sign(em, rhs);
    emit_unsigned_less(em, &lhs, &rhs)
}

fn flip_sign(em: &mut IrEmitter<'_>, value: &IrOperand) -> IrOperand {
    let sign = IrOperand::integer(value.size.sign_bit(), value.size);
    emit_binary(em, Opcode::Xor, value.clone(), sign)
}

/// Sign-extend `value` to `to`: `(v ^ s) - s` with `s` the sign bit
pub fn emit_sign_extend(em: &mut IrEmitter<'_>, value: &IrOperand, to: OperandSize) -> IrOperand {
    let flipped = flip_sign(em, value);
    let widened = em.temporary(to);
    em.copy(flipped, widened.clone());
    let out = em.temporary(to);
    em.emit(
        Opcode::Sub,
        widened,
        IrOperand::integer(value.size.sign_bit(), to),
        out.clone(),
    );
    out
}

/// All-ones mask of `size` when `flag` is 1, zero otherwise
pub fn emit_flag_mask(em: &mut IrEmitter<'_>, flag: &IrOperand, size: OperandSize) -> IrOperand {
    let out = em.temporary(size);
    em.emit(
        Opcode::Sub,
        IrOperand::integer(0, size),
        flag.clone(),
        out.clone(),
    );
    out
}

/// Two's complement of `value` when `flag` is 1
pub fn emit_negate_if(em: &mut IrEmitter<'_>, value: &IrOperand, flag: &IrOperand) -> IrOperand {
    let mask = emit_flag_mask(em, flag, value.size);
    let flipped = emit_binary(em, Opcode::Xor, value.clone(), mask.clone());
    emit_binary(em, Opcode::Sub, flipped, mask)
}

/// Magnitude and sign flag of a signed value
pub fn emit_abs(em: &mut IrEmitter<'_>, value: &IrOperand) -> (IrOperand, IrOperand) {
    let negative = emit_sign_bit(em, value);
    let magnitude = emit_negate_if(em, value, &negative);
    (magnitude, negative)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::translation::StandardEnvironment;

    #[test]
    fn test_add_without_flags_is_two_instructions() {
        let mut env = StandardEnvironment::new();
        let mut em = IrEmitter::new(&mut env, 0);
        let a = IrOperand::register("%r1", OperandSize::Dword);
        let b = IrOperand::integer(5, OperandSize::Dword);

        let outputs = emit_add_with_carry(&mut em, &a, &b, None, AddFlags::NONE).unwrap();
        assert!(outputs.carry.is_none());
        assert!(outputs.overflow.is_none());
        assert_eq!(outputs.result.size, OperandSize::Dword);

        let mut out = Vec::new();
        em.finish(&mut out).unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].op3.size, OperandSize::Qword);
        assert_eq!(out[1].opcode, Opcode::And);
    }

    #[test]
    fn test_mismatched_sizes_rejected() {
        let mut env = StandardEnvironment::new();
        let mut em = IrEmitter::new(&mut env, 0);
        let a = IrOperand::register("%r1", OperandSize::Dword);
        let b = IrOperand::integer(5, OperandSize::Byte);

        assert!(emit_add_with_carry(&mut em, &a, &b, None, AddFlags::NONE).is_err());

        let wide = IrOperand::integer(5, OperandSize::Oword);
        assert!(emit_add_with_carry(&mut em, &wide, &wide, None, AddFlags::NONE).is_err());
        assert!(em.is_empty());
    }
}
