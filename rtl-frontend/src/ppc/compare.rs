//! Integer comparisons into a condition-register field

use rtl_error::TranslationError;
use rtl_ir::IrOperand;
use rtl_register::ppc::GPR_SIZE;

use super::flags::set_cr_field;
use super::operands::{gpr, immediate, optional_cr_field, SIMM16, UIMM16};
use crate::operand::NativeInstruction;
use crate::translation::arith::{emit_equal, emit_signed_less, emit_unsigned_less};
use crate::translation::{IrEmitter, TranslatorRegistry};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Rhs {
    Register,
    Immediate,
}

/// `cmp[l]w[i] [crN,] rA, rB|IMM`
fn translate_compare(
    em: &mut IrEmitter<'_>,
    instr: &NativeInstruction,
    signed: bool,
    rhs: Rhs,
) -> Result<(), TranslationError> {
    let (field, first) = optional_cr_field(instr);
    if instr.operands.len() != first + 2 {
        return Err(TranslationError::OperandCount {
            mnemonic: instr.mnemonic.clone(),
            expected: "2 or 3".to_string(),
            found: instr.operands.len(),
        });
    }

    let lhs = gpr(em, instr, first)?;
    let rhs = match rhs {
        Rhs::Register => gpr(em, instr, first + 1)?,
        Rhs::Immediate if signed => {
            let value = immediate(em, instr, first + 1, SIMM16)?;
            IrOperand::signed(i128::from(value), GPR_SIZE)
        }
        Rhs::Immediate => {
            let value = immediate(em, instr, first + 1, UIMM16)?;
            IrOperand::integer(value as u128, GPR_SIZE)
        }
    };

    let lt = if signed {
        emit_signed_less(em, &lhs, &rhs)?
    } else {
        emit_unsigned_less(em, &lhs, &rhs)?
    };
    let eq = emit_equal(em, &lhs, &rhs);
    set_cr_field(em, field, lt, eq);
    Ok(())
}

pub(crate) fn register(registry: &mut TranslatorRegistry) {
    let forms = [
        ("cmpw", true, Rhs::Register),
        ("cmpwi", true, Rhs::Immediate),
        ("cmplw", false, Rhs::Register),
        ("cmplwi", false, Rhs::Immediate),
    ];
    for (mnemonic, signed, rhs) in forms {
        registry.register_fn(mnemonic, move |em: &mut IrEmitter<'_>, instr: &NativeInstruction| {
            translate_compare(em, instr, signed, rhs)
        });
    }
}
