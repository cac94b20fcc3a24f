//! XER and condition-register updates

use rtl_ir::{IrOperand, Opcode};
use rtl_register::ppc::{self, CrBit, FLAG_SIZE, XER_OV, XER_SO};

use crate::translation::arith::{emit_binary, emit_flag_not, emit_is_zero, emit_sign_bit};
use crate::translation::IrEmitter;

pub(crate) fn flag(name: &str) -> IrOperand {
    IrOperand::register(name, FLAG_SIZE)
}

pub(crate) fn cr(field: u8, bit: CrBit) -> IrOperand {
    flag(&ppc::cr_bit(field, bit))
}

/// `XER[OV] = ov; XER[SO] |= ov`
pub(crate) fn write_overflow(em: &mut IrEmitter<'_>, ov: IrOperand) {
    em.copy(ov, flag(XER_OV));
    em.emit(Opcode::Or, flag(XER_SO), flag(XER_OV), flag(XER_SO));
}

/// Set a condition-register field from less-than and equal flags
///
/// GT is derived as neither LT nor EQ; SO is copied from XER.
pub(crate) fn set_cr_field(em: &mut IrEmitter<'_>, field: u8, lt: IrOperand, eq: IrOperand) {
    let either = emit_binary(em, Opcode::Or, lt.clone(), eq.clone());
    let gt = emit_flag_not(em, &either);
    em.copy(lt, cr(field, CrBit::Lt));
    em.copy(gt, cr(field, CrBit::Gt));
    em.copy(eq, cr(field, CrBit::Eq));
    em.copy(flag(XER_SO), cr(field, CrBit::So));
}

/// Record form: CR0 from a signed comparison of `result` with zero
pub(crate) fn record_cr0(em: &mut IrEmitter<'_>, result: &IrOperand) {
    let lt = emit_sign_bit(em, result);
    let eq = emit_is_zero(em, result);
    set_cr_field(em, 0, lt, eq);
}

/// Record form when the result is undefined: LT, GT and EQ become
/// undefined, SO is still copied
pub(crate) fn undefine_cr0(em: &mut IrEmitter<'_>) {
    for bit in [CrBit::Lt, CrBit::Gt, CrBit::Eq] {
        em.emit(Opcode::Undef, IrOperand::empty(), IrOperand::empty(), cr(0, bit));
    }
    em.copy(flag(XER_SO), cr(0, CrBit::So));
}

/// `(mnemonic, overflow, record)` for every spelling of a base mnemonic
pub(crate) fn variants(base: &str, with_overflow: bool) -> Vec<(String, bool, bool)> {
    let mut out = vec![(base.to_string(), false, false), (format!("{}.", base), false, true)];
    if with_overflow {
        out.push((format!("{}o", base), true, false));
        out.push((format!("{}o.", base), true, true));
    }
    out
}
