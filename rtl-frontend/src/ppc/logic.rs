//! Logical operations, register moves and sign extension

use rtl_error::TranslationError;
use rtl_ir::{IrOperand, Opcode, OperandSize};
use rtl_register::ppc::GPR_SIZE;

use super::flags::{record_cr0, variants};
use super::operands::{expect_count, gpr, immediate, UIMM16};
use crate::operand::NativeInstruction;
use crate::translation::arith::{emit_binary, emit_not, emit_sign_extend};
use crate::translation::{IrEmitter, TranslatorRegistry};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LogicOp {
    And,
    Or,
    Xor,
    /// `rS & ~rB`
    AndComplement,
    /// `rS | ~rB`
    OrComplement,
    Nand,
    Nor,
    /// `~(rS ^ rB)`
    Equivalent,
}

impl LogicOp {
    fn base(self) -> Opcode {
        match self {
            LogicOp::And | LogicOp::AndComplement | LogicOp::Nand => Opcode::And,
            LogicOp::Or | LogicOp::OrComplement | LogicOp::Nor => Opcode::Or,
            LogicOp::Xor | LogicOp::Equivalent => Opcode::Xor,
        }
    }

    fn complements_source(self) -> bool {
        matches!(self, LogicOp::AndComplement | LogicOp::OrComplement)
    }

    fn complements_result(self) -> bool {
        matches!(self, LogicOp::Nand | LogicOp::Nor | LogicOp::Equivalent)
    }
}

/// `op[.] rA, rS, rB`
fn translate_logic(
    em: &mut IrEmitter<'_>,
    instr: &NativeInstruction,
    op: LogicOp,
    record: bool,
) -> Result<(), TranslationError> {
    expect_count(instr, 3)?;
    let ra = gpr(em, instr, 0)?;
    let rs = gpr(em, instr, 1)?;
    let mut rb = gpr(em, instr, 2)?;

    if op.complements_source() {
        rb = emit_not(em, &rb);
    }
    let mut result = emit_binary(em, op.base(), rs, rb);
    if op.complements_result() {
        result = emit_not(em, &result);
    }
    em.copy(result, ra.clone());

    if record {
        record_cr0(em, &ra);
    }
    Ok(())
}

/// `op rA, rS, UIMM` with the immediate optionally shifted into the high half
fn translate_logic_immediate(
    em: &mut IrEmitter<'_>,
    instr: &NativeInstruction,
    opcode: Opcode,
    shifted: bool,
    record: bool,
) -> Result<(), TranslationError> {
    expect_count(instr, 3)?;
    let ra = gpr(em, instr, 0)?;
    let rs = gpr(em, instr, 1)?;
    let value = immediate(em, instr, 2, UIMM16)? as u128;
    let value = if shifted { value << 16 } else { value };

    let result = emit_binary(em, opcode, rs, IrOperand::integer(value, GPR_SIZE));
    em.copy(result, ra.clone());
    if record {
        record_cr0(em, &ra);
    }
    Ok(())
}

/// `mr[.] rA, rS` and `not[.] rA, rS`
fn translate_move(
    em: &mut IrEmitter<'_>,
    instr: &NativeInstruction,
    complement: bool,
    record: bool,
) -> Result<(), TranslationError> {
    expect_count(instr, 2)?;
    let ra = gpr(em, instr, 0)?;
    let rs = gpr(em, instr, 1)?;

    let value = if complement { emit_not(em, &rs) } else { rs };
    em.copy(value, ra.clone());
    if record {
        record_cr0(em, &ra);
    }
    Ok(())
}

/// `extsb[.]` / `extsh[.]`
fn translate_extend(
    em: &mut IrEmitter<'_>,
    instr: &NativeInstruction,
    from: OperandSize,
    record: bool,
) -> Result<(), TranslationError> {
    expect_count(instr, 2)?;
    let ra = gpr(em, instr, 0)?;
    let rs = gpr(em, instr, 1)?;

    let low = em.temporary(from);
    em.copy(rs, low.clone());
    let extended = emit_sign_extend(em, &low, GPR_SIZE);
    em.copy(extended, ra.clone());
    if record {
        record_cr0(em, &ra);
    }
    Ok(())
}

fn translate_nop(em: &mut IrEmitter<'_>, instr: &NativeInstruction) -> Result<(), TranslationError> {
    expect_count(instr, 0)?;
    em.emit(Opcode::Nop, IrOperand::empty(), IrOperand::empty(), IrOperand::empty());
    Ok(())
}

pub(crate) fn register(registry: &mut TranslatorRegistry) {
    let ops = [
        ("and", LogicOp::And),
        ("or", LogicOp::Or),
        ("xor", LogicOp::Xor),
        ("andc", LogicOp::AndComplement),
        ("orc", LogicOp::OrComplement),
        ("nand", LogicOp::Nand),
        ("nor", LogicOp::Nor),
        ("eqv", LogicOp::Equivalent),
    ];
    for (base, op) in ops {
        for (mnemonic, _, record) in variants(base, false) {
            registry.register_fn(mnemonic, move |em: &mut IrEmitter<'_>, instr: &NativeInstruction| {
                translate_logic(em, instr, op, record)
            });
        }
    }

    let immediates = [
        ("andi.", Opcode::And, false, true),
        ("andis.", Opcode::And, true, true),
        ("ori", Opcode::Or, false, false),
        ("oris", Opcode::Or, true, false),
        ("xori", Opcode::Xor, false, false),
        ("xoris", Opcode::Xor, true, false),
    ];
    for (mnemonic, opcode, shifted, record) in immediates {
        registry.register_fn(mnemonic, move |em: &mut IrEmitter<'_>, instr: &NativeInstruction| {
            translate_logic_immediate(em, instr, opcode, shifted, record)
        });
    }

    for (base, complement) in [("mr", false), ("not", true)] {
        for (mnemonic, _, record) in variants(base, false) {
            registry.register_fn(mnemonic, move |em: &mut IrEmitter<'_>, instr: &NativeInstruction| {
                translate_move(em, instr, complement, record)
            });
        }
    }

    for (base, from) in [("extsb", OperandSize::Byte), ("extsh", OperandSize::Word)] {
        for (mnemonic, _, record) in variants(base, false) {
            registry.register_fn(mnemonic, move |em: &mut IrEmitter<'_>, instr: &NativeInstruction| {
                translate_extend(em, instr, from, record)
            });
        }
    }

    registry.register_fn("nop", translate_nop);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operand::OperandNode;
    use crate::translation::{InstructionTranslator, StandardEnvironment};
    use rtl_register::PpcPolicy;
    use std::sync::Arc;

    fn translate(mnemonic: &str, operands: Vec<OperandNode>) -> Result<Vec<rtl_ir::IrInstruction>, TranslationError> {
        let mut registry = TranslatorRegistry::new();
        register(&mut registry);
        let mut env = StandardEnvironment::with_policy(Arc::new(PpcPolicy::new()));
        let mut out = Vec::new();
        registry.translate(&mut env, &NativeInstruction::new(0x10, mnemonic, operands), &mut out)?;
        Ok(out)
    }

    #[test]
    fn test_andc_complements_rb() {
        let out = translate(
            "andc",
            vec![
                OperandNode::register("%r3"),
                OperandNode::register("%r4"),
                OperandNode::register("%r5"),
            ],
        )
        .unwrap();

        assert_eq!(out[0].opcode, Opcode::Xor);
        assert_eq!(out[0].op1.register_name(), Some("%r5"));
        assert_eq!(out[1].opcode, Opcode::And);
    }

    #[test]
    fn test_oris_shifts_immediate() {
        let out = translate(
            "oris",
            vec![
                OperandNode::register("%r3"),
                OperandNode::register("%r3"),
                OperandNode::immediate(0x1234),
            ],
        )
        .unwrap();
        assert_eq!(out[0].op2.integer_value(), Some(0x1234_0000));
    }

    #[test]
    fn test_negative_unsigned_immediate_rejected() {
        let result = translate(
            "ori",
            vec![
                OperandNode::register("%r3"),
                OperandNode::register("%r3"),
                OperandNode::immediate(-1),
            ],
        );
        assert!(matches!(result, Err(TranslationError::InvalidOperand { index: 2, .. })));
    }

    #[test]
    fn test_nop_takes_no_operands() {
        assert_eq!(translate("nop", vec![]).unwrap().len(), 1);
        assert!(translate("nop", vec![OperandNode::immediate(0)]).is_err());
    }
}
