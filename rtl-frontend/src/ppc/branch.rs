//! Branches and link/count register moves

use rtl_error::TranslationError;
use rtl_ir::{IrOperand, Opcode, OperandSize};
use rtl_register::ppc::{CrBit, CTR, GPR_SIZE, LR};

use super::flags::cr;
use super::operands::{expect_count, gpr, optional_cr_field, target};
use crate::operand::NativeInstruction;
use crate::translation::arith::{emit_binary, emit_flag_not, emit_is_nonzero};
use crate::translation::{IrEmitter, TranslatorRegistry};

/// Native instructions are four bytes wide
const INSTRUCTION_SIZE: u64 = 4;

fn special(name: &str) -> IrOperand {
    IrOperand::register(name, GPR_SIZE)
}

fn always() -> IrOperand {
    IrOperand::integer(1, OperandSize::Byte)
}

fn jump(em: &mut IrEmitter<'_>, condition: IrOperand, destination: IrOperand) {
    em.emit(Opcode::Jcc, condition, IrOperand::empty(), destination);
}

fn link(em: &mut IrEmitter<'_>) {
    let return_address = em.native_address().wrapping_add(INSTRUCTION_SIZE);
    em.copy(IrOperand::integer(u128::from(return_address), GPR_SIZE), special(LR));
}

/// `b target` / `bl target`
fn translate_branch(em: &mut IrEmitter<'_>, instr: &NativeInstruction, with_link: bool) -> Result<(), TranslationError> {
    expect_count(instr, 1)?;
    let destination = target(em, instr, 0)?;
    if with_link {
        link(em);
    }
    jump(em, always(), destination);
    Ok(())
}

/// `blr[l]` / `bctr[l]`
fn translate_branch_register(
    em: &mut IrEmitter<'_>,
    instr: &NativeInstruction,
    register: &str,
    with_link: bool,
) -> Result<(), TranslationError> {
    expect_count(instr, 0)?;
    let destination = if with_link {
        // target is read before LR is overwritten
        let saved = em.temporary(GPR_SIZE);
        em.copy(special(register), saved.clone());
        link(em);
        saved
    } else {
        special(register)
    };
    jump(em, always(), destination);
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Condition {
    Equal,
    NotEqual,
    Less,
    GreaterOrEqual,
    Greater,
    LessOrEqual,
}

impl Condition {
    /// The tested bit and whether the branch is taken when it is clear
    fn bit(self) -> (CrBit, bool) {
        match self {
            Condition::Equal => (CrBit::Eq, false),
            Condition::NotEqual => (CrBit::Eq, true),
            Condition::Less => (CrBit::Lt, false),
            Condition::GreaterOrEqual => (CrBit::Lt, true),
            Condition::Greater => (CrBit::Gt, false),
            Condition::LessOrEqual => (CrBit::Gt, true),
        }
    }
}

/// `bcc [crN,] target`
fn translate_conditional(
    em: &mut IrEmitter<'_>,
    instr: &NativeInstruction,
    condition: Condition,
) -> Result<(), TranslationError> {
    let (field, first) = optional_cr_field(instr);
    if instr.operands.len() != first + 1 {
        return Err(TranslationError::OperandCount {
            mnemonic: instr.mnemonic.clone(),
            expected: "1 or 2".to_string(),
            found: instr.operands.len(),
        });
    }
    let destination = target(em, instr, first)?;

    let (bit, negated) = condition.bit();
    let tested = cr(field, bit);
    let taken = if negated { emit_flag_not(em, &tested) } else { tested };
    jump(em, taken, destination);
    Ok(())
}

/// `bdnz target`: decrement CTR, branch while it is nonzero
fn translate_bdnz(em: &mut IrEmitter<'_>, instr: &NativeInstruction) -> Result<(), TranslationError> {
    expect_count(instr, 1)?;
    let destination = target(em, instr, 0)?;

    let count = emit_binary(em, Opcode::Sub, special(CTR), IrOperand::integer(1, GPR_SIZE));
    em.copy(count.clone(), special(CTR));
    let taken = emit_is_nonzero(em, &count);
    jump(em, taken, destination);
    Ok(())
}

/// `mtlr`/`mtctr` when `to_special`, else `mflr`/`mfctr`
fn translate_move_special(
    em: &mut IrEmitter<'_>,
    instr: &NativeInstruction,
    register: &str,
    to_special: bool,
) -> Result<(), TranslationError> {
    expect_count(instr, 1)?;
    let gpr = gpr(em, instr, 0)?;
    if to_special {
        em.copy(gpr, special(register));
    } else {
        em.copy(special(register), gpr);
    }
    Ok(())
}

pub(crate) fn register(registry: &mut TranslatorRegistry) {
    for (mnemonic, with_link) in [("b", false), ("bl", true)] {
        registry.register_fn(mnemonic, move |em: &mut IrEmitter<'_>, instr: &NativeInstruction| {
            translate_branch(em, instr, with_link)
        });
    }

    let indirect = [
        ("blr", LR, false),
        ("blrl", LR, true),
        ("bctr", CTR, false),
        ("bctrl", CTR, true),
    ];
    for (mnemonic, register, with_link) in indirect {
        registry.register_fn(mnemonic, move |em: &mut IrEmitter<'_>, instr: &NativeInstruction| {
            translate_branch_register(em, instr, register, with_link)
        });
    }

    let conditional = [
        ("beq", Condition::Equal),
        ("bne", Condition::NotEqual),
        ("blt", Condition::Less),
        ("bge", Condition::GreaterOrEqual),
        ("bgt", Condition::Greater),
        ("ble", Condition::LessOrEqual),
    ];
    for (mnemonic, condition) in conditional {
        registry.register_fn(mnemonic, move |em: &mut IrEmitter<'_>, instr: &NativeInstruction| {
            translate_conditional(em, instr, condition)
        });
    }

    registry.register_fn("bdnz", translate_bdnz);

    let moves = [
        ("mtlr", LR, true),
        ("mflr", LR, false),
        ("mtctr", CTR, true),
        ("mfctr", CTR, false),
    ];
    for (mnemonic, register, to_special) in moves {
        registry.register_fn(mnemonic, move |em: &mut IrEmitter<'_>, instr: &NativeInstruction| {
            translate_move_special(em, instr, register, to_special)
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operand::OperandNode;
    use crate::translation::{InstructionTranslator, StandardEnvironment};
    use rtl_ir::IrInstruction;
    use rtl_register::PpcPolicy;
    use std::sync::Arc;

    fn translate(mnemonic: &str, operands: Vec<OperandNode>) -> Result<Vec<IrInstruction>, TranslationError> {
        let mut registry = TranslatorRegistry::new();
        register(&mut registry);
        let mut env = StandardEnvironment::with_policy(Arc::new(PpcPolicy::new()));
        let mut out = Vec::new();
        registry.translate(&mut env, &NativeInstruction::new(0x1000, mnemonic, operands), &mut out)?;
        Ok(out)
    }

    #[test]
    fn test_bl_links_next_instruction() {
        let out = translate("bl", vec![OperandNode::immediate(0x2000)]).unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].op1.integer_value(), Some(0x1004));
        assert_eq!(out[0].op3.register_name(), Some("LR"));
        assert_eq!(out[1].opcode, Opcode::Jcc);
        assert_eq!(out[1].op3.integer_value(), Some(0x2000));
    }

    #[test]
    fn test_blrl_jumps_to_old_link() {
        let out = translate("blrl", vec![]).unwrap();
        let jump = out.last().unwrap();
        assert_eq!(jump.op3.register_name(), out[0].op3.register_name());
        assert_ne!(jump.op3.register_name(), Some("LR"));
    }

    #[test]
    fn test_bne_on_explicit_field() {
        let out = translate(
            "bne",
            vec![OperandNode::register("%cr1"), OperandNode::immediate(0x1100)],
        )
        .unwrap();
        assert_eq!(out[0].op1.register_name(), Some("CR1EQ"));
        assert_eq!(out[0].opcode, Opcode::Xor);

        let beq = translate("beq", vec![OperandNode::immediate(0x1100)]).unwrap();
        assert_eq!(beq.len(), 1);
        assert_eq!(beq[0].op1.register_name(), Some("CR0EQ"));
    }

    #[test]
    fn test_negative_target_rejected() {
        assert!(translate("b", vec![OperandNode::immediate(-4)]).is_err());
    }
}
