//! Loads and stores with `(rA|0)` addressing

use rtl_error::TranslationError;
use rtl_ir::{IrOperand, Opcode, OperandSize};
use rtl_register::ppc::GPR_SIZE;

use super::operands::{displacement, expect_count, gpr, gpr_or_zero};
use crate::operand::NativeInstruction;
use crate::translation::arith::{emit_binary, emit_sign_extend};
use crate::translation::{IrEmitter, TranslatorRegistry};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Addressing {
    /// `d(rA)`
    Displacement,
    /// `d(rA)`, EA written back to `rA`
    Update,
    /// `rA, rB`
    Indexed,
}

#[derive(Debug, Clone, Copy)]
struct Access {
    size: OperandSize,
    signed: bool,
    addressing: Addressing,
}

impl Access {
    fn new(size: OperandSize, addressing: Addressing) -> Self {
        Self {
            size,
            signed: false,
            addressing,
        }
    }

    fn operand_count(self) -> usize {
        match self.addressing {
            Addressing::Indexed => 3,
            _ => 2,
        }
    }
}

/// Effective address into a word temporary, plus the base register for update forms
fn effective_address(
    em: &mut IrEmitter<'_>,
    instr: &NativeInstruction,
    addressing: Addressing,
) -> Result<(IrOperand, IrOperand), TranslationError> {
    let (base, offset) = match addressing {
        Addressing::Indexed => (gpr_or_zero(em, instr, 1)?, gpr(em, instr, 2)?),
        _ => {
            let (base, disp) = displacement(em, instr, 1)?;
            (base, IrOperand::signed(i128::from(disp), GPR_SIZE))
        }
    };
    let ea = emit_binary(em, Opcode::Add, base.clone(), offset);
    Ok((ea, base))
}

/// Update forms may not use `%r0` as the base
fn check_update_base(instr: &NativeInstruction, base: &IrOperand) -> Result<(), TranslationError> {
    if base.register_name().is_none() {
        return Err(TranslationError::invalid_operand(
            &instr.mnemonic,
            1,
            "update form needs a base register other than %r0",
        ));
    }
    Ok(())
}

fn translate_load(
    em: &mut IrEmitter<'_>,
    instr: &NativeInstruction,
    access: Access,
) -> Result<(), TranslationError> {
    expect_count(instr, access.operand_count())?;
    let rd = gpr(em, instr, 0)?;
    let (ea, base) = effective_address(em, instr, access.addressing)?;

    if access.addressing == Addressing::Update {
        check_update_base(instr, &base)?;
        if base.register_name() == rd.register_name() {
            return Err(TranslationError::invalid_operand(
                &instr.mnemonic,
                1,
                "update load with rA equal to rD",
            ));
        }
    }

    let loaded = em.temporary(access.size);
    em.emit(Opcode::Ldm, ea.clone(), IrOperand::empty(), loaded.clone());
    let value = if access.signed && access.size < GPR_SIZE {
        emit_sign_extend(em, &loaded, GPR_SIZE)
    } else {
        loaded
    };
    em.copy(value, rd);

    if access.addressing == Addressing::Update {
        em.copy(ea, base);
    }
    Ok(())
}

fn translate_store(
    em: &mut IrEmitter<'_>,
    instr: &NativeInstruction,
    access: Access,
) -> Result<(), TranslationError> {
    expect_count(instr, access.operand_count())?;
    let rs = gpr(em, instr, 0)?;
    let (ea, base) = effective_address(em, instr, access.addressing)?;
    if access.addressing == Addressing::Update {
        check_update_base(instr, &base)?;
    }

    let value = if access.size < GPR_SIZE {
        let narrow = em.temporary(access.size);
        em.copy(rs, narrow.clone());
        narrow
    } else {
        rs
    };
    em.emit(Opcode::Stm, value, IrOperand::empty(), ea.clone());

    if access.addressing == Addressing::Update {
        em.copy(ea, base);
    }
    Ok(())
}

pub(crate) fn register(registry: &mut TranslatorRegistry) {
    use Addressing::*;
    use OperandSize::{Byte, Dword, Word};

    let loads = [
        ("lbz", Access::new(Byte, Displacement)),
        ("lhz", Access::new(Word, Displacement)),
        (
            "lha",
            Access {
                signed: true,
                ..Access::new(Word, Displacement)
            },
        ),
        ("lwz", Access::new(Dword, Displacement)),
        ("lwzu", Access::new(Dword, Update)),
        ("lwzx", Access::new(Dword, Indexed)),
    ];
    for (mnemonic, access) in loads {
        registry.register_fn(mnemonic, move |em: &mut IrEmitter<'_>, instr: &NativeInstruction| {
            translate_load(em, instr, access)
        });
    }

    let stores = [
        ("stb", Access::new(Byte, Displacement)),
        ("sth", Access::new(Word, Displacement)),
        ("stw", Access::new(Dword, Displacement)),
        ("stwu", Access::new(Dword, Update)),
        ("stwx", Access::new(Dword, Indexed)),
    ];
    for (mnemonic, access) in stores {
        registry.register_fn(mnemonic, move |em: &mut IrEmitter<'_>, instr: &NativeInstruction| {
            translate_store(em, instr, access)
        });
    }
}
