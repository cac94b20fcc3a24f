//! Add, subtract, multiply and divide
//!
//! Every add and subtract form is one call to `emit_add_with_carry`:
//! subtraction is `~rA + rB + 1`, the `me`/`ze` forms add all-ones or zero
//! plus the incoming carry.

use rtl_error::TranslationError;
use rtl_ir::{IrOperand, Opcode, OperandSize};
use rtl_register::ppc::{GPR_SIZE, XER_CA};

use super::flags::{flag, record_cr0, undefine_cr0, variants, write_overflow};
use super::operands::{expect_count, gpr, gpr_or_zero, immediate, HIGH16, SIMM16};
use crate::operand::NativeInstruction;
use crate::translation::arith::{
    emit_abs, emit_add_with_carry, emit_binary, emit_equal, emit_is_zero, emit_negate_if,
    emit_not, emit_sign_extend, emit_flag_not, AddFlags,
};
use crate::translation::{IrEmitter, TranslatorRegistry};

/// Second addend of an add/subtract form
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Addend {
    /// `rB`, the third operand
    Register,
    /// Signed 16-bit immediate, the third operand
    Immediate,
    /// Immediate shifted left by 16
    Shifted,
    /// All ones (`me` forms)
    MinusOne,
    /// Zero (`ze` forms and `neg`)
    Zero,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CarryIn {
    None,
    One,
    Xer,
}

#[derive(Debug, Clone, Copy)]
struct AddForm {
    /// Subtract forms add `~rA`
    complement: bool,
    /// `sub`/`subc` spell `subf` with the sources swapped
    swapped: bool,
    /// `(rA|0)` addressing of `addi`/`addis`
    zero_base: bool,
    addend: Addend,
    carry_in: CarryIn,
    writes_carry: bool,
    overflow: bool,
    record: bool,
}

impl AddForm {
    fn new(addend: Addend) -> Self {
        Self {
            complement: false,
            swapped: false,
            zero_base: false,
            addend,
            carry_in: CarryIn::None,
            writes_carry: false,
            overflow: false,
            record: false,
        }
    }

    fn subtract(mut self) -> Self {
        self.complement = true;
        self
    }

    fn carry(mut self, carry_in: CarryIn, writes_carry: bool) -> Self {
        self.carry_in = carry_in;
        self.writes_carry = writes_carry;
        self
    }

    fn operand_count(&self) -> usize {
        match self.addend {
            Addend::Register | Addend::Immediate | Addend::Shifted => 3,
            Addend::MinusOne | Addend::Zero => 2,
        }
    }
}

fn translate_add(
    em: &mut IrEmitter<'_>,
    instr: &NativeInstruction,
    form: AddForm,
) -> Result<(), TranslationError> {
    expect_count(instr, form.operand_count())?;

    let rd = gpr(em, instr, 0)?;
    let (first, second) = if form.swapped { (2, 1) } else { (1, 2) };
    let ra = if form.zero_base {
        gpr_or_zero(em, instr, first)?
    } else {
        gpr(em, instr, first)?
    };
    let rhs = match form.addend {
        Addend::Register => gpr(em, instr, second)?,
        Addend::Immediate => IrOperand::signed(i128::from(immediate(em, instr, second, SIMM16)?), GPR_SIZE),
        Addend::Shifted => {
            IrOperand::signed(i128::from(immediate(em, instr, second, HIGH16)?) << 16, GPR_SIZE)
        }
        Addend::MinusOne => IrOperand::integer(GPR_SIZE.mask(), GPR_SIZE),
        Addend::Zero => IrOperand::integer(0, GPR_SIZE),
    };

    let lhs = if form.complement { emit_not(em, &ra) } else { ra };
    let carry_in = match form.carry_in {
        CarryIn::None => None,
        CarryIn::One => Some(IrOperand::integer(1, OperandSize::Byte)),
        CarryIn::Xer => Some(flag(XER_CA)),
    };

    let outputs = emit_add_with_carry(
        em,
        &lhs,
        &rhs,
        carry_in.as_ref(),
        AddFlags::new(form.writes_carry, form.overflow),
    )?;

    em.copy(outputs.result, rd.clone());
    if let Some(carry) = outputs.carry {
        em.copy(carry, flag(XER_CA));
    }
    if let Some(ov) = outputs.overflow {
        write_overflow(em, ov);
    }
    if form.record {
        record_cr0(em, &rd);
    }
    Ok(())
}

fn register_add_form(registry: &mut TranslatorRegistry, base: &str, with_overflow: bool, form: AddForm) {
    for (mnemonic, overflow, record) in variants(base, with_overflow) {
        let form = AddForm {
            overflow,
            record,
            ..form
        };
        registry.register_fn(mnemonic, move |em: &mut IrEmitter<'_>, instr: &NativeInstruction| {
            translate_add(em, instr, form)
        });
    }
}

fn register_single(registry: &mut TranslatorRegistry, mnemonic: &str, form: AddForm) {
    registry.register_fn(mnemonic, move |em: &mut IrEmitter<'_>, instr: &NativeInstruction| {
        translate_add(em, instr, form)
    });
}

/// `li rD, SIMM` and `lis rD, SIMM`
fn translate_load_immediate(
    em: &mut IrEmitter<'_>,
    instr: &NativeInstruction,
    shifted: bool,
) -> Result<(), TranslationError> {
    expect_count(instr, 2)?;
    let rd = gpr(em, instr, 0)?;
    let value = if shifted {
        i128::from(immediate(em, instr, 1, HIGH16)?) << 16
    } else {
        i128::from(immediate(em, instr, 1, SIMM16)?)
    };
    em.copy(IrOperand::signed(value, GPR_SIZE), rd);
    Ok(())
}

/// `subi rD, rA, SIMM` is `addi rD, rA, -SIMM`
fn translate_subi(em: &mut IrEmitter<'_>, instr: &NativeInstruction) -> Result<(), TranslationError> {
    expect_count(instr, 3)?;
    let rd = gpr(em, instr, 0)?;
    let ra = gpr_or_zero(em, instr, 1)?;
    let value = immediate(em, instr, 2, -0x7FFF..=0x8000)?;
    let outputs = emit_add_with_carry(
        em,
        &ra,
        &IrOperand::signed(-i128::from(value), GPR_SIZE),
        None,
        AddFlags::NONE,
    )?;
    em.copy(outputs.result, rd);
    Ok(())
}

fn sign_extended_product(em: &mut IrEmitter<'_>, a: &IrOperand, b: &IrOperand) -> IrOperand {
    let a = emit_sign_extend(em, a, OperandSize::Qword);
    let b = emit_sign_extend(em, b, OperandSize::Qword);
    emit_binary(em, Opcode::Mul, a, b)
}

/// `mullw[o][.] rD, rA, rB`: low word of the product
fn translate_mullw(
    em: &mut IrEmitter<'_>,
    instr: &NativeInstruction,
    overflow: bool,
    record: bool,
) -> Result<(), TranslationError> {
    expect_count(instr, 3)?;
    let rd = gpr(em, instr, 0)?;
    let ra = gpr(em, instr, 1)?;
    let rb = gpr(em, instr, 2)?;

    if overflow {
        // OV when the 64-bit signed product does not survive truncation
        let product = sign_extended_product(em, &ra, &rb);
        let low = em.temporary(GPR_SIZE);
        em.copy(product.clone(), low.clone());
        let back = emit_sign_extend(em, &low, OperandSize::Qword);
        let fits = emit_equal(em, &back, &product);
        let ov = emit_flag_not(em, &fits);
        em.copy(low, rd.clone());
        write_overflow(em, ov);
    } else {
        let low = emit_binary(em, Opcode::Mul, ra, rb);
        em.copy(low, rd.clone());
    }

    if record {
        record_cr0(em, &rd);
    }
    Ok(())
}

fn translate_mulli(em: &mut IrEmitter<'_>, instr: &NativeInstruction) -> Result<(), TranslationError> {
    expect_count(instr, 3)?;
    let rd = gpr(em, instr, 0)?;
    let ra = gpr(em, instr, 1)?;
    let value = immediate(em, instr, 2, SIMM16)?;
    let low = emit_binary(em, Opcode::Mul, ra, IrOperand::signed(i128::from(value), GPR_SIZE));
    em.copy(low, rd);
    Ok(())
}

/// `mulhw[.]` / `mulhwu[.]`: high word of the 64-bit product
fn translate_mulh(
    em: &mut IrEmitter<'_>,
    instr: &NativeInstruction,
    signed: bool,
    record: bool,
) -> Result<(), TranslationError> {
    expect_count(instr, 3)?;
    let rd = gpr(em, instr, 0)?;
    let ra = gpr(em, instr, 1)?;
    let rb = gpr(em, instr, 2)?;

    let product = if signed {
        sign_extended_product(em, &ra, &rb)
    } else {
        let product = em.temporary(OperandSize::Qword);
        em.emit(Opcode::Mul, ra, rb, product.clone());
        product
    };
    em.emit(
        Opcode::Bsh,
        product,
        IrOperand::signed(-32, OperandSize::Qword),
        rd.clone(),
    );

    if record {
        record_cr0(em, &rd);
    }
    Ok(())
}

/// `divw[o][.]` / `divwu[o][.]`
///
/// Division by zero, and `0x80000000 / -1` for the signed form, leave rD
/// (and the CR0 comparison bits of the record form) undefined and set OV.
fn translate_divide(
    em: &mut IrEmitter<'_>,
    instr: &NativeInstruction,
    signed: bool,
    overflow: bool,
    record: bool,
) -> Result<(), TranslationError> {
    expect_count(instr, 3)?;
    let rd = gpr(em, instr, 0)?;
    let ra = gpr(em, instr, 1)?;
    let rb = gpr(em, instr, 2)?;

    let mut invalid = emit_is_zero(em, &rb);
    if signed {
        let min = emit_equal(em, &ra, &IrOperand::integer(GPR_SIZE.sign_bit(), GPR_SIZE));
        let minus_one = emit_equal(em, &rb, &IrOperand::integer(GPR_SIZE.mask(), GPR_SIZE));
        let both = emit_binary(em, Opcode::And, min, minus_one);
        invalid = emit_binary(em, Opcode::Or, invalid, both);
    }

    let undefined = em.new_label();
    let done = em.new_label();
    em.jump_if(invalid, undefined);

    let quotient = if signed {
        let (a, a_negative) = emit_abs(em, &ra);
        let (b, b_negative) = emit_abs(em, &rb);
        let magnitude = emit_binary(em, Opcode::Div, a, b);
        let negative = emit_binary(em, Opcode::Xor, a_negative, b_negative);
        emit_negate_if(em, &magnitude, &negative)
    } else {
        emit_binary(em, Opcode::Div, ra, rb)
    };
    em.copy(quotient, rd.clone());
    if overflow {
        write_overflow(em, IrOperand::integer(0, OperandSize::Byte));
    }
    if record {
        record_cr0(em, &rd);
    }
    em.jump(done);

    em.bind(undefined);
    em.emit(Opcode::Undef, IrOperand::empty(), IrOperand::empty(), rd);
    if overflow {
        write_overflow(em, IrOperand::integer(1, OperandSize::Byte));
    }
    if record {
        undefine_cr0(em);
    }
    em.bind(done);
    Ok(())
}

pub(crate) fn register(registry: &mut TranslatorRegistry) {
    use Addend::*;

    register_add_form(registry, "add", true, AddForm::new(Register));
    register_add_form(registry, "addc", true, AddForm::new(Register).carry(CarryIn::None, true));
    register_add_form(registry, "adde", true, AddForm::new(Register).carry(CarryIn::Xer, true));
    register_add_form(registry, "addme", true, AddForm::new(MinusOne).carry(CarryIn::Xer, true));
    register_add_form(registry, "addze", true, AddForm::new(Zero).carry(CarryIn::Xer, true));

    let addi = AddForm {
        zero_base: true,
        ..AddForm::new(Immediate)
    };
    register_single(registry, "addi", addi);
    register_single(registry, "addis", AddForm { addend: Shifted, ..addi });
    let addic = AddForm::new(Immediate).carry(CarryIn::None, true);
    register_single(registry, "addic", addic);
    register_single(registry, "addic.", AddForm { record: true, ..addic });

    let subf = AddForm::new(Register).subtract().carry(CarryIn::One, false);
    register_add_form(registry, "subf", true, subf);
    register_add_form(registry, "sub", true, AddForm { swapped: true, ..subf });
    let subfc = subf.carry(CarryIn::One, true);
    register_add_form(registry, "subfc", true, subfc);
    register_add_form(registry, "subc", true, AddForm { swapped: true, ..subfc });
    register_add_form(registry, "subfe", true, subf.carry(CarryIn::Xer, true));
    register_add_form(
        registry,
        "subfme",
        true,
        AddForm::new(MinusOne).subtract().carry(CarryIn::Xer, true),
    );
    register_add_form(
        registry,
        "subfze",
        true,
        AddForm::new(Zero).subtract().carry(CarryIn::Xer, true),
    );
    register_single(
        registry,
        "subfic",
        AddForm::new(Immediate).subtract().carry(CarryIn::One, true),
    );
    register_add_form(
        registry,
        "neg",
        true,
        AddForm::new(Zero).subtract().carry(CarryIn::One, false),
    );

    registry.register_fn("li", |em: &mut IrEmitter<'_>, instr: &NativeInstruction| {
        translate_load_immediate(em, instr, false)
    });
    registry.register_fn("lis", |em: &mut IrEmitter<'_>, instr: &NativeInstruction| {
        translate_load_immediate(em, instr, true)
    });
    registry.register_fn("subi", translate_subi);

    for (mnemonic, overflow, record) in variants("mullw", true) {
        registry.register_fn(mnemonic, move |em: &mut IrEmitter<'_>, instr: &NativeInstruction| {
            translate_mullw(em, instr, overflow, record)
        });
    }
    registry.register_fn("mulli", translate_mulli);
    for (base, signed) in [("mulhw", true), ("mulhwu", false)] {
        for (mnemonic, _, record) in variants(base, false) {
            registry.register_fn(mnemonic, move |em: &mut IrEmitter<'_>, instr: &NativeInstruction| {
                translate_mulh(em, instr, signed, record)
            });
        }
    }
    for (base, signed) in [("divw", true), ("divwu", false)] {
        for (mnemonic, overflow, record) in variants(base, true) {
            registry.register_fn(mnemonic, move |em: &mut IrEmitter<'_>, instr: &NativeInstruction| {
                translate_divide(em, instr, signed, overflow, record)
            });
        }
    }
}
