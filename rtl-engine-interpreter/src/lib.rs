//! Concrete interpreter for RTL IR programs
//!
//! Executes a [`Program`] instruction by instruction against a register file
//! and a sparse memory. Arithmetic is unsigned and modular in the width of
//! the destination operand; signed behaviour (overflow, arithmetic shifts,
//! sign extension) is spelled out by the lifted IR, never implied here.

mod hooks;
mod memory;
mod registers;

use std::collections::BTreeSet;
use std::sync::Arc;

use rtl_common::{InterpreterConfig, UndefinedReadMode, UnknownOpcodeMode};
use rtl_error::InterpreterError;
use rtl_ir::{
    is_temporary_register, IrAddress, IrInstruction, IrOperand, Opcode, OperandKind,
    OperandSize, Program, RegisterStatus, RegisterValue,
};
use rtl_register::CpuPolicy;

pub use hooks::{EmptyInterpreterPolicy, InterpreterPolicy};
pub use memory::SparseMemory;
pub use registers::RegisterFile;

/// Counters of the last `interpret` call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecStats {
    pub executed: u64,
    pub jumps_taken: u64,
    pub memory_reads: u64,
    pub memory_writes: u64,
}

/// Where control goes after one instruction
enum Flow {
    Next,
    Jump(IrAddress),
    Halt,
}

pub struct Interpreter {
    config: InterpreterConfig,
    policy: Arc<dyn CpuPolicy>,
    hooks: Box<dyn InterpreterPolicy + Send>,
    registers: RegisterFile,
    memory: SparseMemory,
    stats: ExecStats,
}

impl Interpreter {
    pub fn new(
        config: InterpreterConfig,
        policy: Arc<dyn CpuPolicy>,
        hooks: Box<dyn InterpreterPolicy + Send>,
    ) -> Self {
        let memory = SparseMemory::new(config.endianness);
        Self {
            config,
            policy,
            hooks,
            registers: RegisterFile::new(),
            memory,
            stats: ExecStats::default(),
        }
    }

    /// Default configuration, no hooks
    pub fn with_policy(policy: Arc<dyn CpuPolicy>) -> Self {
        Self::new(
            InterpreterConfig::default(),
            policy,
            Box::new(EmptyInterpreterPolicy),
        )
    }

    pub fn config(&self) -> &InterpreterConfig {
        &self.config
    }

    pub fn policy(&self) -> &Arc<dyn CpuPolicy> {
        &self.policy
    }

    pub fn stats(&self) -> &ExecStats {
        &self.stats
    }

    /// Seed a register before interpretation
    pub fn set_register(&mut self, name: &str, value: u128, size: OperandSize, status: RegisterStatus) {
        self.registers
            .set(self.policy.catalog(), name, value, size, status);
    }

    pub fn register(&self, name: &str) -> Option<RegisterValue> {
        self.registers.get(self.policy.catalog(), name)
    }

    /// Magnitude of a defined register
    pub fn register_value(&self, name: &str) -> Option<u128> {
        self.register(name)
            .filter(RegisterValue::is_defined)
            .map(|value| value.value())
    }

    pub fn defined_registers(&self) -> BTreeSet<String> {
        self.registers
            .iter()
            .filter(|(_, value)| value.is_defined())
            .map(|(name, _)| name.to_string())
            .collect()
    }

    /// Defined registers without translator temporaries
    pub fn defined_native_registers(&self) -> BTreeSet<String> {
        self.defined_registers()
            .into_iter()
            .filter(|name| !is_temporary_register(name))
            .collect()
    }

    pub fn memory(&self) -> &SparseMemory {
        &self.memory
    }

    pub fn memory_size(&self) -> usize {
        self.memory.size()
    }

    pub fn read_memory(&mut self, address: u64, size: OperandSize) -> u128 {
        self.memory.read(address, size)
    }

    pub fn write_memory(&mut self, address: u64, value: u128, size: OperandSize) {
        self.memory.write(address, value, size);
    }

    /// Drop all registers, memory and counters
    pub fn reset(&mut self) {
        self.registers.clear();
        self.memory = SparseMemory::new(self.config.endianness);
        self.stats = ExecStats::default();
    }

    /// Run `program` from the first IR instruction of native address `start`
    pub fn interpret(&mut self, program: &Program, start: u64) -> Result<(), InterpreterError> {
        self.interpret_from(program, IrAddress::from_native(start))
    }

    pub fn interpret_from(
        &mut self,
        program: &Program,
        entry: IrAddress,
    ) -> Result<(), InterpreterError> {
        self.stats = ExecStats::default();
        log::debug!(
            "{}: interpreting {} IR instructions from {}",
            self.policy.name(),
            program.len(),
            entry
        );

        self.hooks.start(entry);
        let result = self.run(program, entry);
        self.hooks.end(&self.stats);

        match &result {
            Ok(()) => log::debug!("interpretation finished after {} steps", self.stats.executed),
            Err(e) => log::debug!("interpretation aborted after {} steps: {}", self.stats.executed, e),
        }
        result
    }

    fn run(&mut self, program: &Program, entry: IrAddress) -> Result<(), InterpreterError> {
        let mut pc = entry;

        while let Some(instruction) = program.get(pc) {
            if let Some(limit) = self.config.step_limit {
                if self.stats.executed >= limit {
                    return Err(InterpreterError::StepLimitExceeded { limit });
                }
            }

            self.hooks.next_instruction(instruction)?;
            self.write_program_counter(pc.native);
            log::trace!("{}", instruction);

            let flow = self.execute(instruction, program)?;
            self.stats.executed += 1;

            pc = match flow {
                Flow::Next => match program.next_address(pc) {
                    Some(next) => next,
                    None => break,
                },
                Flow::Jump(target) => {
                    self.stats.jumps_taken += 1;
                    target
                }
                Flow::Halt => break,
            };
        }

        Ok(())
    }

    fn write_program_counter(&mut self, native: u64) {
        let size = self.policy.program_counter_size();
        self.registers.set(
            self.policy.catalog(),
            self.policy.program_counter(),
            u128::from(native),
            size,
            RegisterStatus::Defined,
        );
    }

    fn execute(
        &mut self,
        instruction: &IrInstruction,
        program: &Program,
    ) -> Result<Flow, InterpreterError> {
        let at = instruction.address;

        match instruction.opcode {
            Opcode::Add | Opcode::Sub | Opcode::Mul => {
                check_destination_width(instruction)?;
                let a = self.read_operand(&instruction.op1, at)?;
                let b = self.read_operand(&instruction.op2, at)?;
                let result = match instruction.opcode {
                    Opcode::Add => a.wrapping_add(b),
                    Opcode::Sub => a.wrapping_sub(b),
                    _ => a.wrapping_mul(b),
                };
                self.write_destination(instruction, result)?;
            }
            Opcode::Div | Opcode::Mod => {
                let a = self.read_operand(&instruction.op1, at)?;
                let b = self.read_operand(&instruction.op2, at)?;
                if b == 0 {
                    return Err(InterpreterError::DivisionByZero {
                        address: at.to_string(),
                    });
                }
                let result = if instruction.opcode == Opcode::Div {
                    a / b
                } else {
                    a % b
                };
                self.write_destination(instruction, result)?;
            }
            Opcode::Bsh => {
                let value = self.read_operand(&instruction.op1, at)?;
                let amount = self.read_operand(&instruction.op2, at)?;
                let amount = instruction.op2.size.to_signed(amount);
                let result = shift(value, amount);
                self.write_destination(instruction, result)?;
            }
            Opcode::And | Opcode::Or | Opcode::Xor => {
                if instruction.op1.size != instruction.op2.size {
                    return Err(width_mismatch(
                        instruction,
                        format!(
                            "{} sources have different sizes ({} and {})",
                            instruction.opcode, instruction.op1.size, instruction.op2.size
                        ),
                    ));
                }
                let a = self.read_operand(&instruction.op1, at)?;
                let b = self.read_operand(&instruction.op2, at)?;
                let result = match instruction.opcode {
                    Opcode::And => a & b,
                    Opcode::Or => a | b,
                    _ => a ^ b,
                };
                self.write_destination(instruction, result)?;
            }
            Opcode::Bisz => {
                let value = self.read_operand(&instruction.op1, at)?;
                self.write_destination(instruction, u128::from(value == 0))?;
            }
            Opcode::Jcc => {
                let condition = self.read_operand(&instruction.op1, at)?;
                if condition != 0 {
                    let target = self.jump_target(&instruction.op3, at)?;
                    if !program.contains(target) {
                        return Err(InterpreterError::UnmappedTarget {
                            address: at.to_string(),
                            target: target.to_string(),
                        });
                    }
                    return Ok(Flow::Jump(target));
                }
            }
            Opcode::Ldm => {
                let address = self.read_operand(&instruction.op1, at)? as u64;
                let value = self.memory.read(address, instruction.op3.size);
                self.stats.memory_reads += 1;
                self.write_destination(instruction, value)?;
            }
            Opcode::Stm => {
                let value = self.read_operand(&instruction.op1, at)?;
                let address = self.read_operand(&instruction.op3, at)? as u64;
                self.memory.write(address, value, instruction.op1.size);
                self.stats.memory_writes += 1;
            }
            Opcode::Str => {
                let value = self.read_operand(&instruction.op1, at)?;
                self.write_destination(instruction, value)?;
            }
            Opcode::Nop => {}
            Opcode::Undef => {
                let name = destination_register(instruction)?;
                self.registers
                    .undefine(self.policy.catalog(), name, instruction.op3.size);
            }
            Opcode::Unkn => match self.config.unknown_opcodes {
                UnknownOpcodeMode::Fail => {
                    return Err(InterpreterError::UnsupportedOpcode {
                        opcode: instruction.opcode.to_string(),
                        address: at.to_string(),
                    });
                }
                UnknownOpcodeMode::Skip => {
                    log::warn!("skipping instruction with unknown semantics at {}", at);
                }
            },
            Opcode::Halt => return Ok(Flow::Halt),
        }

        Ok(Flow::Next)
    }

    /// Value of a source operand, reduced to the operand's size
    fn read_operand(&self, operand: &IrOperand, at: IrAddress) -> Result<u128, InterpreterError> {
        match &operand.kind {
            OperandKind::Integer(value) => Ok(operand.size.truncate(*value)),
            OperandKind::Register(name) => {
                match self.registers.get(self.policy.catalog(), name) {
                    Some(value) if value.is_defined() => Ok(operand.size.truncate(value.value())),
                    _ => match self.config.undefined_reads {
                        UndefinedReadMode::Fail => Err(InterpreterError::UndefinedRegisterRead {
                            register: name.clone(),
                            address: at.to_string(),
                        }),
                        UndefinedReadMode::Zero => Ok(0),
                    },
                }
            }
            OperandKind::Empty => Err(InterpreterError::InvalidOperand {
                address: at.to_string(),
                reason: "missing source operand".to_string(),
            }),
            OperandKind::SubAddress(target) => Err(InterpreterError::InvalidOperand {
                address: at.to_string(),
                reason: format!("sub-address {} used as a value", target),
            }),
        }
    }

    fn jump_target(&self, operand: &IrOperand, at: IrAddress) -> Result<IrAddress, InterpreterError> {
        match &operand.kind {
            OperandKind::SubAddress(target) => Ok(*target),
            OperandKind::Integer(_) | OperandKind::Register(_) => {
                let native = self.read_operand(operand, at)?;
                Ok(IrAddress::from_native(native as u64))
            }
            OperandKind::Empty => Err(InterpreterError::InvalidOperand {
                address: at.to_string(),
                reason: "jump without target".to_string(),
            }),
        }
    }

    fn write_destination(
        &mut self,
        instruction: &IrInstruction,
        value: u128,
    ) -> Result<(), InterpreterError> {
        let name = destination_register(instruction)?;
        self.registers.set(
            self.policy.catalog(),
            name,
            value,
            instruction.op3.size,
            RegisterStatus::Defined,
        );
        Ok(())
    }
}

fn destination_register(instruction: &IrInstruction) -> Result<&str, InterpreterError> {
    instruction
        .op3
        .register_name()
        .ok_or_else(|| InterpreterError::InvalidOperand {
            address: instruction.address.to_string(),
            reason: format!("{} needs a register destination", instruction.opcode),
        })
}

fn check_destination_width(instruction: &IrInstruction) -> Result<(), InterpreterError> {
    let widest = instruction.op1.size.max(instruction.op2.size);
    if instruction.op3.size < widest {
        return Err(width_mismatch(
            instruction,
            format!(
                "{} destination {} is narrower than source {}",
                instruction.opcode, instruction.op3.size, widest
            ),
        ));
    }
    Ok(())
}

fn width_mismatch(instruction: &IrInstruction, detail: String) -> InterpreterError {
    InterpreterError::WidthMismatch {
        address: instruction.address.to_string(),
        detail,
    }
}

/// Positive amounts shift left, negative amounts shift logically right
fn shift(value: u128, amount: i128) -> u128 {
    let distance = amount.unsigned_abs();
    if distance >= 128 {
        return 0;
    }
    if amount >= 0 {
        value << distance
    } else {
        value >> distance
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rtl_common::Endianness;
    use rtl_ir::IrBuilder;
    use rtl_register::PpcPolicy;

    const B: OperandSize = OperandSize::Byte;
    const W: OperandSize = OperandSize::Word;
    const D: OperandSize = OperandSize::Dword;
    const Q: OperandSize = OperandSize::Qword;

    fn reg(name: &str, size: OperandSize) -> IrOperand {
        IrOperand::register(name, size)
    }

    fn imm(value: u128, size: OperandSize) -> IrOperand {
        IrOperand::integer(value, size)
    }

    fn none() -> IrOperand {
        IrOperand::empty()
    }

    fn interpreter() -> Interpreter {
        Interpreter::with_policy(Arc::new(PpcPolicy::new()))
    }

    fn interpreter_with(config: InterpreterConfig) -> Interpreter {
        Interpreter::new(
            config,
            Arc::new(PpcPolicy::new()),
            Box::new(EmptyInterpreterPolicy),
        )
    }

    #[test]
    fn test_add_wraps_to_destination() {
        let mut builder = IrBuilder::new(0x100);
        builder
            .push(Opcode::Add, imm(0xFFFF_FFFF, D), imm(2, D), reg("t0", Q))
            .push(Opcode::Add, imm(0xFFFF_FFFF, D), imm(2, D), reg("t1", D));
        let program = builder.build_program().unwrap();

        let mut interp = interpreter();
        interp.interpret(&program, 0x100).unwrap();

        assert_eq!(interp.register_value("t0"), Some(0x1_0000_0001));
        assert_eq!(interp.register_value("t1"), Some(1));
        assert_eq!(interp.stats().executed, 2);
    }

    #[test]
    fn test_sub_borrows_into_wide_destination() {
        let mut builder = IrBuilder::new(0);
        builder.push(Opcode::Sub, imm(1, D), imm(2, D), reg("t0", Q));
        let program = builder.build_program().unwrap();

        let mut interp = interpreter();
        interp.interpret(&program, 0).unwrap();
        assert_eq!(interp.register_value("t0"), Some(0xFFFF_FFFF_FFFF_FFFF));
    }

    #[test]
    fn test_narrow_arithmetic_destination_rejected() {
        let mut builder = IrBuilder::new(0);
        builder
            .push(Opcode::Str, imm(5, B), none(), reg("t0", B))
            .push(Opcode::Add, imm(1, Q), imm(2, D), reg("t1", D));
        let program = builder.build_program().unwrap();

        let mut interp = interpreter();
        let result = interp.interpret(&program, 0);

        assert!(matches!(result, Err(InterpreterError::WidthMismatch { .. })));
        // state before the failing instruction survives
        assert_eq!(interp.register_value("t0"), Some(5));
        assert!(interp.register("t1").is_none());
    }

    #[test]
    fn test_bitwise_sources_must_match() {
        let mut builder = IrBuilder::new(0);
        builder.push(Opcode::And, imm(0xFF, D), imm(0x0F, B), reg("t0", D));
        let program = builder.build_program().unwrap();

        let result = interpreter().interpret(&program, 0);
        assert!(matches!(result, Err(InterpreterError::WidthMismatch { .. })));
    }

    #[test]
    fn test_bsh_direction_follows_sign() {
        let mut builder = IrBuilder::new(0);
        builder
            .push(Opcode::Bsh, imm(0x8000_0001, D), imm(4, D), reg("t0", Q))
            .push(Opcode::Bsh, imm(0x8000_0001, D), IrOperand::signed(-31, D), reg("t1", D))
            .push(Opcode::Bsh, imm(0x8000_0001, D), imm(4, D), reg("t2", D))
            .push(Opcode::Bsh, imm(1, D), imm(200, Q), reg("t3", D));
        let program = builder.build_program().unwrap();

        let mut interp = interpreter();
        interp.interpret(&program, 0).unwrap();

        assert_eq!(interp.register_value("t0"), Some(0x8_0000_0010));
        assert_eq!(interp.register_value("t1"), Some(1));
        assert_eq!(interp.register_value("t2"), Some(0x10));
        assert_eq!(interp.register_value("t3"), Some(0));
    }

    #[test]
    fn test_bisz() {
        let mut builder = IrBuilder::new(0);
        builder
            .push(Opcode::Bisz, imm(0, D), none(), reg("t0", B))
            .push(Opcode::Bisz, imm(7, D), none(), reg("t1", B));
        let program = builder.build_program().unwrap();

        let mut interp = interpreter();
        interp.interpret(&program, 0).unwrap();
        assert_eq!(interp.register_value("t0"), Some(1));
        assert_eq!(interp.register_value("t1"), Some(0));
    }

    #[test]
    fn test_division() {
        let mut builder = IrBuilder::new(0);
        builder
            .push(Opcode::Div, imm(17, D), imm(5, D), reg("t0", D))
            .push(Opcode::Mod, imm(17, D), imm(5, D), reg("t1", D))
            .push(Opcode::Div, imm(1, D), imm(0, D), reg("t2", D));
        let program = builder.build_program().unwrap();

        let mut interp = interpreter();
        let result = interp.interpret(&program, 0);

        assert_eq!(interp.register_value("t0"), Some(3));
        assert_eq!(interp.register_value("t1"), Some(2));
        assert!(matches!(result, Err(InterpreterError::DivisionByZero { .. })));
    }

    #[test]
    fn test_counting_loop_with_sub_address_jump() {
        let loop_head = IrAddress::new(0x100, 1);
        let mut builder = IrBuilder::new(0x100);
        builder
            .push(Opcode::Str, imm(3, D), none(), reg("%r3", D))
            .push(Opcode::Sub, reg("%r3", D), imm(1, D), reg("%r3", D))
            .push(Opcode::Bisz, reg("%r3", D), none(), reg("t0", B))
            .push(Opcode::Xor, reg("t0", B), imm(1, B), reg("t1", B))
            .push(Opcode::Jcc, reg("t1", B), none(), IrOperand::sub_address(loop_head));
        let program = builder.build_program().unwrap();

        let mut interp = interpreter();
        interp.interpret(&program, 0x100).unwrap();

        assert_eq!(interp.register_value("%r3"), Some(0));
        assert_eq!(interp.stats().jumps_taken, 2);
        assert_eq!(interp.stats().executed, 1 + 3 * 4);
    }

    #[test]
    fn test_native_jump_and_unmapped_target() {
        let mut builder = IrBuilder::new(0x100);
        builder.push(Opcode::Jcc, imm(1, B), none(), imm(0x108, D));
        builder.at(0x104).push(Opcode::Str, imm(1, D), none(), reg("%r4", D));
        builder.at(0x108).push(Opcode::Str, imm(2, D), none(), reg("%r5", D));
        let program = builder.build_program().unwrap();

        let mut interp = interpreter();
        interp.interpret(&program, 0x100).unwrap();
        assert!(interp.register("%r4").is_none());
        assert_eq!(interp.register_value("%r5"), Some(2));

        let mut builder = IrBuilder::new(0x100);
        builder.push(Opcode::Jcc, imm(1, B), none(), imm(0x200, D));
        let program = builder.build_program().unwrap();
        let result = interpreter().interpret(&program, 0x100);
        assert!(matches!(result, Err(InterpreterError::UnmappedTarget { .. })));
    }

    #[test]
    fn test_untaken_jump_falls_through() {
        let mut builder = IrBuilder::new(0);
        builder
            .push(Opcode::Jcc, imm(0, B), none(), imm(0x999, D))
            .push(Opcode::Str, imm(9, D), none(), reg("t0", D));
        let program = builder.build_program().unwrap();

        let mut interp = interpreter();
        interp.interpret(&program, 0).unwrap();
        assert_eq!(interp.register_value("t0"), Some(9));
        assert_eq!(interp.stats().jumps_taken, 0);
    }

    #[test]
    fn test_undefined_read_modes() {
        let mut builder = IrBuilder::new(0);
        builder.push(Opcode::Add, reg("%r9", D), imm(1, D), reg("t0", D));
        let program = builder.build_program().unwrap();

        let result = interpreter().interpret(&program, 0);
        assert!(matches!(
            result,
            Err(InterpreterError::UndefinedRegisterRead { ref register, .. }) if register == "%r9"
        ));

        let mut interp =
            interpreter_with(InterpreterConfig::default().with_undefined_reads(UndefinedReadMode::Zero));
        interp.interpret(&program, 0).unwrap();
        assert_eq!(interp.register_value("t0"), Some(1));
    }

    #[test]
    fn test_undef_then_read_fails() {
        let mut builder = IrBuilder::new(0);
        builder
            .push(Opcode::Undef, none(), none(), reg("%r3", D))
            .push(Opcode::Str, reg("%r3", D), none(), reg("t0", D));
        let program = builder.build_program().unwrap();

        let mut interp = interpreter();
        interp.set_register("%r3", 7, D, RegisterStatus::Defined);
        let result = interp.interpret(&program, 0);

        assert!(matches!(result, Err(InterpreterError::UndefinedRegisterRead { .. })));
        let stale = interp.register("%r3").unwrap();
        assert!(!stale.is_defined());
        assert_eq!(stale.value(), 7);
    }

    #[test]
    fn test_unknown_opcode_modes() {
        let mut builder = IrBuilder::new(0);
        builder
            .push(Opcode::Unkn, none(), none(), none())
            .push(Opcode::Str, imm(1, B), none(), reg("t0", B));
        let program = builder.build_program().unwrap();

        let result = interpreter().interpret(&program, 0);
        assert!(matches!(result, Err(InterpreterError::UnsupportedOpcode { .. })));

        let mut interp =
            interpreter_with(InterpreterConfig::default().with_unknown_opcodes(UnknownOpcodeMode::Skip));
        interp.interpret(&program, 0).unwrap();
        assert_eq!(interp.register_value("t0"), Some(1));
    }

    #[test]
    fn test_memory_round_trip_big_endian() {
        let mut builder = IrBuilder::new(0);
        builder
            .push(Opcode::Stm, imm(0xDEAD_BEEF, D), none(), imm(0x2000, D))
            .push(Opcode::Ldm, imm(0x2000, D), none(), reg("t0", W))
            .push(Opcode::Ldm, imm(0x2000, D), none(), reg("t1", D));
        let program = builder.build_program().unwrap();

        let mut interp = interpreter();
        interp.interpret(&program, 0).unwrap();

        assert_eq!(interp.register_value("t0"), Some(0xDEAD));
        assert_eq!(interp.register_value("t1"), Some(0xDEAD_BEEF));
        assert_eq!(interp.memory_size(), 4);
        assert_eq!(interp.stats().memory_reads, 2);
        assert_eq!(interp.stats().memory_writes, 1);
    }

    #[test]
    fn test_memory_little_endian() {
        let mut interp = interpreter_with(InterpreterConfig::new(Endianness::LittleEndian));
        interp.write_memory(0x10, 0x0102, W);

        let mut builder = IrBuilder::new(0);
        builder.push(Opcode::Ldm, imm(0x10, D), none(), reg("t0", B));
        let program = builder.build_program().unwrap();
        interp.interpret(&program, 0).unwrap();

        assert_eq!(interp.register_value("t0"), Some(0x02));
    }

    #[test]
    fn test_reset_clears_state_and_keeps_endianness() {
        let mut interp = interpreter_with(InterpreterConfig::new(Endianness::LittleEndian));
        let mut builder = IrBuilder::new(0x100);
        builder
            .push(Opcode::Str, imm(7, D), none(), reg("%r3", D))
            .push(Opcode::Stm, imm(0x0102, W), none(), imm(0x10, D));
        let program = builder.build_program().unwrap();
        interp.interpret(&program, 0x100).unwrap();
        assert_eq!(interp.memory_size(), 2);

        interp.reset();

        assert!(interp.defined_registers().is_empty());
        assert_eq!(interp.memory_size(), 0);
        assert_eq!(*interp.stats(), ExecStats::default());
        assert_eq!(interp.memory().endianness(), Endianness::LittleEndian);

        interp.write_memory(0x10, 0x0102, W);
        assert_eq!(interp.read_memory(0x10, B), 0x02);
    }

    #[test]
    fn test_halt_and_step_limit() {
        let mut builder = IrBuilder::new(0);
        builder
            .push(Opcode::Halt, none(), none(), none())
            .push(Opcode::Str, imm(1, B), none(), reg("t0", B));
        let program = builder.build_program().unwrap();

        let mut interp = interpreter();
        interp.interpret(&program, 0).unwrap();
        assert!(interp.register("t0").is_none());
        assert_eq!(interp.stats().executed, 1);

        let mut builder = IrBuilder::new(0);
        builder.push(Opcode::Jcc, imm(1, B), none(), imm(0, D));
        let program = builder.build_program().unwrap();
        let mut interp = interpreter_with(InterpreterConfig::default().with_step_limit(50));
        let result = interp.interpret(&program, 0);
        assert_eq!(result, Err(InterpreterError::StepLimitExceeded { limit: 50 }));
        assert_eq!(interp.stats().executed, 50);
    }

    #[test]
    fn test_program_counter_is_tracked() {
        let mut builder = IrBuilder::new(0x100);
        builder.push(Opcode::Nop, none(), none(), none());
        builder.at(0x104).push(Opcode::Str, reg("PC", D), none(), reg("t0", D));
        let program = builder.build_program().unwrap();

        let mut interp = interpreter();
        interp.interpret(&program, 0x100).unwrap();

        assert_eq!(interp.register_value("t0"), Some(0x104));
        assert_eq!(
            interp.defined_native_registers().into_iter().collect::<Vec<_>>(),
            vec!["PC".to_string()]
        );
    }

    #[test]
    fn test_missing_entry_is_terminal() {
        let program = Program::new();
        let mut interp = interpreter();
        interp.interpret(&program, 0x400).unwrap();
        assert_eq!(interp.stats().executed, 0);
        assert!(interp.defined_registers().is_empty());
    }

    struct StopAt(IrAddress);

    impl InterpreterPolicy for StopAt {
        fn next_instruction(&mut self, instruction: &IrInstruction) -> Result<(), InterpreterError> {
            if instruction.address == self.0 {
                return Err(InterpreterError::InvalidOperand {
                    address: instruction.address.to_string(),
                    reason: "breakpoint".to_string(),
                });
            }
            Ok(())
        }
    }

    #[test]
    fn test_hook_can_abort_before_execution() {
        let mut builder = IrBuilder::new(0);
        builder
            .push(Opcode::Str, imm(1, B), none(), reg("t0", B))
            .push(Opcode::Str, imm(2, B), none(), reg("t1", B));
        let program = builder.build_program().unwrap();

        let mut interp = Interpreter::new(
            InterpreterConfig::default(),
            Arc::new(PpcPolicy::new()),
            Box::new(StopAt(IrAddress::new(0, 1))),
        );
        assert!(interp.interpret(&program, 0).is_err());
        assert_eq!(interp.register_value("t0"), Some(1));
        assert!(interp.register("t1").is_none());
    }

    #[test]
    fn test_shift_helper() {
        assert_eq!(shift(1, 127), 1 << 127);
        assert_eq!(shift(1, 128), 0);
        assert_eq!(shift(u128::MAX, -127), 1);
        assert_eq!(shift(u128::MAX, i128::MIN), 0);
    }
}
