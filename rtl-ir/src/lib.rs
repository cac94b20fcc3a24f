//! Architecture-neutral register-transfer IR
//!
//! Native instructions are lifted into sequences of [`IrInstruction`]s. Each
//! operand carries its own [`OperandSize`]; the interpreter never infers a
//! width from context.

mod address;
mod instruction;
mod operand;
mod program;
mod size;
mod value;

pub use address::IrAddress;
pub use instruction::{IrInstruction, Opcode};
pub use operand::{IrOperand, OperandKind};
pub use program::Program;
pub use size::OperandSize;
pub use value::{RegisterStatus, RegisterValue};

/// Prefix of translator-allocated temporary registers
pub const TEMPORARY_PREFIX: char = 't';

/// Whether `name` follows the temporary naming scheme (`t` followed by digits)
pub fn is_temporary_register(name: &str) -> bool {
    let mut chars = name.chars();
    chars.next() == Some(TEMPORARY_PREFIX)
        && !chars.as_str().is_empty()
        && chars.all(|c| c.is_ascii_digit())
}

/// Sequential IR assembler for hand-written programs
///
/// Instructions pushed while positioned at one native address get
/// consecutive offsets; [`IrBuilder::at`] moves to another native address.
pub struct IrBuilder {
    native: u64,
    offset: u32,
    instructions: Vec<IrInstruction>,
}

impl IrBuilder {
    pub fn new(native: u64) -> Self {
        Self {
            native,
            offset: 0,
            instructions: Vec::new(),
        }
    }

    pub fn at(&mut self, native: u64) -> &mut Self {
        self.native = native;
        self.offset = 0;
        self
    }

    /// Address the next pushed instruction will get
    pub fn current_address(&self) -> IrAddress {
        IrAddress::new(self.native, self.offset)
    }

    pub fn push(
        &mut self,
        opcode: Opcode,
        op1: IrOperand,
        op2: IrOperand,
        op3: IrOperand,
    ) -> &mut Self {
        let address = self.current_address();
        self.instructions
            .push(IrInstruction::new(address, opcode, op1, op2, op3));
        self.offset += 1;
        self
    }

    pub fn build(self) -> Vec<IrInstruction> {
        self.instructions
    }

    pub fn build_program(self) -> Result<Program, rtl_error::IrError> {
        Program::from_instructions(self.instructions)
    }
}
