//! Per-instruction IR emitter

use rtl_error::TranslationError;
use rtl_ir::{IrAddress, IrInstruction, IrOperand, Opcode, OperandSize};

use super::TranslationEnvironment;

/// Jump target inside one native instruction's expansion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Label(usize);

/// Collects the IR of one native instruction
///
/// Instructions get consecutive offsets at the native address. Nothing
/// reaches the caller's sequence until [`IrEmitter::finish`] succeeds, so a
/// translator that bails out with `?` leaves the output untouched.
pub struct IrEmitter<'a> {
    env: &'a mut dyn TranslationEnvironment,
    native: u64,
    comment: Option<String>,
    instructions: Vec<IrInstruction>,
    labels: Vec<Option<u32>>,
    fixups: Vec<(usize, Label)>,
}

impl<'a> IrEmitter<'a> {
    pub fn new(env: &'a mut dyn TranslationEnvironment, native: u64) -> Self {
        Self {
            env,
            native,
            comment: None,
            instructions: Vec::new(),
            labels: Vec::new(),
            fixups: Vec::new(),
        }
    }

    /// Attach `comment` to the first emitted instruction
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    pub fn native_address(&self) -> u64 {
        self.native
    }

    pub fn env(&self) -> &dyn TranslationEnvironment {
        &*self.env
    }

    /// Register operand naming a fresh temporary
    pub fn temporary(&mut self, size: OperandSize) -> IrOperand {
        IrOperand::register(self.env.next_temporary(size), size)
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    fn next_offset(&self) -> u32 {
        self.instructions.len() as u32
    }

    pub fn emit(&mut self, opcode: Opcode, op1: IrOperand, op2: IrOperand, op3: IrOperand) {
        let address = IrAddress::new(self.native, self.next_offset());
        self.instructions
            .push(IrInstruction::new(address, opcode, op1, op2, op3));
    }

    /// `op3 = op1`
    pub fn copy(&mut self, source: IrOperand, destination: IrOperand) {
        self.emit(Opcode::Str, source, IrOperand::empty(), destination);
    }

    pub fn new_label(&mut self) -> Label {
        self.labels.push(None);
        Label(self.labels.len() - 1)
    }

    /// Point `label` at the next instruction to be emitted
    pub fn bind(&mut self, label: Label) {
        let offset = self.next_offset();
        if let Some(slot) = self.labels.get_mut(label.0) {
            *slot = Some(offset);
        }
    }

    pub fn jump_if(&mut self, condition: IrOperand, label: Label) {
        self.fixups.push((self.instructions.len(), label));
        self.emit(
            Opcode::Jcc,
            condition,
            IrOperand::empty(),
            IrOperand::empty(),
        );
    }

    pub fn jump(&mut self, label: Label) {
        self.jump_if(IrOperand::integer(1, OperandSize::Byte), label);
    }

    /// Resolve labels and append everything to `out`
    ///
    /// Returns the number of instructions appended.
    pub fn finish(mut self, out: &mut Vec<IrInstruction>) -> Result<usize, TranslationError> {
        let end = self.next_offset();
        if self.labels.iter().any(|bound| *bound == Some(end)) {
            self.emit(
                Opcode::Nop,
                IrOperand::empty(),
                IrOperand::empty(),
                IrOperand::empty(),
            );
        }

        for &(index, label) in &self.fixups {
            let offset = self
                .labels
                .get(label.0)
                .copied()
                .flatten()
                .ok_or_else(|| {
                    TranslationError::UnboundLabel(
                        self.comment
                            .clone()
                            .unwrap_or_else(|| format!("{:#x}", self.native)),
                    )
                })?;
            self.instructions[index].op3 =
                IrOperand::sub_address(IrAddress::new(self.native, offset));
        }

        if let (Some(comment), Some(first)) = (self.comment.take(), self.instructions.first_mut()) {
            first.comment = Some(comment);
        }

        let count = self.instructions.len();
        out.extend(self.instructions);
        Ok(count)
    }
}
