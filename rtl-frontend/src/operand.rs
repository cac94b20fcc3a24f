//! Native operand trees and their resolution
//!
//! The decoder hands over each operand as a small tree. `8(%r1)` with a
//! word access, for example, arrives as
//! `SizePrefix(Word, MemoryDeref(Add(Register("%r1"), Immediate(8))))`.

use std::fmt;

use rtl_error::TranslationError;
use rtl_ir::OperandSize;

use crate::translation::TranslationEnvironment;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum OperandNode {
    /// Fixes the width of the single child
    SizePrefix(OperandSize, Box<OperandNode>),
    Register(String),
    Immediate(i64),
    MemoryDeref(Box<OperandNode>),
    /// Sum inside an address expression
    Add(Box<OperandNode>, Box<OperandNode>),
}

impl OperandNode {
    pub fn register(name: impl Into<String>) -> Self {
        OperandNode::Register(name.into())
    }

    pub fn immediate(value: i64) -> Self {
        OperandNode::Immediate(value)
    }

    pub fn sized(size: OperandSize, child: OperandNode) -> Self {
        OperandNode::SizePrefix(size, Box::new(child))
    }

    pub fn deref(address: OperandNode) -> Self {
        OperandNode::MemoryDeref(Box::new(address))
    }

    pub fn add(lhs: OperandNode, rhs: OperandNode) -> Self {
        OperandNode::Add(Box::new(lhs), Box::new(rhs))
    }

    /// `displacement(base)` memory operand
    pub fn displacement(displacement: i64, base: impl Into<String>) -> Self {
        Self::deref(Self::add(Self::register(base), Self::immediate(displacement)))
    }
}

impl fmt::Display for OperandNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperandNode::SizePrefix(_, child) => write!(f, "{}", child),
            OperandNode::Register(name) => f.write_str(name),
            OperandNode::Immediate(value) if *value < 0 => write!(f, "-{:#x}", value.unsigned_abs()),
            OperandNode::Immediate(value) => write!(f, "{:#x}", value),
            OperandNode::MemoryDeref(address) => match address.as_ref() {
                OperandNode::Add(base, disp) => match disp.as_ref() {
                    OperandNode::Immediate(d) => write!(f, "{}({})", d, base),
                    _ => write!(f, "[{} + {}]", base, disp),
                },
                other => write!(f, "[{}]", other),
            },
            OperandNode::Add(lhs, rhs) => write!(f, "{} + {}", lhs, rhs),
        }
    }
}

/// One decoded native instruction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeInstruction {
    pub address: u64,
    pub mnemonic: String,
    pub operands: Vec<OperandNode>,
}

impl NativeInstruction {
    pub fn new(address: u64, mnemonic: impl Into<String>, operands: Vec<OperandNode>) -> Self {
        Self {
            address,
            mnemonic: mnemonic.into(),
            operands,
        }
    }
}

impl fmt::Display for NativeInstruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.mnemonic)?;
        for (i, operand) in self.operands.iter().enumerate() {
            let sep = if i == 0 { " " } else { ", " };
            write!(f, "{}{}", sep, operand)?;
        }
        Ok(())
    }
}

/// Operand after widths have been fixed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedOperand {
    Register {
        name: String,
        size: OperandSize,
    },
    Literal {
        value: i64,
        size: OperandSize,
    },
    /// `base + index + displacement`; `size` is the access width when the
    /// tree carried one
    Memory {
        base: Option<String>,
        index: Option<String>,
        displacement: i64,
        size: Option<OperandSize>,
    },
}

/// Width of an immediate without a size prefix
pub const DEFAULT_LITERAL_SIZE: OperandSize = OperandSize::Qword;

pub fn resolve_operand(
    env: &dyn TranslationEnvironment,
    node: &OperandNode,
) -> Result<ResolvedOperand, TranslationError> {
    resolve_operand_sized(env, node, None)
}

fn resolve_operand_sized(
    env: &dyn TranslationEnvironment,
    node: &OperandNode,
    prefix: Option<OperandSize>,
) -> Result<ResolvedOperand, TranslationError> {
    match node {
        OperandNode::SizePrefix(size, child) => match prefix {
            Some(outer) if outer != *size => Err(TranslationError::MalformedOperand(format!(
                "conflicting size prefixes {} and {} on {}",
                outer, size, child
            ))),
            _ => resolve_operand_sized(env, child, Some(*size)),
        },
        OperandNode::Register(name) => {
            let size = match prefix {
                Some(size) => size,
                None => env
                    .register_size(name)
                    .ok_or_else(|| TranslationError::UnknownRegister(name.clone()))?,
            };
            Ok(ResolvedOperand::Register {
                name: name.clone(),
                size,
            })
        }
        OperandNode::Immediate(value) => Ok(ResolvedOperand::Literal {
            value: *value,
            size: prefix.unwrap_or(DEFAULT_LITERAL_SIZE),
        }),
        OperandNode::MemoryDeref(address) => {
            let mut terms = AddressTerms::default();
            terms.collect(address)?;
            Ok(ResolvedOperand::Memory {
                base: terms.base,
                index: terms.index,
                displacement: terms.displacement,
                size: prefix,
            })
        }
        OperandNode::Add(..) => Err(TranslationError::MalformedOperand(format!(
            "address expression {} outside a memory operand",
            node
        ))),
    }
}

#[derive(Default)]
struct AddressTerms {
    base: Option<String>,
    index: Option<String>,
    displacement: i64,
}

impl AddressTerms {
    fn collect(&mut self, node: &OperandNode) -> Result<(), TranslationError> {
        match node {
            OperandNode::Register(name) => {
                if self.base.is_none() {
                    self.base = Some(name.clone());
                } else if self.index.is_none() {
                    self.index = Some(name.clone());
                } else {
                    return Err(TranslationError::MalformedOperand(format!(
                        "more than two registers in address expression ({})",
                        name
                    )));
                }
                Ok(())
            }
            OperandNode::Immediate(value) => {
                self.displacement = self.displacement.wrapping_add(*value);
                Ok(())
            }
            OperandNode::Add(lhs, rhs) => {
                self.collect(lhs)?;
                self.collect(rhs)
            }
            OperandNode::SizePrefix(_, child) => self.collect(child),
            OperandNode::MemoryDeref(_) => Err(TranslationError::MalformedOperand(
                "nested memory dereference".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::translation::StandardEnvironment;
    use rtl_register::PpcPolicy;
    use std::sync::Arc;

    fn env() -> StandardEnvironment {
        StandardEnvironment::with_policy(Arc::new(PpcPolicy::new()))
    }

    #[test]
    fn test_bare_register_width_from_catalog() {
        let resolved = resolve_operand(&env(), &OperandNode::register("%r3")).unwrap();
        assert_eq!(
            resolved,
            ResolvedOperand::Register {
                name: "%r3".to_string(),
                size: OperandSize::Dword
            }
        );

        let flag = resolve_operand(&env(), &OperandNode::register("XERCA")).unwrap();
        assert!(matches!(flag, ResolvedOperand::Register { size: OperandSize::Byte, .. }));
    }

    #[test]
    fn test_unknown_bare_register() {
        let result = resolve_operand(&env(), &OperandNode::register("%f1"));
        assert_eq!(result, Err(TranslationError::UnknownRegister("%f1".to_string())));

        let no_catalog = StandardEnvironment::new();
        assert!(resolve_operand(&no_catalog, &OperandNode::register("%r1")).is_err());
    }

    #[test]
    fn test_size_prefix_fixes_width() {
        let node = OperandNode::sized(OperandSize::Word, OperandNode::register("%r3"));
        let resolved = resolve_operand(&StandardEnvironment::new(), &node).unwrap();
        assert!(matches!(resolved, ResolvedOperand::Register { size: OperandSize::Word, .. }));

        let node = OperandNode::sized(OperandSize::Byte, OperandNode::immediate(-1));
        assert_eq!(
            resolve_operand(&env(), &node).unwrap(),
            ResolvedOperand::Literal {
                value: -1,
                size: OperandSize::Byte
            }
        );
    }

    #[test]
    fn test_memory_operand() {
        let node = OperandNode::sized(OperandSize::Dword, OperandNode::displacement(-8, "%r1"));
        assert_eq!(
            resolve_operand(&env(), &node).unwrap(),
            ResolvedOperand::Memory {
                base: Some("%r1".to_string()),
                index: None,
                displacement: -8,
                size: Some(OperandSize::Dword),
            }
        );

        let indexed = OperandNode::deref(OperandNode::add(
            OperandNode::register("%r3"),
            OperandNode::register("%r4"),
        ));
        assert!(matches!(
            resolve_operand(&env(), &indexed).unwrap(),
            ResolvedOperand::Memory { index: Some(_), size: None, .. }
        ));
    }

    #[test]
    fn test_malformed_trees() {
        let loose_add = OperandNode::add(OperandNode::register("%r1"), OperandNode::immediate(4));
        assert!(matches!(
            resolve_operand(&env(), &loose_add),
            Err(TranslationError::MalformedOperand(_))
        ));

        let conflicting = OperandNode::sized(
            OperandSize::Dword,
            OperandNode::sized(OperandSize::Byte, OperandNode::register("%r1")),
        );
        assert!(matches!(
            resolve_operand(&env(), &conflicting),
            Err(TranslationError::MalformedOperand(_))
        ));

        let repeated = OperandNode::sized(
            OperandSize::Dword,
            OperandNode::sized(OperandSize::Dword, OperandNode::register("%r1")),
        );
        assert!(matches!(
            resolve_operand(&env(), &repeated),
            Ok(ResolvedOperand::Register { size: OperandSize::Dword, .. })
        ));

        let nested = OperandNode::deref(OperandNode::deref(OperandNode::register("%r1")));
        assert!(matches!(
            resolve_operand(&env(), &nested),
            Err(TranslationError::MalformedOperand(_))
        ));
    }

    #[test]
    fn test_display() {
        let instr = NativeInstruction::new(
            0x100,
            "lwz",
            vec![
                OperandNode::register("%r3"),
                OperandNode::displacement(8, "%r1"),
            ],
        );
        assert_eq!(instr.to_string(), "lwz %r3, 8(%r1)");
    }
}
