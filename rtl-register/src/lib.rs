//! CPU policies: per-architecture register catalogs
//!
//! Translators and the interpreter only see the [`CpuPolicy`] contract. A new
//! architecture is a new policy plus a new translator set; the interpreter
//! does not change.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use rtl_ir::OperandSize;
use thiserror::Error;

pub mod ppc;

pub use ppc::PpcPolicy;

/// Errors that can occur while assembling a register catalog
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegisterError {
    #[error("Register {0} is already defined")]
    Duplicate(String),
    #[error("Alias {alias} refers to unknown register {parent}")]
    UnknownParent { alias: String, parent: String },
    #[error("Alias {alias} does not fit inside {parent}")]
    AliasOutOfRange { alias: String, parent: String },
}

/// Register classes for categorizing registers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegisterClass {
    GeneralPurpose,
    /// Single flag bits such as carry or overflow
    Flag,
    /// Bits of a condition-register field
    Condition,
    /// Link, count and program counter registers
    Special,
}

/// Register information
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterInfo {
    pub name: String,
    pub size: OperandSize,
    pub class: RegisterClass,
}

impl RegisterInfo {
    pub fn new(name: impl Into<String>, size: OperandSize, class: RegisterClass) -> Self {
        Self {
            name: name.into(),
            size,
            class,
        }
    }
}

/// A narrower view of a wider register: bits `shift .. shift + size.bits()`
/// of `parent`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterAlias {
    pub name: String,
    pub parent: String,
    pub shift: u32,
    pub size: OperandSize,
}

impl RegisterAlias {
    /// Mask of the aliased bits in the parent's coordinate space
    pub fn parent_mask(&self) -> u128 {
        self.size.mask() << self.shift
    }
}

#[derive(Debug, Clone, Default)]
pub struct RegisterCatalog {
    registers: BTreeMap<String, RegisterInfo>,
    aliases: HashMap<String, RegisterAlias>,
}

impl RegisterCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_register(&mut self, info: RegisterInfo) -> Result<(), RegisterError> {
        if self.contains(&info.name) {
            return Err(RegisterError::Duplicate(info.name));
        }
        self.registers.insert(info.name.clone(), info);
        Ok(())
    }

    pub fn add_alias(&mut self, alias: RegisterAlias) -> Result<(), RegisterError> {
        if self.contains(&alias.name) {
            return Err(RegisterError::Duplicate(alias.name));
        }
        let parent = self
            .registers
            .get(&alias.parent)
            .ok_or_else(|| RegisterError::UnknownParent {
                alias: alias.name.clone(),
                parent: alias.parent.clone(),
            })?;
        if alias.shift + alias.size.bits() > parent.size.bits() {
            return Err(RegisterError::AliasOutOfRange {
                alias: alias.name,
                parent: alias.parent,
            });
        }
        self.aliases.insert(alias.name.clone(), alias);
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.registers.contains_key(name) || self.aliases.contains_key(name)
    }

    pub fn register(&self, name: &str) -> Option<&RegisterInfo> {
        self.registers.get(name)
    }

    pub fn alias(&self, name: &str) -> Option<&RegisterAlias> {
        self.aliases.get(name)
    }

    /// Declared width of a register or alias
    pub fn size_of(&self, name: &str) -> Option<OperandSize> {
        self.registers
            .get(name)
            .map(|info| info.size)
            .or_else(|| self.aliases.get(name).map(|alias| alias.size))
    }

    pub fn registers_of_class(&self, class: RegisterClass) -> impl Iterator<Item = &RegisterInfo> {
        self.registers.values().filter(move |info| info.class == class)
    }

    pub fn iter(&self) -> impl Iterator<Item = &RegisterInfo> {
        self.registers.values()
    }

    pub fn len(&self) -> usize {
        self.registers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registers.is_empty()
    }
}

impl FromIterator<RegisterInfo> for RegisterCatalog {
    /// Later entries replace earlier ones with the same name
    fn from_iter<I: IntoIterator<Item = RegisterInfo>>(iter: I) -> Self {
        Self {
            registers: iter
                .into_iter()
                .map(|info| (info.name.clone(), info))
                .collect(),
            aliases: HashMap::new(),
        }
    }
}

/// Per-architecture contract consumed by translators and the interpreter
///
/// Policies are immutable once built and are shared between interpreter
/// instances behind an `Arc`.
pub trait CpuPolicy: Send + Sync + fmt::Debug {
    fn name(&self) -> &str;

    fn catalog(&self) -> &RegisterCatalog;

    /// Register the interpreter keeps in sync with the native address of the
    /// instruction being executed
    fn program_counter(&self) -> &str;

    fn program_counter_size(&self) -> OperandSize {
        self.catalog()
            .size_of(self.program_counter())
            .unwrap_or(OperandSize::Qword)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> RegisterCatalog {
        let mut catalog = RegisterCatalog::new();
        catalog
            .add_register(RegisterInfo::new(
                "eax",
                OperandSize::Dword,
                RegisterClass::GeneralPurpose,
            ))
            .unwrap();
        catalog
    }

    #[test]
    fn test_alias_sizes() {
        let mut catalog = catalog();
        catalog
            .add_alias(RegisterAlias {
                name: "ah".to_string(),
                parent: "eax".to_string(),
                shift: 8,
                size: OperandSize::Byte,
            })
            .unwrap();

        assert_eq!(catalog.size_of("ah"), Some(OperandSize::Byte));
        assert_eq!(catalog.size_of("eax"), Some(OperandSize::Dword));
        assert_eq!(catalog.alias("ah").unwrap().parent_mask(), 0xFF00);
        assert_eq!(catalog.size_of("ebx"), None);
    }

    #[test]
    fn test_alias_validation() {
        let mut catalog = catalog();

        let unknown = catalog.add_alias(RegisterAlias {
            name: "bl".to_string(),
            parent: "ebx".to_string(),
            shift: 0,
            size: OperandSize::Byte,
        });
        assert!(matches!(unknown, Err(RegisterError::UnknownParent { .. })));

        let too_wide = catalog.add_alias(RegisterAlias {
            name: "bad".to_string(),
            parent: "eax".to_string(),
            shift: 16,
            size: OperandSize::Dword,
        });
        assert!(matches!(too_wide, Err(RegisterError::AliasOutOfRange { .. })));
    }

    #[test]
    fn test_duplicate_rejected() {
        let mut catalog = catalog();
        let result = catalog.add_register(RegisterInfo::new(
            "eax",
            OperandSize::Dword,
            RegisterClass::GeneralPurpose,
        ));
        assert_eq!(result, Err(RegisterError::Duplicate("eax".to_string())));
    }
}
