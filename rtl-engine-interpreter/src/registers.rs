//! Register file with catalog-driven alias resolution

use std::collections::BTreeMap;

use rtl_ir::{OperandSize, RegisterStatus, RegisterValue};
use rtl_register::RegisterCatalog;

/// Name → value map owned by one interpreter
///
/// A name that was never written has no entry, which is different from an
/// entry whose status is `Undefined`. Aliases never get entries of their own;
/// reads and writes go through to the parent register.
#[derive(Debug, Clone, Default)]
pub struct RegisterFile {
    values: BTreeMap<String, RegisterValue>,
}

impl RegisterFile {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, catalog: &RegisterCatalog, name: &str) -> Option<RegisterValue> {
        match catalog.alias(name) {
            Some(alias) => self.values.get(&alias.parent).map(|parent| {
                RegisterValue::new(parent.value() >> alias.shift, alias.size, parent.status())
            }),
            None => self.values.get(name).copied(),
        }
    }

    pub fn set(
        &mut self,
        catalog: &RegisterCatalog,
        name: &str,
        value: u128,
        size: OperandSize,
        status: RegisterStatus,
    ) {
        let Some(alias) = catalog.alias(name) else {
            self.values
                .insert(name.to_string(), RegisterValue::new(value, size, status));
            return;
        };

        let parent_size = catalog.size_of(&alias.parent).unwrap_or(size);
        let old = self
            .values
            .get(&alias.parent)
            .map(|parent| parent.value())
            .unwrap_or(0);
        let merged = (old & !alias.parent_mask()) | ((alias.size.truncate(value)) << alias.shift);
        self.values.insert(
            alias.parent.clone(),
            RegisterValue::new(merged, parent_size, status),
        );
    }

    /// Mark a register undefined, keeping its stale magnitude
    pub fn undefine(&mut self, catalog: &RegisterCatalog, name: &str, size: OperandSize) {
        let (target, target_size) = match catalog.alias(name) {
            Some(alias) => (
                alias.parent.as_str(),
                catalog.size_of(&alias.parent).unwrap_or(size),
            ),
            None => (name, size),
        };
        let value = self
            .values
            .get(target)
            .map(|v| v.undefine())
            .unwrap_or_else(|| RegisterValue::new(0, target_size, RegisterStatus::Undefined));
        self.values.insert(target.to_string(), value);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &RegisterValue)> {
        self.values.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rtl_register::{RegisterAlias, RegisterClass, RegisterInfo};

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
            .add_alias(RegisterAlias {
                name: "ah".to_string(),
                parent: "eax".to_string(),
                shift: 8,
                size: OperandSize::Byte,
            })
            .unwrap();
        catalog
    }

    #[test]
    fn test_alias_write_merges_into_parent() {
        let catalog = catalog();
        let mut file = RegisterFile::new();
        file.set(&catalog, "eax", 0x1234_5678, OperandSize::Dword, RegisterStatus::Defined);
        file.set(&catalog, "ah", 0xAB, OperandSize::Byte, RegisterStatus::Defined);

        assert_eq!(file.get(&catalog, "eax").unwrap().value(), 0x1234_AB78);
        assert_eq!(file.get(&catalog, "ah").unwrap().value(), 0xAB);
        assert_eq!(file.iter().count(), 1);
    }

    #[test]
    fn test_alias_read_of_untouched_parent() {
        let catalog = catalog();
        let file = RegisterFile::new();
        assert!(file.get(&catalog, "ah").is_none());
    }

    #[test]
    fn test_undefine_creates_entry() {
        let catalog = catalog();
        let mut file = RegisterFile::new();
        file.undefine(&catalog, "t3", OperandSize::Qword);

        let value = file.get(&catalog, "t3").unwrap();
        assert!(!value.is_defined());
        assert_eq!(value.size(), OperandSize::Qword);
    }
}
