//! Translation environment: temporary naming and register widths

use std::fmt;
use std::sync::Arc;

use rtl_ir::{OperandSize, TEMPORARY_PREFIX};
use rtl_register::CpuPolicy;

/// State shared by all translator invocations that feed one IR program
pub trait TranslationEnvironment {
    /// Fresh temporary register name, unique for the environment's lifetime
    fn next_temporary(&mut self, size: OperandSize) -> String;

    /// Declared width of a bare native register
    fn register_size(&self, name: &str) -> Option<OperandSize>;
}

#[derive(Default)]
pub struct StandardEnvironment {
    next_temporary: u64,
    policy: Option<Arc<dyn CpuPolicy>>,
}

impl StandardEnvironment {
    /// Environment without a register catalog; every register operand
    /// must carry a size prefix
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(policy: Arc<dyn CpuPolicy>) -> Self {
        Self {
            next_temporary: 0,
            policy: Some(policy),
        }
    }

    pub fn temporaries_allocated(&self) -> u64 {
        self.next_temporary
    }
}

impl fmt::Debug for StandardEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StandardEnvironment")
            .field("next_temporary", &self.next_temporary)
            .field("policy", &self.policy.as_ref().map(|p| p.name().to_string()))
            .finish()
    }
}

impl TranslationEnvironment for StandardEnvironment {
    fn next_temporary(&mut self, _size: OperandSize) -> String {
        let name = format!("{}{}", TEMPORARY_PREFIX, self.next_temporary);
        self.next_temporary += 1;
        name
    }

    fn register_size(&self, name: &str) -> Option<OperandSize> {
        self.policy.as_ref()?.catalog().size_of(name)
    }
}
