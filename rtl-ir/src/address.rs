use serde::{Deserialize, Serialize};
use std::fmt;

/// Position of an IR instruction: the native instruction address it was
/// lifted from plus its index inside that instruction's expansion.
///
/// Ordering is lexicographic on `(native, offset)`, which is also program
/// order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct IrAddress {
    pub native: u64,
    pub offset: u32,
}

impl IrAddress {
    pub const fn new(native: u64, offset: u32) -> Self {
        Self { native, offset }
    }

    /// First IR instruction of a native instruction
    pub const fn from_native(native: u64) -> Self {
        Self { native, offset: 0 }
    }
}

impl fmt::Display for IrAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}.{:02x}", self.native, self.offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordering() {
        assert!(IrAddress::new(0x100, 5) < IrAddress::new(0x104, 0));
        assert!(IrAddress::new(0x100, 1) < IrAddress::new(0x100, 2));
    }

    #[test]
    fn test_display() {
        assert_eq!(IrAddress::new(0x100, 3).to_string(), "0x100.03");
    }
}
