//! Sparse byte-addressable memory

use std::collections::BTreeMap;

use rtl_common::Endianness;
use rtl_ir::OperandSize;

/// Byte store keyed by address
///
/// Only bytes that were read or written exist in the map. Reading a byte
/// that was never written yields zero and creates it, so [`SparseMemory::size`]
/// counts every byte an access touched.
#[derive(Debug, Clone)]
pub struct SparseMemory {
    bytes: BTreeMap<u64, u8>,
    endianness: Endianness,
}

impl SparseMemory {
    pub fn new(endianness: Endianness) -> Self {
        Self {
            bytes: BTreeMap::new(),
            endianness,
        }
    }

    pub fn endianness(&self) -> Endianness {
        self.endianness
    }

    /// Number of distinct bytes touched
    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    pub fn read(&mut self, address: u64, size: OperandSize) -> u128 {
        let bytes: Vec<u8> = (0..size.bytes() as u64)
            .map(|i| *self.bytes.entry(address.wrapping_add(i)).or_insert(0))
            .collect();

        match self.endianness {
            Endianness::BigEndian => bytes
                .iter()
                .fold(0u128, |acc, &b| (acc << 8) | u128::from(b)),
            Endianness::LittleEndian => bytes
                .iter()
                .rev()
                .fold(0u128, |acc, &b| (acc << 8) | u128::from(b)),
        }
    }

    pub fn write(&mut self, address: u64, value: u128, size: OperandSize) {
        let count = size.bytes();
        for i in 0..count {
            let shift = match self.endianness {
                Endianness::BigEndian => (count - 1 - i) * 8,
                Endianness::LittleEndian => i * 8,
            };
            let byte = (value >> shift) as u8;
            self.bytes.insert(address.wrapping_add(i as u64), byte);
        }
    }

    /// Inspect one byte without touching it
    pub fn peek(&self, address: u64) -> Option<u8> {
        self.bytes.get(&address).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u64, u8)> + '_ {
        self.bytes.iter().map(|(&address, &byte)| (address, byte))
    }
}
