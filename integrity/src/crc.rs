//! Table-driven 32-bit CRC, direct (non-reflected) method
//!
//! The register is seeded with the first four message bytes; every
//! following byte is shifted in at the bottom while the byte leaving the
//! top selects a table entry to XOR in. The message is implicitly followed
//! by four zero bytes so that every message bit passes through the
//! register. No input or output reflection and no final XOR.
//!
//! This is not the reflected Ethernet CRC-32: for `"123456789"` under the
//! default polynomial the result is `0x89A1897F`, not `0xCBF43926`.

use std::sync::OnceLock;
use thiserror::Error;

/// Default generator polynomial
pub const DEFAULT_POLYNOMIAL: u32 = 0x04C1_1DB7;

/// Smallest buffer the checksum accepts (one register width)
pub const MIN_MESSAGE_LEN: usize = 4;

const AUGMENT: [u8; 4] = [0; 4];

/// Errors reported by the checksum engine
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CrcError {
    /// The buffer cannot seed the register
    #[error("Buffer too short for checksum: {len} bytes, need at least 4")]
    BufferTooShort { len: usize },
}

/// 256-entry lookup table for one polynomial
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrcTable {
    polynomial: u32,
    entries: [u32; 256],
}

impl CrcTable {
    /// Builds the table by running eight shift/XOR steps per byte value
    pub fn new(polynomial: u32) -> Self {
        let mut entries = [0u32; 256];
        for (byte, entry) in entries.iter_mut().enumerate() {
            let mut reg = (byte as u32) << 24;
            for _ in 0..8 {
                reg = if reg & 0x8000_0000 != 0 {
                    (reg << 1) ^ polynomial
                } else {
                    reg << 1
                };
            }
            *entry = reg;
        }
        Self {
            polynomial,
            entries,
        }
    }

    /// Polynomial the table was built from
    pub fn polynomial(&self) -> u32 {
        self.polynomial
    }

    /// Table entry for a top byte
    pub fn entry(&self, top_byte: u8) -> u32 {
        self.entries[top_byte as usize]
    }

    /// Runs the direct method over `data`
    fn run(&self, data: &[u8]) -> Result<u32, CrcError> {
        if data.len() < MIN_MESSAGE_LEN {
            return Err(CrcError::BufferTooShort { len: data.len() });
        }

        let mut crc = u32::from_be_bytes([data[0], data[1], data[2], data[3]]);
        for &byte in data[MIN_MESSAGE_LEN..].iter().chain(AUGMENT.iter()) {
            crc = ((crc << 8) | byte as u32) ^ self.entries[(crc >> 24) as usize];
        }
        Ok(crc)
    }
}

/// Checksum engine with a lazily built table
///
/// The table is built on first use. Concurrent first use from several
/// threads builds it once; every caller sees the same table.
#[derive(Debug)]
pub struct CrcEngine {
    polynomial: u32,
    table: OnceLock<CrcTable>,
}

impl CrcEngine {
    /// Engine for the default polynomial
    pub const fn new() -> Self {
        Self::with_polynomial(DEFAULT_POLYNOMIAL)
    }

    /// Engine for a given polynomial, table not yet built
    pub const fn with_polynomial(polynomial: u32) -> Self {
        Self {
            polynomial,
            table: OnceLock::new(),
        }
    }

    /// Switches to `polynomial` and builds its table now
    pub fn configure(&mut self, polynomial: u32) {
        let table = OnceLock::new();
        let _ = table.set(CrcTable::new(polynomial));
        self.polynomial = polynomial;
        self.table = table;
    }

    /// The configured polynomial
    pub fn polynomial(&self) -> u32 {
        self.polynomial
    }

    /// Whether the lookup table has been built
    pub fn is_initialized(&self) -> bool {
        self.table.get().is_some()
    }

    /// The lookup table, built on first call
    pub fn table(&self) -> &CrcTable {
        self.table.get_or_init(|| CrcTable::new(self.polynomial))
    }

    /// Computes the checksum of `data` (at least four bytes)
    pub fn checksum(&self, data: &[u8]) -> Result<u32, CrcError> {
        self.table().run(data)
    }

    /// Returns true if `data` checksums to `expected`
    pub fn verify(&self, data: &[u8], expected: u32) -> bool {
        self.checksum(data) == Ok(expected)
    }
}

impl Default for CrcEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for CrcEngine {
    fn clone(&self) -> Self {
        let table = OnceLock::new();
        if let Some(built) = self.table.get() {
            let _ = table.set(built.clone());
        }
        Self {
            polynomial: self.polynomial,
            table,
        }
    }
}

static DEFAULT_ENGINE: CrcEngine = CrcEngine::new();

/// Process-wide engine for the default polynomial
pub fn default_engine() -> &'static CrcEngine {
    &DEFAULT_ENGINE
}

/// Checksum under the default polynomial
pub fn checksum(data: &[u8]) -> Result<u32, CrcError> {
    DEFAULT_ENGINE.checksum(data)
}
