// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 itsakeyfut
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Memory bus implementation
//!
//! The Bus routes physical-address load/store operations to the two backing
//! stores the interpreter needs: main RAM and BIOS ROM.
//!
//! # Memory Map
//!
//! | Physical Address Range | Region   | Size   | Access |
//! |------------------------|----------|--------|--------|
//! | 0x00000000-0x001FFFFF  | RAM      | 2MB    | R/W    |
//! | 0x1FC00000-0x1FC7FFFF  | BIOS ROM | 512KB  | R only |
//!
//! Every operation takes a *physical* address; callers translate virtual
//! addresses first (see [`translate_address`]). Accesses outside the two
//! regions are not errors: loads return an all-ones sentinel, stores are
//! dropped, and a warning is logged either way. The BIOS region is 1 MiB
//! mirrored into its 512 KiB store by masking the low 20 bits.

use crate::core::error::{EmulatorError, Result};
use std::fs::File;
use std::io::Read;

// Sub-modules
mod region;

// Re-export public types
pub use region::{translate_address, MemoryRegion};

/// Memory bus for RAM and BIOS ROM accesses
///
/// # Example
///
/// ```
/// use psxcore::core::memory::Bus;
///
/// let mut bus = Bus::new();
/// bus.store_word(0x00000000, 0x12345678);
/// assert_eq!(bus.load_word(0x00000000), 0x12345678);
/// ```
pub struct Bus {
    /// Main RAM (2MB)
    ///
    /// Physical address: 0x00000000-0x001FFFFF
    ram: Vec<u8>,

    /// BIOS ROM (512KB)
    ///
    /// Physical address: 0x1FC00000-0x1FC7FFFF, read-only at the bus layer
    bios: Vec<u8>,
}

impl Bus {
    /// RAM size (2MB)
    pub const RAM_SIZE: usize = 2 * 1024 * 1024;

    /// BIOS size (512KB)
    pub const BIOS_SIZE: usize = 512 * 1024;

    /// RAM physical address range
    const RAM_START: u32 = 0x00000000;
    const RAM_END: u32 = 0x001FFFFF;

    /// BIOS ROM physical address range
    const BIOS_START: u32 = 0x1FC00000;
    const BIOS_END: u32 = 0x1FC7FFFF;

    /// BIOS offset mask (1 MiB region mirrored into the 512 KiB store)
    const BIOS_MASK: u32 = 0x000FFFFF;

    /// Create a new Bus with zeroed RAM and BIOS
    pub fn new() -> Self {
        Self {
            ram: vec![0u8; Self::RAM_SIZE],
            bios: vec![0u8; Self::BIOS_SIZE],
        }
    }

    /// Create a Bus around a caller-provided RAM buffer
    ///
    /// Lets the host own the RAM allocation (and inspect it by other means
    /// once the bus is dropped). The buffer must be exactly 2 MiB.
    ///
    /// # Errors
    ///
    /// [`EmulatorError::InvalidRamSize`] if the buffer has the wrong length.
    pub fn with_ram(ram: Vec<u8>) -> Result<Self> {
        if ram.len() != Self::RAM_SIZE {
            return Err(EmulatorError::InvalidRamSize {
                expected: Self::RAM_SIZE,
                actual: ram.len(),
            });
        }
        Ok(Self {
            ram,
            bios: vec![0u8; Self::BIOS_SIZE],
        })
    }

    /// Load a BIOS image from a file
    ///
    /// The image must be exactly 512 KiB.
    ///
    /// # Errors
    ///
    /// - [`EmulatorError::Io`] if the file cannot be read
    /// - [`EmulatorError::InvalidBiosSize`] if the image has the wrong size
    pub fn load_bios(&mut self, path: &str) -> Result<()> {
        let mut file = File::open(path)?;
        let mut data = Vec::new();
        file.read_to_end(&mut data)?;
        self.set_bios(data)
    }

    /// Install a BIOS image from an in-memory buffer
    ///
    /// # Errors
    ///
    /// [`EmulatorError::InvalidBiosSize`] if the image has the wrong size.
    pub fn set_bios(&mut self, data: Vec<u8>) -> Result<()> {
        if data.len() != Self::BIOS_SIZE {
            return Err(EmulatorError::InvalidBiosSize {
                expected: Self::BIOS_SIZE,
                actual: data.len(),
            });
        }
        self.bios = data;
        log::info!("BIOS image loaded ({} bytes)", Self::BIOS_SIZE);
        Ok(())
    }

    /// Load a little-endian word from a physical address
    ///
    /// No alignment is required; a word may start at any byte inside a
    /// region. Unknown regions, and accesses that would run past the end
    /// of their backing store, return `0xFFFFFFFF` with a warning.
    pub fn load_word(&self, paddr: u32) -> u32 {
        let word = match self.identify_region(paddr) {
            MemoryRegion::RAM => read_word(&self.ram, paddr as usize),
            MemoryRegion::BIOS => read_word(&self.bios, (paddr & Self::BIOS_MASK) as usize),
            MemoryRegion::Unmapped => None,
        };

        let Some(word) = word else {
            log::warn!(
                "Unknown physical address 0x{:08X} when attempting to load word; \
                 returning 0xFFFF'FFFF",
                paddr
            );
            return 0xFFFF_FFFF;
        };

        log::trace!("Loaded word 0x{:08X} from physical address 0x{:08X}", word, paddr);
        word
    }

    /// Load a byte from a physical address
    ///
    /// Unknown regions return `0xFF` with a warning.
    pub fn load_byte(&self, paddr: u32) -> u8 {
        let byte = match self.identify_region(paddr) {
            MemoryRegion::RAM => self.ram[paddr as usize],
            MemoryRegion::BIOS => self.bios[(paddr & Self::BIOS_MASK) as usize],
            MemoryRegion::Unmapped => {
                log::warn!(
                    "Unknown physical address 0x{:08X} when attempting to load byte; \
                     returning 0xFF",
                    paddr
                );
                return 0xFF;
            }
        };

        log::trace!("Loaded byte 0x{:02X} from 0x{:08X}", byte, paddr);
        byte
    }

    /// Store a little-endian word at a physical address
    ///
    /// Only RAM accepts stores; BIOS and unknown regions, and accesses
    /// that would run past the end of RAM, drop the write with a warning.
    pub fn store_word(&mut self, paddr: u32, word: u32) {
        let stored = match self.identify_region(paddr) {
            MemoryRegion::RAM => write_bytes(&mut self.ram, paddr as usize, &word.to_le_bytes()),
            _ => false,
        };

        if !stored {
            log::warn!(
                "Unknown physical address 0x{:08X} when attempting to store word \
                 0x{:08X}; ignoring",
                paddr,
                word
            );
            return;
        }
        log::trace!("Stored word 0x{:08X} at 0x{:08X}", word, paddr);
    }

    /// Store a little-endian half-word at a physical address
    pub fn store_half(&mut self, paddr: u32, hword: u16) {
        let stored = match self.identify_region(paddr) {
            MemoryRegion::RAM => write_bytes(&mut self.ram, paddr as usize, &hword.to_le_bytes()),
            _ => false,
        };

        if !stored {
            log::warn!(
                "Unknown physical address 0x{:08X} when attempting to store half-word \
                 0x{:04X}; ignoring",
                paddr,
                hword
            );
            return;
        }
        log::trace!("Stored half-word 0x{:04X} at 0x{:08X}", hword, paddr);
    }

    /// Store a byte at a physical address
    pub fn store_byte(&mut self, paddr: u32, byte: u8) {
        match self.identify_region(paddr) {
            MemoryRegion::RAM => self.ram[paddr as usize] = byte,
            _ => {
                log::warn!(
                    "Unknown physical address 0x{:08X} when attempting to store byte \
                     0x{:02X}; ignoring",
                    paddr,
                    byte
                );
                return;
            }
        }
        log::trace!("Stored byte 0x{:02X} at 0x{:08X}", byte, paddr);
    }

    /// Get a view of RAM
    pub fn ram(&self) -> &[u8] {
        &self.ram
    }

    /// Get a mutable view of RAM (used by the EXE injector and the host)
    pub fn ram_mut(&mut self) -> &mut [u8] {
        &mut self.ram
    }
}

impl Default for Bus {
    fn default() -> Self {
        Self::new()
    }
}

/// Little-endian word at `offset`, or `None` when the access would run
/// past the end of the store
///
/// Region decode goes by the starting byte, so an unaligned access in the
/// last three bytes of a region straddles its end; the caller treats that
/// like an unknown address.
fn read_word(store: &[u8], offset: usize) -> Option<u32> {
    let bytes = store.get(offset..offset + 4)?;
    Some(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

/// Write `bytes` at `offset`; false when the access would run past the
/// end of the store
fn write_bytes(store: &mut [u8], offset: usize, bytes: &[u8]) -> bool {
    match store.get_mut(offset..offset + bytes.len()) {
        Some(dest) => {
            dest.copy_from_slice(bytes);
            true
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ram_word_round_trip() {
        let mut bus = Bus::new();

        bus.store_word(0x00000000, 0x12345678);
        assert_eq!(bus.load_word(0x00000000), 0x12345678);

        // Little-endian byte order
        assert_eq!(bus.load_byte(0x00000000), 0x78);
        assert_eq!(bus.load_byte(0x00000003), 0x12);
    }

    #[test]
    fn test_ram_half_word_store() {
        let mut bus = Bus::new();

        bus.store_half(0x00000100, 0xBEEF);
        assert_eq!(bus.load_byte(0x00000100), 0xEF);
        assert_eq!(bus.load_byte(0x00000101), 0xBE);
    }

    #[test]
    fn test_ram_byte_store() {
        let mut bus = Bus::new();

        bus.store_byte(0x001FFFFF, 0xAB);
        assert_eq!(bus.load_byte(0x001FFFFF), 0xAB);
    }

    #[test]
    fn test_unaligned_ram_word() {
        let mut bus = Bus::new();

        // No alignment check is performed at the bus layer
        bus.store_word(0x00000001, 0xCAFEBABE);
        assert_eq!(bus.load_word(0x00000001), 0xCAFEBABE);
    }

    #[test]
    fn test_word_access_straddling_ram_end() {
        let mut bus = Bus::new();

        // The last fully in-bounds word still round-trips
        bus.store_word(Bus::RAM_END - 3, 0xCAFEBABE);
        assert_eq!(bus.load_word(Bus::RAM_END - 3), 0xCAFEBABE);

        // A word starting in the last three bytes of RAM straddles the
        // region end: the load yields the sentinel, the store is dropped,
        // and neither panics
        assert_eq!(bus.load_word(Bus::RAM_END - 2), 0xFFFFFFFF);
        bus.store_word(Bus::RAM_END - 2, 0x11223344);
        assert_eq!(bus.load_word(Bus::RAM_END - 3), 0xCAFEBABE);
    }

    #[test]
    fn test_half_word_store_straddling_ram_end() {
        let mut bus = Bus::new();

        bus.store_half(Bus::RAM_END - 1, 0xBEEF);
        assert_eq!(bus.load_byte(Bus::RAM_END - 1), 0xEF);
        assert_eq!(bus.load_byte(Bus::RAM_END), 0xBE);

        // Starting on the very last RAM byte straddles the region end
        bus.store_half(Bus::RAM_END, 0x1234);
        assert_eq!(bus.load_byte(Bus::RAM_END), 0xBE, "dropped, not partially written");
    }

    #[test]
    fn test_word_access_straddling_bios_end() {
        let mut bios = vec![0u8; Bus::BIOS_SIZE];
        bios[Bus::BIOS_SIZE - 4..].copy_from_slice(&0xA1B2C3D4u32.to_le_bytes());

        let mut bus = Bus::new();
        bus.set_bios(bios).unwrap();

        assert_eq!(bus.load_word(Bus::BIOS_END - 3), 0xA1B2C3D4);
        assert_eq!(bus.load_word(Bus::BIOS_END - 2), 0xFFFFFFFF);
        assert_eq!(bus.load_word(Bus::BIOS_END), 0xFFFFFFFF);
    }

    #[test]
    fn test_bios_read_only() {
        let mut bios = vec![0u8; Bus::BIOS_SIZE];
        bios[0] = 0x11;
        bios[1] = 0x22;
        bios[2] = 0x33;
        bios[3] = 0x44;

        let mut bus = Bus::new();
        bus.set_bios(bios).unwrap();

        assert_eq!(bus.load_word(0x1FC00000), 0x44332211);

        // Stores to the BIOS region are dropped
        bus.store_word(0x1FC00000, 0xDEADBEEF);
        bus.store_half(0x1FC00000, 0xDEAD);
        bus.store_byte(0x1FC00000, 0xEF);
        assert_eq!(bus.load_word(0x1FC00000), 0x44332211);
    }

    #[test]
    fn test_bios_mirroring() {
        let mut bios = vec![0u8; Bus::BIOS_SIZE];
        bios[0x100] = 0xAA;

        let mut bus = Bus::new();
        bus.set_bios(bios).unwrap();

        // The BIOS decode masks the low 20 bits into the 512 KiB store
        assert_eq!(bus.load_byte(0x1FC00100), 0xAA);
    }

    #[test]
    fn test_unknown_region_sentinels() {
        let mut bus = Bus::new();

        assert_eq!(bus.load_word(0x1F801000), 0xFFFFFFFF);
        assert_eq!(bus.load_byte(0x1F801000), 0xFF);

        // Dropped without panicking
        bus.store_word(0x1F801000, 0x12345678);
        bus.store_half(0x1F801000, 0x1234);
        bus.store_byte(0x1F801000, 0x12);
    }

    #[test]
    fn test_with_ram_size_validation() {
        assert!(Bus::with_ram(vec![0u8; Bus::RAM_SIZE]).is_ok());
        assert!(matches!(
            Bus::with_ram(vec![0u8; 1024]),
            Err(EmulatorError::InvalidRamSize { .. })
        ));
    }

    #[test]
    fn test_set_bios_size_validation() {
        let mut bus = Bus::new();

        assert!(bus.set_bios(vec![0u8; Bus::BIOS_SIZE]).is_ok());
        assert!(matches!(
            bus.set_bios(vec![0u8; Bus::BIOS_SIZE - 1]),
            Err(EmulatorError::InvalidBiosSize { .. })
        ));
    }

    #[test]
    fn test_load_bios_from_file() {
        use std::io::Write;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        let mut image = vec![0u8; Bus::BIOS_SIZE];
        image[..4].copy_from_slice(&0x3C080013u32.to_le_bytes());
        file.write_all(&image).unwrap();

        let mut bus = Bus::new();
        bus.load_bios(file.path().to_str().unwrap()).unwrap();
        assert_eq!(bus.load_word(0x1FC00000), 0x3C080013);
    }

    #[test]
    fn test_load_bios_rejects_short_file() {
        use std::io::Write;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&[0u8; 1024]).unwrap();

        let mut bus = Bus::new();
        assert!(bus
            .load_bios(file.path().to_str().unwrap())
            .is_err());
    }
}
