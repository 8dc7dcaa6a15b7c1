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

//! Memory region identification and address translation
//!
//! The PSX folds its MIPS segments (KUSEG, KSEG0, KSEG1 and their mirrors)
//! onto a single 512 MiB physical window; no TLB is involved. KSEG2 is not
//! accessed by the programs of interest.

use super::Bus;

/// Memory region identification
///
/// Identifies which physical region a (translated) address belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryRegion {
    /// Main RAM (2MB)
    RAM,
    /// BIOS ROM (512KB)
    BIOS,
    /// Unmapped region
    Unmapped,
}

/// Translate a virtual address to a physical address
///
/// Masking the upper 3 bits handles KUSEG, KSEG0, and KSEG1 all at once:
/// 0xBFC00000 (the reset vector in KSEG1) maps to physical 0x1FC00000.
#[inline(always)]
pub fn translate_address(vaddr: u32) -> u32 {
    vaddr & 0x1FFF_FFFF
}

impl Bus {
    /// Identify the memory region a physical address falls in
    ///
    /// # Example
    ///
    /// ```
    /// use psxcore::core::memory::{translate_address, Bus, MemoryRegion};
    ///
    /// let bus = Bus::new();
    /// assert_eq!(bus.identify_region(0x00000000), MemoryRegion::RAM);
    /// assert_eq!(bus.identify_region(translate_address(0xBFC00000)), MemoryRegion::BIOS);
    /// assert_eq!(bus.identify_region(0x1F801000), MemoryRegion::Unmapped);
    /// ```
    pub fn identify_region(&self, paddr: u32) -> MemoryRegion {
        if (Self::RAM_START..=Self::RAM_END).contains(&paddr) {
            MemoryRegion::RAM
        } else if (Self::BIOS_START..=Self::BIOS_END).contains(&paddr) {
            MemoryRegion::BIOS
        } else {
            MemoryRegion::Unmapped
        }
    }
}
