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

//! PS-X EXE container parsing
//!
//! The PlayStation's executable format: a 2 KiB header followed by a flat
//! payload. Little-endian 32-bit header fields at fixed offsets describe
//! the entry point, initial GP, destination address and payload size.

use crate::core::error::{EmulatorError, Result};
use crate::core::memory::{translate_address, Bus};

/// Header magic at offset 0; the byte at offset 8 is not compared (files
/// in the wild carry either a NUL or a space there)
const MAGIC: &[u8; 8] = b"PS-X EXE";

/// Size of the header block preceding the payload
pub const HEADER_SIZE: usize = 0x800;

const OFFSET_PC: usize = 0x10;
const OFFSET_GP: usize = 0x14;
const OFFSET_DEST: usize = 0x18;
const OFFSET_SIZE: usize = 0x1C;
const OFFSET_SP_FP_BASE: usize = 0x30;
const OFFSET_SP_FP_OFFS: usize = 0x34;

/// A validated PS-X EXE image
///
/// # Example
/// ```
/// use psxcore::core::loader::{PsxExe, HEADER_SIZE};
///
/// let mut image = vec![0u8; HEADER_SIZE + 0x100];
/// image[..8].copy_from_slice(b"PS-X EXE");
/// image[0x10..0x14].copy_from_slice(&0x80010000u32.to_le_bytes()); // pc
/// image[0x18..0x1C].copy_from_slice(&0x80010000u32.to_le_bytes()); // dest
/// image[0x1C..0x20].copy_from_slice(&0x100u32.to_le_bytes());      // size
///
/// let exe = PsxExe::parse(image).unwrap();
/// assert_eq!(exe.pc(), 0x80010000);
/// assert_eq!(exe.size(), 0x100);
/// ```
pub struct PsxExe {
    data: Vec<u8>,
}

impl PsxExe {
    /// Validate and take ownership of a PS-X EXE image
    ///
    /// Checks, in order: the image is at least one header long, the magic
    /// matches, the header `size` field equals the length of the data
    /// after the header, and the payload fits inside RAM at its translated
    /// destination (so injection can never write out of bounds).
    ///
    /// # Errors
    ///
    /// [`EmulatorError::InvalidExe`] describing the first failed check.
    pub fn parse(data: Vec<u8>) -> Result<Self> {
        if data.len() < HEADER_SIZE {
            return Err(EmulatorError::InvalidExe(format!(
                "image too short: {} bytes, header is {} bytes",
                data.len(),
                HEADER_SIZE
            )));
        }

        if &data[..MAGIC.len()] != MAGIC {
            return Err(EmulatorError::InvalidExe("bad magic".into()));
        }

        let exe = Self { data };
        let size = exe.size() as usize;

        if size != exe.data.len() - HEADER_SIZE {
            return Err(EmulatorError::InvalidExe(format!(
                "header size field {} does not match payload length {}",
                size,
                exe.data.len() - HEADER_SIZE
            )));
        }

        let dest = translate_address(exe.dest()) as usize;
        if dest.checked_add(size).is_none_or(|end| end > Bus::RAM_SIZE) {
            return Err(EmulatorError::InvalidExe(format!(
                "payload of {} bytes at 0x{:08X} overruns RAM",
                size,
                exe.dest()
            )));
        }

        Ok(exe)
    }

    fn word(&self, offset: usize) -> u32 {
        u32::from_le_bytes([
            self.data[offset],
            self.data[offset + 1],
            self.data[offset + 2],
            self.data[offset + 3],
        ])
    }

    /// Initial program counter
    pub fn pc(&self) -> u32 {
        self.word(OFFSET_PC)
    }

    /// Initial global pointer
    pub fn gp(&self) -> u32 {
        self.word(OFFSET_GP)
    }

    /// Destination virtual address for the payload
    pub fn dest(&self) -> u32 {
        self.word(OFFSET_DEST)
    }

    /// Payload size in bytes
    pub fn size(&self) -> u32 {
        self.word(OFFSET_SIZE)
    }

    /// SP/FP base; zero means "leave sp alone"
    pub fn sp_fp_base(&self) -> u32 {
        self.word(OFFSET_SP_FP_BASE)
    }

    /// SP/FP offset, added to the base
    pub fn sp_fp_offs(&self) -> u32 {
        self.word(OFFSET_SP_FP_OFFS)
    }

    /// The payload bytes following the header
    pub fn payload(&self) -> &[u8] {
        &self.data[HEADER_SIZE..]
    }
}
