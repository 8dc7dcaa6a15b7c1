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

//! System integration
//!
//! Ties the CPU, memory bus and disassembler together and drives
//! single-step execution, including the PS-X EXE side-load: a queued
//! executable is injected the moment the BIOS finishes its own
//! initialisation and jumps to the hand-off address.

use super::cpu::{gpr, Disassembler, CPU};
use super::error::Result;
use super::loader::PsxExe;
use super::memory::{translate_address, Bus};

/// PlayStation system
///
/// Owns exactly one CPU, one bus and one disassembler, and survives
/// across step invocations.
///
/// # Example
/// ```no_run
/// use psxcore::core::system::System;
///
/// let mut system = System::new();
/// system.load_bios("SCPH1001.BIN")?;
/// system.reset();
/// system.step_n(100);
/// # Ok::<(), psxcore::EmulatorError>(())
/// ```
pub struct System {
    /// CPU instance
    cpu: CPU,
    /// Memory bus
    bus: Bus,
    /// Trace disassembler
    disasm: Disassembler,
    /// Executable queued for injection at the BIOS hand-off point
    pending_exe: Option<PsxExe>,
}

impl System {
    /// The PC at which the BIOS has finished its own initialisation and
    /// jumps to the loaded executable; a queued PS-X EXE is injected when
    /// execution reaches it
    pub const EXE_INJECT_ADDR: u32 = 0x80030000;

    /// Create a System with freshly allocated RAM
    pub fn new() -> Self {
        Self {
            cpu: CPU::new(),
            bus: Bus::new(),
            disasm: Disassembler::new(),
            pending_exe: None,
        }
    }

    /// Create a System around a caller-provided 2 MiB RAM buffer
    ///
    /// # Errors
    ///
    /// [`crate::EmulatorError::InvalidRamSize`] if the buffer has the
    /// wrong length.
    pub fn with_ram(ram: Vec<u8>) -> Result<Self> {
        Ok(Self {
            cpu: CPU::new(),
            bus: Bus::with_ram(ram)?,
            disasm: Disassembler::new(),
            pending_exe: None,
        })
    }

    /// Load a BIOS image (exactly 512 KiB) from a file
    pub fn load_bios(&mut self, path: &str) -> Result<()> {
        self.bus.load_bios(path)
    }

    /// Reset the system as if power-cycled
    ///
    /// RAM and BIOS contents are preserved; the CPU restarts at the reset
    /// vector with the first BIOS instruction prefetched.
    pub fn reset(&mut self) {
        self.cpu.reset(&self.bus);
        log::info!("System reset!");
    }

    /// Execute one instruction
    ///
    /// If an executable is queued and the CPU has reached the BIOS
    /// hand-off address, the image is injected before the next step.
    pub fn step(&mut self) {
        self.cpu.step(&mut self.bus);

        if self.pending_exe.is_some() && self.cpu.pc() == Self::EXE_INJECT_ADDR {
            self.inject_exe();
        }
    }

    /// Execute `n` instructions
    pub fn step_n(&mut self, n: usize) {
        for _ in 0..n {
            self.step();
        }
    }

    /// Validate an executable image and queue it for injection
    ///
    /// Resets the system so the BIOS boots from scratch; the image is
    /// injected once execution reaches [`Self::EXE_INJECT_ADDR`].
    ///
    /// # Errors
    ///
    /// [`crate::EmulatorError::InvalidExe`] if validation fails; the
    /// system state is untouched in that case.
    pub fn run_psx_exe(&mut self, data: Vec<u8>) -> Result<()> {
        let exe = PsxExe::parse(data)?;

        self.reset();
        self.pending_exe = Some(exe);

        log::info!("PS-X EXE will be injected!");
        Ok(())
    }

    /// Whether an executable is still queued for injection
    pub fn exe_pending(&self) -> bool {
        self.pending_exe.is_some()
    }

    /// Patch the queued executable into RAM and redirect the CPU to it
    fn inject_exe(&mut self) {
        let Some(exe) = self.pending_exe.take() else {
            return;
        };

        log::info!(
            "Injecting PS-X EXE at 0x{:08X} (len={} bytes)",
            exe.dest(),
            exe.size()
        );

        let dest = translate_address(exe.dest()) as usize;
        let payload = exe.payload();
        self.bus.ram_mut()[dest..dest + payload.len()].copy_from_slice(payload);

        self.cpu.set_pc(exe.pc(), &self.bus);
        self.cpu.set_reg(gpr::GP, exe.gp());

        // sp is only touched for a non-zero base; fp is written
        // unconditionally, a quirk preserved for compatibility
        let sp_fp = exe.sp_fp_base().wrapping_add(exe.sp_fp_offs());
        if exe.sp_fp_base() != 0 {
            self.cpu.set_reg(gpr::SP, sp_fp);
        }
        self.cpu.set_reg(gpr::FP, sp_fp);
    }

    /// Disassemble the instruction the next step will execute
    pub fn disasm_instr(&mut self) {
        self.disasm.disasm_instr(self.cpu.instr(), self.cpu.pc());
    }

    /// Expand the recorded comments against the current CPU state
    ///
    /// Call after [`Self::step`] so the comments show post-execution
    /// values.
    pub fn disasm_trace(&mut self) {
        self.disasm.disasm_trace(&self.cpu);
    }

    /// The current disassembly line
    pub fn disasm_result(&self) -> &str {
        self.disasm.result()
    }

    /// The disassembler's recorded PC
    pub fn disasm_pc(&self) -> u32 {
        self.disasm.pc()
    }

    /// The disassembler's recorded instruction word
    pub fn disasm_instr_word(&self) -> u32 {
        self.disasm.instr()
    }

    /// Get reference to the disassembler
    pub fn disassembler(&self) -> &Disassembler {
        &self.disasm
    }

    /// Get reference to the CPU
    pub fn cpu(&self) -> &CPU {
        &self.cpu
    }

    /// Get mutable reference to the CPU
    pub fn cpu_mut(&mut self) -> &mut CPU {
        &mut self.cpu
    }

    /// Get reference to the bus
    pub fn bus(&self) -> &Bus {
        &self.bus
    }

    /// Get mutable reference to the bus
    pub fn bus_mut(&mut self) -> &mut Bus {
        &mut self.bus
    }
}

impl Default for System {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::loader::HEADER_SIZE;

    /// BIOS image with `words` at the reset vector
    fn bios_image(words: &[u32]) -> Vec<u8> {
        let mut image = vec![0u8; Bus::BIOS_SIZE];
        for (i, word) in words.iter().enumerate() {
            image[i * 4..i * 4 + 4].copy_from_slice(&word.to_le_bytes());
        }
        image
    }

    fn system_with_bios(words: &[u32]) -> System {
        let mut system = System::new();
        system.bus_mut().set_bios(bios_image(words)).unwrap();
        system.reset();
        system
    }

    /// A minimal EXE: magic, pc/dest/size header fields, payload
    fn exe_image(pc: u32, dest: u32, payload: &[u32]) -> Vec<u8> {
        let mut data = vec![0u8; HEADER_SIZE + payload.len() * 4];
        data[..8].copy_from_slice(b"PS-X EXE");
        data[0x10..0x14].copy_from_slice(&pc.to_le_bytes());
        data[0x18..0x1C].copy_from_slice(&dest.to_le_bytes());
        data[0x1C..0x20].copy_from_slice(&((payload.len() * 4) as u32).to_le_bytes());
        for (i, word) in payload.iter().enumerate() {
            let off = HEADER_SIZE + i * 4;
            data[off..off + 4].copy_from_slice(&word.to_le_bytes());
        }
        data
    }

    #[test]
    fn test_lui_ori_builds_constant() {
        // lui v0,0xDEAD ; ori v0,v0,0xBEEF
        let mut system = system_with_bios(&[0x3C02DEAD, 0x3442BEEF]);

        system.step_n(2);
        assert_eq!(system.cpu().reg(2), 0xDEADBEEF);
    }

    #[test]
    fn test_gpr_zero_reads_zero_after_steps() {
        // ori zero,zero,0xFFFF tries to dirty the slot
        let mut system = system_with_bios(&[0x3400FFFF, 0]);

        system.step_n(2);
        assert_eq!(system.cpu().reg(0), 0);
    }

    #[test]
    fn test_exe_injection_at_handoff() {
        // BIOS stub jumps straight to the hand-off address:
        // lui t0,0x8003 ; jr t0 ; nop
        let mut system = system_with_bios(&[0x3C088003, 0x01000008, 0]);

        let payload = [0x3C02DEAD, 0x3442BEEF]; // lui/ori pair
        system
            .run_psx_exe(exe_image(0x80010000, 0x80010000, &payload))
            .unwrap();
        assert!(system.exe_pending());

        // lui, jr, delay slot; the step landing on 0x80030000 injects
        system.step_n(3);

        assert!(!system.exe_pending(), "pending handle must be cleared");
        assert_eq!(system.cpu().pc(), 0x80010000);
        assert_eq!(
            system.cpu().instr(),
            0x3C02DEAD,
            "first payload word must be prefetched"
        );
        assert_eq!(system.bus().load_word(0x00010000), 0x3C02DEAD);
        assert_eq!(system.bus().load_word(0x00010004), 0x3442BEEF);

        // The injected program then runs normally
        system.step_n(2);
        assert_eq!(system.cpu().reg(2), 0xDEADBEEF);
    }

    #[test]
    fn test_exe_injection_sets_gp_sp_fp() {
        let mut system = system_with_bios(&[0x3C088003, 0x01000008, 0]);

        let mut data = exe_image(0x80010000, 0x80010000, &[0]);
        data[0x14..0x18].copy_from_slice(&0x80020000u32.to_le_bytes()); // gp
        data[0x30..0x34].copy_from_slice(&0x801FFF00u32.to_le_bytes()); // sp/fp base
        data[0x34..0x38].copy_from_slice(&0x00000100u32.to_le_bytes()); // sp/fp offs
        system.run_psx_exe(data).unwrap();

        system.step_n(3);
        assert_eq!(system.cpu().reg(gpr::GP), 0x80020000);
        assert_eq!(system.cpu().reg(gpr::SP), 0x80200000);
        assert_eq!(system.cpu().reg(gpr::FP), 0x80200000);
    }

    #[test]
    fn test_exe_injection_zero_base_leaves_sp_writes_fp() {
        let mut system = system_with_bios(&[0x3C088003, 0x01000008, 0]);

        let mut data = exe_image(0x80010000, 0x80010000, &[0]);
        data[0x34..0x38].copy_from_slice(&0x00000100u32.to_le_bytes()); // offs only
        system.run_psx_exe(data).unwrap();

        system.step_n(3);
        assert_eq!(system.cpu().reg(gpr::SP), 0, "sp untouched for zero base");
        assert_eq!(
            system.cpu().reg(gpr::FP),
            0x00000100,
            "fp written unconditionally"
        );
    }

    #[test]
    fn test_run_psx_exe_rejects_invalid_image() {
        let mut system = system_with_bios(&[0]);
        assert!(system.run_psx_exe(vec![0u8; 16]).is_err());
        assert!(!system.exe_pending());
    }

    #[test]
    fn test_no_injection_without_pending_exe() {
        // Reaching the hand-off address without a queued EXE is ordinary
        let mut system = system_with_bios(&[0x3C088003, 0x01000008, 0]);

        system.step_n(3);
        assert_eq!(system.cpu().pc(), System::EXE_INJECT_ADDR);
    }

    #[test]
    fn test_disasm_round_trip_through_step() {
        // lui at,0x1234
        let mut system = system_with_bios(&[0x3C011234, 0]);

        system.disasm_instr();
        system.step();
        system.disasm_trace();

        assert_eq!(system.disasm_pc(), 0xBFC00000);
        assert_eq!(system.disasm_instr_word(), 0x3C011234);
        assert!(
            system.disasm_result().starts_with("lui at,0x1234"),
            "line: {}",
            system.disasm_result()
        );
        assert!(
            system.disasm_result().ends_with("; at=0x12340000"),
            "line: {}",
            system.disasm_result()
        );
    }
}
