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

use bitflags::bitflags;
use std::fmt;

/// Coprocessor-0 control register indices
///
/// Only SR is behaviourally interpreted (bit 16, isolate-cache); the rest
/// are plain storage for MTC0/MFC0 traffic and named for the disassembler
/// and hosts.
pub mod cp0_reg {
    pub const INDEX: usize = 0;
    pub const RANDOM: usize = 1;
    pub const ENTRY_LO: usize = 2;
    pub const BPC: usize = 3;
    pub const CONTEXT: usize = 4;
    pub const BDA: usize = 5;
    pub const TAR: usize = 6;
    pub const DCIC: usize = 7;
    pub const BAD_A: usize = 8;
    pub const BDAM: usize = 9;
    pub const ENTRY_HI: usize = 10;
    pub const BPCM: usize = 11;
    pub const SR: usize = 12;
    pub const CAUSE: usize = 13;
    pub const EPC: usize = 14;
    pub const PRID: usize = 15;
}

/// Coprocessor 0 (System Control)
///
/// Holds the 32 control registers. Only SR bit 16 (IsC, isolate-cache) is
/// behaviourally interpreted by the interpreter: while it is set,
/// store-word operations are suppressed.
pub(super) struct COP0 {
    /// COP0 registers (32 registers)
    pub(super) regs: [u32; 32],
}

impl COP0 {
    /// SR bit 16: isolate cache; word stores bypass the main bus while set
    pub const SR_ISC: u32 = 1 << 16;

    pub(super) fn new() -> Self {
        Self { regs: [0u32; 32] }
    }

    /// Reset all control registers to zero
    pub(super) fn reset(&mut self) {
        self.regs = [0u32; 32];
    }

    /// Check whether the isolate-cache bit is set
    pub(super) fn cache_isolated(&self) -> bool {
        self.regs[cp0_reg::SR] & Self::SR_ISC != 0
    }
}

/// Architectural exception codes
///
/// Values match the ExcCode field of the CAUSE register. Only
/// `ReservedInstruction` is ever raised by the interpreter; the others
/// exist so hosts can arm [`ExcHalt`] bits ahead of time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum Exception {
    /// Interrupt (external or internal)
    Interrupt = 0,
    /// Address error on load
    AddressErrorLoad = 4,
    /// Address error on store
    AddressErrorStore = 5,
    /// Bus error on instruction fetch
    BusErrorInstruction = 6,
    /// Bus error on data access
    BusErrorData = 7,
    /// Syscall instruction executed
    Syscall = 8,
    /// Breakpoint instruction executed
    Breakpoint = 9,
    /// Reserved or illegal instruction
    ReservedInstruction = 10,
    /// Coprocessor unusable
    CoprocessorUnusable = 11,
    /// Arithmetic overflow
    Overflow = 12,
}

impl fmt::Display for Exception {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Exception::Interrupt => "Interrupt",
            Exception::AddressErrorLoad => "Address error (load)",
            Exception::AddressErrorStore => "Address error (store)",
            Exception::BusErrorInstruction => "Bus error (instruction)",
            Exception::BusErrorData => "Bus error (data)",
            Exception::Syscall => "Syscall",
            Exception::Breakpoint => "Breakpoint",
            Exception::ReservedInstruction => "Reserved instruction",
            Exception::CoprocessorUnusable => "Coprocessor unusable",
            Exception::Overflow => "Arithmetic overflow",
        };
        f.write_str(name)
    }
}

bitflags! {
    /// Per-exception halt mask
    ///
    /// A raised exception whose bit is set here is reported through an
    /// error-level log; whether that halts execution is host policy (the
    /// debugger front-end treats error-level records as fatal). Exceptions
    /// whose bits are clear are swallowed, which is what test programs
    /// probing the implementation want.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct ExcHalt: u16 {
        const INTERRUPT = 1 << 0;
        const ADDRESS_ERROR_LOAD = 1 << 4;
        const ADDRESS_ERROR_STORE = 1 << 5;
        const BUS_ERROR_INSTRUCTION = 1 << 6;
        const BUS_ERROR_DATA = 1 << 7;
        const SYSCALL = 1 << 8;
        const BREAKPOINT = 1 << 9;
        const RESERVED_INSTRUCTION = 1 << 10;
        const COPROCESSOR_UNUSABLE = 1 << 11;
        const OVERFLOW = 1 << 12;
    }
}

impl ExcHalt {
    /// The halt bit corresponding to an exception code
    pub fn from_exception(exc: Exception) -> Self {
        Self::from_bits_truncate(1 << (exc as u32))
    }
}
