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

//! psxcore: a PlayStation (PSX) CPU interpreter and debugger core
//!
//! This crate implements the PSX's MIPS R3000A derivative (the LR33300)
//! as a single-stepped interpreter, together with the physical address bus
//! needed to fetch instructions and perform loads/stores against BIOS ROM
//! and main RAM, a tracing disassembler, and a PS-X EXE side-loader.
//!
//! # Architecture
//!
//! - [`core::cpu`]: MIPS R3000A CPU interpreter and disassembler
//! - [`core::memory`]: Memory bus and address translation
//! - [`core::system`]: System integration (CPU + bus + disassembler + EXE loader)
//! - [`core::loader`]: PS-X EXE container parsing
//! - [`core::config`]: TOML configuration for the debugger front-end
//!
//! # Example
//!
//! ```no_run
//! use psxcore::core::system::System;
//!
//! let mut system = System::new();
//! system.load_bios("path/to/bios.bin")?;
//! system.reset();
//!
//! // Step one instruction, tracing it as we go.
//! system.disasm_instr();
//! system.step();
//! system.disasm_trace();
//! println!("{}", system.disasm_result());
//! # Ok::<(), psxcore::EmulatorError>(())
//! ```
//!
//! # Error Handling
//!
//! The instruction/bus hot path is infallible: bus anomalies produce
//! sentinel values and warning logs rather than errors. Fallible
//! operations (BIOS loading, PS-X EXE validation, config parsing) return
//! [`core::error::Result<T>`], an alias for `Result<T, EmulatorError>`.

pub mod core;

// Re-export commonly used types
pub use core::error::{EmulatorError, Result};
