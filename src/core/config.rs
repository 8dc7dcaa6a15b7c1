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

//! Debugger configuration
//!
//! TOML configuration consumed by the front-end; command-line flags take
//! precedence over values loaded here. Every field has a default, so a
//! partial (or missing) file is fine:
//!
//! ```toml
//! bios = "SCPH1001.BIN"
//! exe = "demo.exe"
//! trace_file = "trace.log"
//! halt_on_reserved_instruction = true
//! ```

use crate::core::cpu::ExcHalt;
use crate::core::error::{EmulatorError, Result};
use serde::Deserialize;

/// Front-end configuration with serde defaults
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Path to the BIOS ROM image
    pub bios: Option<String>,

    /// PS-X EXE to side-load once the BIOS hands off
    pub exe: Option<String>,

    /// Write the execution trace to this file as well as stdout
    pub trace_file: Option<String>,

    /// Treat a raised Reserved Instruction exception as fatal
    pub halt_on_reserved_instruction: bool,

    /// Treat a raised Breakpoint exception as fatal
    pub halt_on_breakpoint: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bios: None,
            exe: None,
            trace_file: None,
            halt_on_reserved_instruction: true,
            halt_on_breakpoint: false,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a TOML string
    pub fn parse(contents: &str) -> Result<Self> {
        toml::from_str(contents).map_err(|e| EmulatorError::InvalidConfig(e.to_string()))
    }

    /// The exception-halt mask the settings describe
    pub fn exc_halt(&self) -> ExcHalt {
        let mut mask = ExcHalt::empty();
        if self.halt_on_reserved_instruction {
            mask |= ExcHalt::RESERVED_INSTRUCTION;
        }
        if self.halt_on_breakpoint {
            mask |= ExcHalt::BREAKPOINT;
        }
        mask
    }
}
