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

//! Error types for the emulator core
//!
//! The interpreter itself never fails: bus anomalies are reported through
//! warning logs and sentinel values. These errors cover the fallible
//! boundaries of the crate: file loading, image validation, and config
//! parsing.

use thiserror::Error;

/// Emulator error type
#[derive(Error, Debug)]
pub enum EmulatorError {
    /// Underlying I/O failure (BIOS/EXE/trace file access)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// BIOS image is not exactly 512 KiB
    #[error("invalid BIOS image: expected {expected} bytes, got {actual}")]
    InvalidBiosSize { expected: usize, actual: usize },

    /// Caller-provided RAM buffer is not exactly 2 MiB
    #[error("invalid RAM buffer: expected {expected} bytes, got {actual}")]
    InvalidRamSize { expected: usize, actual: usize },

    /// PS-X EXE validation failure
    #[error("invalid PS-X EXE: {0}")]
    InvalidExe(String),

    /// Configuration file could not be parsed
    #[error("invalid config: {0}")]
    InvalidConfig(String),
}

/// Result type alias for emulator operations
pub type Result<T> = std::result::Result<T, EmulatorError>;
