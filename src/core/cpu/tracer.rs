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

//! CPU execution tracer
//!
//! Records the per-step disassembly lines to a file in the same format the
//! debugger front-end prints to stdout.

use super::Disassembler;
use crate::core::error::Result;
use std::fs::File;
use std::io::{BufWriter, Write};

/// Buffered trace-file writer
///
/// Each line records the traced instruction's address, its raw encoding,
/// and the disassembly (including any resolved comments):
///
/// ```text
/// 0xBFC00000	 0x3C080013	 lui t0,0x0013                      ; t0=0x00130000
/// ```
pub struct CpuTracer {
    output: BufWriter<File>,
}

impl CpuTracer {
    /// Create a tracer writing to `path`, truncating any existing file
    pub fn new(path: &str) -> Result<Self> {
        let output = BufWriter::new(File::create(path)?);
        Ok(Self { output })
    }

    /// Write one trace line from the disassembler's current state
    ///
    /// Call after `disasm_instr`/`step`/`disasm_trace` so the line carries
    /// the post-step comments.
    pub fn trace(&mut self, disasm: &Disassembler) -> Result<()> {
        writeln!(
            self.output,
            "0x{:08X}\t 0x{:08X}\t {}",
            disasm.pc(),
            disasm.instr(),
            disasm.result()
        )?;
        Ok(())
    }

    /// Flush buffered lines to disk
    pub fn flush(&mut self) -> Result<()> {
        self.output.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trace_line_format() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trace.log");
        let path = path.to_str().unwrap();

        let mut disasm = Disassembler::new();
        disasm.disasm_instr(0x03E00008, 0x80001000); // jr ra

        let mut tracer = CpuTracer::new(path).unwrap();
        tracer.trace(&disasm).unwrap();
        tracer.flush().unwrap();
        drop(tracer);

        let contents = std::fs::read_to_string(path).unwrap();
        assert_eq!(contents, "0x80001000\t 0x03E00008\t jr ra\n");
    }
}
