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

//! psxcore debugger entry point
//!
//! Boots the interpreter from a BIOS image and steps indefinitely,
//! printing one disassembly line per instruction. Error-level log records
//! (raised, armed exceptions) halt execution after a full register dump,
//! matching the core's contract that error semantics are host policy.

use clap::Parser;
use log::{Level, LevelFilter, Log, Metadata, Record};
use psxcore::core::config::Config;
use psxcore::core::cpu::{CpuTracer, GPR_NAMES};
use psxcore::core::system::System;
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};

/// Latched by the logger when an error-level record passes through, so
/// the step loop can halt with the machine state still intact
static ERROR_RAISED: AtomicBool = AtomicBool::new(false);

/// Forwards to env_logger, latching error-level records
struct HaltOnErrorLogger {
    inner: env_logger::Logger,
}

impl Log for HaltOnErrorLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        self.inner.enabled(metadata)
    }

    fn log(&self, record: &Record) {
        if record.level() == Level::Error {
            ERROR_RAISED.store(true, Ordering::Relaxed);
        }
        self.inner.log(record);
    }

    fn flush(&self) {
        self.inner.flush()
    }
}

/// PSX CPU debugger: boots a BIOS image and prints one disassembly line
/// per executed instruction
#[derive(Parser)]
#[command(name = "psxcore-dbg", version)]
struct Args {
    /// Path to the BIOS ROM image (512 KiB)
    bios: Option<String>,

    /// PS-X EXE to side-load once the BIOS hands off
    #[arg(long)]
    exe: Option<String>,

    /// TOML configuration file (flags take precedence)
    #[arg(long)]
    config: Option<String>,

    /// Also write the trace to this file
    #[arg(long)]
    trace: Option<String>,

    /// Stop after this many instructions instead of running forever
    #[arg(long)]
    steps: Option<u64>,
}

fn install_logger() {
    let inner = env_logger::Builder::from_default_env()
        .filter_level(LevelFilter::Info)
        .build();
    let max_level = inner.filter();

    if log::set_boxed_logger(Box::new(HaltOnErrorLogger { inner })).is_ok() {
        log::set_max_level(max_level);
    }
}

/// Dump the architectural state after a fatal error, then leave the
/// last-traced line for context
fn dump_registers(system: &System) {
    eprintln!(
        "Last instruction: 0x{:08X}\t 0x{:08X}\t {}",
        system.disasm_pc(),
        system.disasm_instr_word(),
        system.disasm_result()
    );

    eprintln!("=============== CPU registers ===============");
    for (i, name) in GPR_NAMES.iter().enumerate() {
        eprintln!("[{}] = 0x{:08X}", name, system.cpu().reg(i));
    }
    eprintln!("PC  = 0x{:08X}  NPC = 0x{:08X}", system.cpu().pc(), system.cpu().npc());
    eprintln!("HI  = 0x{:08X}  LO  = 0x{:08X}", system.cpu().hi(), system.cpu().lo());
    eprintln!("Emulation halted.");
}

fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => match Config::load(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Error reading config file {}: {}", path, e);
                return ExitCode::FAILURE;
            }
        },
        None => Config::default(),
    };

    install_logger();

    let Some(bios_path) = args.bios.or(config.bios.clone()) else {
        eprintln!("psxcore-dbg: Missing required argument.");
        eprintln!("Syntax: psxcore-dbg [bios_file]");
        return ExitCode::FAILURE;
    };

    let mut system = System::new();

    if let Err(e) = system.load_bios(&bios_path) {
        eprintln!("Error reading BIOS file {}: {}", bios_path, e);
        return ExitCode::FAILURE;
    }

    system.cpu_mut().set_exc_halt(config.exc_halt());
    system.reset();

    if let Some(exe_path) = args.exe.or(config.exe.clone()) {
        let data = match std::fs::read(&exe_path) {
            Ok(data) => data,
            Err(e) => {
                eprintln!("Error reading EXE file {}: {}", exe_path, e);
                return ExitCode::FAILURE;
            }
        };
        if let Err(e) = system.run_psx_exe(data) {
            eprintln!("Error loading EXE file {}: {}", exe_path, e);
            return ExitCode::FAILURE;
        }
    }

    let mut tracer = match args.trace.or(config.trace_file.clone()) {
        Some(path) => match CpuTracer::new(&path) {
            Ok(tracer) => Some(tracer),
            Err(e) => {
                eprintln!("Error creating trace file {}: {}", path, e);
                return ExitCode::FAILURE;
            }
        },
        None => None,
    };

    let mut executed: u64 = 0;
    loop {
        system.disasm_instr();
        system.step();
        system.disasm_trace();

        println!(
            "0x{:08X}\t 0x{:08X}\t {}",
            system.disasm_pc(),
            system.disasm_instr_word(),
            system.disasm_result()
        );

        if let Some(ref mut tracer) = tracer {
            if let Err(e) = tracer.trace(system.disassembler()) {
                eprintln!("Error writing trace: {}", e);
                return ExitCode::FAILURE;
            }
        }

        if ERROR_RAISED.load(Ordering::Relaxed) {
            dump_registers(&system);
            return ExitCode::FAILURE;
        }

        executed += 1;
        if args.steps.is_some_and(|limit| executed >= limit) {
            if let Some(ref mut tracer) = tracer {
                let _ = tracer.flush();
            }
            return ExitCode::SUCCESS;
        }
    }
}
