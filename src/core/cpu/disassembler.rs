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

//! MIPS instruction disassembler
//!
//! Renders one instruction word to its canonical trace form. Formatting an
//! instruction records deferred "comments" (affected registers, resolved
//! branch/jump targets, effective physical addresses) which
//! [`Disassembler::disasm_trace`] expands against the current CPU state
//! after the step, aligned to a fixed column:
//!
//! ```text
//! lui ra,0xDEAD                      ; ra=0xDEAD0000
//! sw v0,0x0000(s0)                   ; paddr=0x00010000
//! ```
//!
//! The full COP2 (GTE) operation set is decoded textually even though the
//! interpreter does not execute it.

use super::{decode, CPU};
use crate::core::memory::translate_address;
use std::fmt::Write;

/// Standard MIPS assembler mnemonics for the general purpose registers
pub const GPR_NAMES: [&str; 32] = [
    "zero", "at", "v0", "v1", "a0", "a1", "a2", "a3", "t0", "t1", "t2", "t3", "t4", "t5", "t6",
    "t7", "s0", "s1", "s2", "s3", "s4", "s5", "s6", "s7", "t8", "t9", "k0", "k1", "gp", "sp",
    "fp", "ra",
];

/// Coprocessor-0 control register names; slots 16..31 have no
/// architectural name
pub const CP0_REG_NAMES: [&str; 32] = [
    "C0_Index", "C0_Random", "C0_EntryLo", "C0_BPC", "C0_Context", "C0_BDA", "C0_TAR", "C0_DCIC",
    "C0_BadA", "C0_BDAM", "C0_EntryHi", "C0_BPCM", "C0_SR", "C0_Cause", "C0_EPC", "C0_PRId",
    "C0_REG16", "C0_REG17", "C0_REG18", "C0_REG19", "C0_REG20", "C0_REG21", "C0_REG22",
    "C0_REG23", "C0_REG24", "C0_REG25", "C0_REG26", "C0_REG27", "C0_REG28", "C0_REG29",
    "C0_REG30", "C0_REG31",
];

/// Coprocessor-2 (GTE) data register names
pub const CP2_DATA_REG_NAMES: [&str; 32] = [
    "C2_VXY0", "C2_VZ0", "C2_VXY1", "C2_VZ1", "C2_VXY2", "C2_VZ2", "C2_RGB", "C2_OTZ", "C2_IR0",
    "C2_IR1", "C2_IR2", "C2_IR3", "C2_SXY0", "C2_SXY1", "C2_SXY2", "C2_SXYP", "C2_SZ0", "C2_SZ1",
    "C2_SZ2", "C2_SZ3", "C2_RGB0", "C2_RGB1", "C2_RGB2", "C2_RES1", "C2_MAC0", "C2_MAC1",
    "C2_MAC2", "C2_MAC3", "C2_IRGB", "C2_ORGB", "C2_LZCS", "C2_LZCR",
];

/// Coprocessor-2 (GTE) control register names (pair-packed matrix rows)
pub const CP2_CTRL_REG_NAMES: [&str; 32] = [
    "C2_R11R12", "C2_R13R21", "C2_R22R23", "C2_R31R32", "C2_R33", "C2_TRX", "C2_TRY", "C2_TRZ",
    "C2_L11L12", "C2_L13L21", "C2_L22L23", "C2_L31L32", "C2_L33", "C2_RBK", "C2_GBK", "C2_BBK",
    "C2_LR1LR2", "C2_LR3LG1", "C2_LG2LG3", "C2_LB1LB2", "C2_LB3", "C2_RFC", "C2_GFC", "C2_BFC",
    "C2_OFX", "C2_OFY", "C2_H", "C2_DQA", "C2_DQB", "C2_ZSF3", "C2_ZSF4", "C2_FLAG",
];

/// The column comments are aligned to, measured from the start of the
/// result buffer
const TRACE_COMMENT_COLUMN: usize = 35;

/// Upper bound on comments a single instruction can record
const COMMENTS_MAX: usize = 8;

/// Expected upper bound of a formatted result
const RESULT_CAPACITY: usize = 512;

/// Deferred annotations resolved against CPU state at trace time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Comment {
    /// `<rd>=0x........`
    GprRd,
    /// `<rt>=0x........`
    GprRt,
    /// `LO=0x........`
    Lo,
    /// `HI=0x........`
    Hi,
    /// `addr=0x........`, the resolved branch target
    Branch,
    /// `addr=0x........`, the resolved jump target
    Jump,
    /// `paddr=0x........`, the effective load/store physical address
    PAddr,
    /// `<cp0 rd>=0x........`
    Cp0Rd,
}

/// Stateful instruction disassembler
///
/// Holds the last-disassembled instruction and its PC so the trace pass
/// can resolve comments without re-decoding. The formatting buffer is
/// reused across calls; formatting is not thread-safe, use one
/// `Disassembler` per thread.
///
/// # Example
/// ```
/// use psxcore::core::cpu::Disassembler;
///
/// let mut disasm = Disassembler::new();
/// disasm.disasm_instr(0x3C1FDEAD, 0xBFC00000);
/// assert_eq!(disasm.result(), "lui ra,0xDEAD");
/// ```
pub struct Disassembler {
    /// The current disassembly result
    result: String,

    /// Comments recorded during disassembly, consumed by the trace pass
    comments: Vec<Comment>,

    /// The instruction being disassembled
    instr: u32,

    /// The program counter the instruction was fetched from
    pc: u32,
}

impl Disassembler {
    /// Create a new disassembler with an empty result buffer
    pub fn new() -> Self {
        Self {
            result: String::with_capacity(RESULT_CAPACITY),
            comments: Vec::with_capacity(COMMENTS_MAX),
            instr: 0,
            pc: 0,
        }
    }

    /// The current disassembly result
    pub fn result(&self) -> &str {
        &self.result
    }

    /// The last-disassembled instruction word
    pub fn instr(&self) -> u32 {
        self.instr
    }

    /// The program counter of the last-disassembled instruction
    pub fn pc(&self) -> u32 {
        self.pc
    }

    /// Disassemble one instruction into the result buffer
    ///
    /// Records the comment codes the trace pass will expand. `pc` is the
    /// address the instruction was fetched from; branch and jump targets
    /// are evaluated against it.
    pub fn disasm_instr(&mut self, instr: u32, pc: u32) {
        self.instr = instr;
        self.pc = pc;
        self.result.clear();
        self.comments.clear();

        match decode::op(instr) {
            0x00 => self.disasm_special(instr),
            0x01 => self.disasm_bcond(instr),
            0x02 => {
                let _ = write!(self.result, "j 0x{:08X}", decode::target(instr));
                self.push_comment(Comment::Jump);
            }
            0x03 => {
                let _ = write!(self.result, "jal 0x{:08X}", decode::target(instr));
                self.push_comment(Comment::Jump);
            }
            0x04 => self.fmt_branch_reg("beq", instr),
            0x05 => self.fmt_branch_reg("bne", instr),
            0x06 => self.fmt_branch("blez", instr),
            0x07 => self.fmt_branch("bgtz", instr),
            0x08 => self.fmt_arith_sext_imm("addi", instr),
            0x09 => self.fmt_arith_sext_imm("addiu", instr),
            0x0A => self.fmt_arith_sext_imm("slti", instr),
            0x0B => self.fmt_arith_sext_imm("sltiu", instr),
            0x0C => self.fmt_arith_zext_imm("andi", instr),
            0x0D => self.fmt_arith_zext_imm("ori", instr),
            0x0E => self.fmt_arith_zext_imm("xori", instr),
            0x0F => {
                let _ = write!(
                    self.result,
                    "lui {},0x{:04X}",
                    GPR_NAMES[decode::rt(instr)],
                    decode::zext_imm(instr)
                );
                self.push_comment(Comment::GprRt);
            }
            0x10 => self.disasm_cop0(instr),
            0x12 => self.disasm_cop2(instr),
            0x20 => self.fmt_load("lb", instr),
            0x21 => self.fmt_load("lh", instr),
            0x22 => self.fmt_load("lwl", instr),
            0x23 => self.fmt_load("lw", instr),
            0x24 => self.fmt_load("lbu", instr),
            0x25 => self.fmt_load("lhu", instr),
            0x26 => self.fmt_load("lwr", instr),
            0x28 => self.fmt_store("sb", instr),
            0x29 => self.fmt_store("sh", instr),
            0x2A => self.fmt_store("swl", instr),
            0x2B => self.fmt_store("sw", instr),
            0x2E => self.fmt_store("swr", instr),
            0x32 => self.fmt_cop2_load_store("lwc2", instr),
            0x3A => self.fmt_cop2_load_store("swc2", instr),
            _ => self.fmt_illegal(instr),
        }
    }

    /// Append the recorded comments to the result, resolved against the
    /// current CPU state
    ///
    /// Pads to [`TRACE_COMMENT_COLUMN`] (or the current length, whichever
    /// is greater), then emits `; <first>` and `, <next>` for the rest, in
    /// the order they were recorded. The comments are consumed.
    pub fn disasm_trace(&mut self, cpu: &CPU) {
        if self.comments.is_empty() {
            return;
        }

        let pad = TRACE_COMMENT_COLUMN.saturating_sub(self.result.len());
        for _ in 0..pad {
            self.result.push(' ');
        }
        self.result.push_str("; ");

        let comments = std::mem::take(&mut self.comments);
        for (i, comment) in comments.into_iter().enumerate() {
            if i > 0 {
                self.result.push_str(", ");
            }
            self.append_comment(comment, cpu);
        }
    }

    fn push_comment(&mut self, comment: Comment) {
        debug_assert!(self.comments.len() < COMMENTS_MAX);
        self.comments.push(comment);
    }

    fn append_comment(&mut self, comment: Comment, cpu: &CPU) {
        let instr = self.instr;

        match comment {
            Comment::GprRt => {
                let rt = decode::rt(instr);
                let _ = write!(self.result, "{}=0x{:08X}", GPR_NAMES[rt], cpu.reg(rt));
            }
            Comment::GprRd => {
                let rd = decode::rd(instr);
                let _ = write!(self.result, "{}=0x{:08X}", GPR_NAMES[rd], cpu.reg(rd));
            }
            Comment::PAddr => {
                let vaddr = cpu
                    .reg(decode::base(instr))
                    .wrapping_add(decode::offset(instr));
                let _ = write!(self.result, "paddr=0x{:08X}", translate_address(vaddr));
            }
            Comment::Jump => {
                let _ = write!(
                    self.result,
                    "addr=0x{:08X}",
                    decode::jump_target(instr, self.pc)
                );
            }
            Comment::Branch => {
                let _ = write!(
                    self.result,
                    "addr=0x{:08X}",
                    decode::branch_target(instr, self.pc)
                );
            }
            Comment::Lo => {
                let _ = write!(self.result, "LO=0x{:08X}", cpu.lo());
            }
            Comment::Hi => {
                let _ = write!(self.result, "HI=0x{:08X}", cpu.hi());
            }
            Comment::Cp0Rd => {
                let rd = decode::rd(instr);
                let _ = write!(
                    self.result,
                    "{}=0x{:08X}",
                    CP0_REG_NAMES[rd],
                    cpu.cop0_reg(rd)
                );
            }
        }
    }

    /// Format a signed 16-bit displacement as `[-]0xHHHH` (explicit sign,
    /// four hex digits of the magnitude)
    fn signed_hex(value: i16) -> String {
        if value < 0 {
            format!("-0x{:04X}", (value as i32).unsigned_abs())
        } else {
            format!("0x{:04X}", value)
        }
    }

    fn fmt_illegal(&mut self, instr: u32) {
        let _ = write!(self.result, "illegal 0x{:08X}", instr);
    }

    fn fmt_shift_var(&mut self, name: &str, instr: u32) {
        let _ = write!(
            self.result,
            "{} {},{},{}",
            name,
            GPR_NAMES[decode::rd(instr)],
            GPR_NAMES[decode::rt(instr)],
            decode::shamt(instr)
        );
        self.push_comment(Comment::GprRd);
    }

    fn fmt_shift_reg(&mut self, name: &str, instr: u32) {
        let _ = write!(
            self.result,
            "{} {},{},{}",
            name,
            GPR_NAMES[decode::rd(instr)],
            GPR_NAMES[decode::rt(instr)],
            GPR_NAMES[decode::rs(instr)]
        );
        self.push_comment(Comment::GprRd);
    }

    fn fmt_mult_div(&mut self, name: &str, instr: u32) {
        let _ = write!(
            self.result,
            "{} {},{}",
            name,
            GPR_NAMES[decode::rs(instr)],
            GPR_NAMES[decode::rt(instr)]
        );
        self.push_comment(Comment::Lo);
        self.push_comment(Comment::Hi);
    }

    fn fmt_arith_reg(&mut self, name: &str, instr: u32) {
        let _ = write!(
            self.result,
            "{} {},{},{}",
            name,
            GPR_NAMES[decode::rd(instr)],
            GPR_NAMES[decode::rs(instr)],
            GPR_NAMES[decode::rt(instr)]
        );
        self.push_comment(Comment::GprRd);
    }

    fn fmt_branch_reg(&mut self, name: &str, instr: u32) {
        let _ = write!(
            self.result,
            "{} {},{},{}",
            name,
            GPR_NAMES[decode::rs(instr)],
            GPR_NAMES[decode::rt(instr)],
            Self::signed_hex(decode::imm(instr) as i16)
        );
        self.push_comment(Comment::Branch);
    }

    fn fmt_branch(&mut self, name: &str, instr: u32) {
        let _ = write!(
            self.result,
            "{} {},{}",
            name,
            GPR_NAMES[decode::rs(instr)],
            Self::signed_hex(decode::imm(instr) as i16)
        );
        self.push_comment(Comment::Branch);
    }

    fn fmt_load_store(&mut self, name: &str, instr: u32) {
        let _ = write!(
            self.result,
            "{} {},{}({})",
            name,
            GPR_NAMES[decode::rt(instr)],
            Self::signed_hex(decode::imm(instr) as i16),
            GPR_NAMES[decode::base(instr)]
        );
    }

    fn fmt_load(&mut self, name: &str, instr: u32) {
        self.fmt_load_store(name, instr);
        self.push_comment(Comment::GprRt);
        self.push_comment(Comment::PAddr);
    }

    fn fmt_store(&mut self, name: &str, instr: u32) {
        self.fmt_load_store(name, instr);
        self.push_comment(Comment::PAddr);
    }

    fn fmt_arith_zext_imm(&mut self, name: &str, instr: u32) {
        let _ = write!(
            self.result,
            "{} {},{},0x{:04X}",
            name,
            GPR_NAMES[decode::rt(instr)],
            GPR_NAMES[decode::rs(instr)],
            decode::zext_imm(instr)
        );
        self.push_comment(Comment::GprRt);
    }

    fn fmt_arith_sext_imm(&mut self, name: &str, instr: u32) {
        let _ = write!(
            self.result,
            "{} {},{},{}",
            name,
            GPR_NAMES[decode::rt(instr)],
            GPR_NAMES[decode::rs(instr)],
            Self::signed_hex(decode::imm(instr) as i16)
        );
        self.push_comment(Comment::GprRt);
    }

    /// COP2 loads/stores move between memory and GTE data registers
    fn fmt_cop2_load_store(&mut self, name: &str, instr: u32) {
        let _ = write!(
            self.result,
            "{} {},{}({})",
            name,
            CP2_DATA_REG_NAMES[decode::rt(instr)],
            Self::signed_hex(decode::imm(instr) as i16),
            GPR_NAMES[decode::base(instr)]
        );
    }

    fn disasm_special(&mut self, instr: u32) {
        match decode::funct(instr) {
            0x00 => self.fmt_shift_var("sll", instr),
            0x02 => self.fmt_shift_var("srl", instr),
            0x03 => self.fmt_shift_var("sra", instr),
            0x04 => self.fmt_shift_reg("sllv", instr),
            0x06 => self.fmt_shift_reg("srlv", instr),
            0x07 => self.fmt_shift_reg("srav", instr),
            0x08 => {
                let _ = write!(self.result, "jr {}", GPR_NAMES[decode::rs(instr)]);
            }
            0x09 => {
                let _ = write!(
                    self.result,
                    "jalr {},{}",
                    GPR_NAMES[decode::rd(instr)],
                    GPR_NAMES[decode::rs(instr)]
                );
                self.push_comment(Comment::GprRd);
            }
            0x0C => self.result.push_str("syscall"),
            0x0D => self.result.push_str("break"),
            0x10 => {
                let _ = write!(self.result, "mfhi {}", GPR_NAMES[decode::rd(instr)]);
                self.push_comment(Comment::GprRd);
            }
            0x11 => {
                let _ = write!(self.result, "mthi {}", GPR_NAMES[decode::rs(instr)]);
            }
            0x12 => {
                let _ = write!(self.result, "mflo {}", GPR_NAMES[decode::rd(instr)]);
                self.push_comment(Comment::GprRd);
            }
            0x13 => {
                let _ = write!(self.result, "mtlo {}", GPR_NAMES[decode::rs(instr)]);
            }
            0x18 => self.fmt_mult_div("mult", instr),
            0x19 => self.fmt_mult_div("multu", instr),
            0x1A => self.fmt_mult_div("div", instr),
            0x1B => self.fmt_mult_div("divu", instr),
            0x20 => self.fmt_arith_reg("add", instr),
            0x21 => self.fmt_arith_reg("addu", instr),
            0x22 => self.fmt_arith_reg("sub", instr),
            0x23 => self.fmt_arith_reg("subu", instr),
            0x24 => self.fmt_arith_reg("and", instr),
            0x25 => self.fmt_arith_reg("or", instr),
            0x26 => self.fmt_arith_reg("xor", instr),
            0x27 => self.fmt_arith_reg("nor", instr),
            0x2A => self.fmt_arith_reg("slt", instr),
            0x2B => self.fmt_arith_reg("sltu", instr),
            _ => self.fmt_illegal(instr),
        }
    }

    /// BCOND group: the rt field selects bltz/bgez (bit 0) and the link
    /// variant (bit 4)
    fn disasm_bcond(&mut self, instr: u32) {
        let rt = decode::rt(instr);
        let opcode = if rt & 1 != 0 { "bgez" } else { "bltz" };
        let link = if (rt >> 4) & 1 != 0 { "al" } else { "" };

        let _ = write!(
            self.result,
            "{}{} {},{}",
            opcode,
            link,
            GPR_NAMES[decode::rs(instr)],
            Self::signed_hex(decode::imm(instr) as i16)
        );
    }

    fn disasm_cop0(&mut self, instr: u32) {
        match decode::rs(instr) {
            0x00 => {
                let _ = write!(
                    self.result,
                    "mfc0 {},{}",
                    GPR_NAMES[decode::rt(instr)],
                    CP0_REG_NAMES[decode::rd(instr)]
                );
            }
            0x04 => {
                let _ = write!(
                    self.result,
                    "mtc0 {},{}",
                    GPR_NAMES[decode::rt(instr)],
                    CP0_REG_NAMES[decode::rd(instr)]
                );
                self.push_comment(Comment::Cp0Rd);
            }
            _ => match decode::funct(instr) {
                0x10 => self.result.push_str("rfe"),
                _ => self.fmt_illegal(instr),
            },
        }
    }

    fn disasm_cop2(&mut self, instr: u32) {
        match decode::rs(instr) {
            0x00 => {
                let _ = write!(
                    self.result,
                    "mfc2 {},{}",
                    GPR_NAMES[decode::rt(instr)],
                    CP2_DATA_REG_NAMES[decode::rd(instr)]
                );
            }
            0x02 => {
                let _ = write!(
                    self.result,
                    "cfc2 {},{}",
                    GPR_NAMES[decode::rt(instr)],
                    CP2_CTRL_REG_NAMES[decode::rd(instr)]
                );
            }
            0x04 => {
                let _ = write!(
                    self.result,
                    "mtc2 {},{}",
                    GPR_NAMES[decode::rt(instr)],
                    CP2_DATA_REG_NAMES[decode::rd(instr)]
                );
            }
            0x06 => {
                let _ = write!(
                    self.result,
                    "ctc2 {},{}",
                    GPR_NAMES[decode::rt(instr)],
                    CP2_CTRL_REG_NAMES[decode::rd(instr)]
                );
            }
            _ => {
                let name = match decode::funct(instr) {
                    0x01 => "rtps",
                    0x06 => "nclip",
                    0x0C => "op",
                    0x10 => "dpcs",
                    0x11 => "intpl",
                    0x12 => "mvmva",
                    0x13 => "ncds",
                    0x14 => "cdp",
                    0x16 => "ncdt",
                    0x1B => "nccs",
                    0x1C => "cc",
                    0x1E => "ncs",
                    0x20 => "nct",
                    0x28 => "sqr",
                    0x29 => "dcpl",
                    0x2A => "dpct",
                    0x2D => "avsz3",
                    0x2E => "avsz4",
                    0x30 => "rtpt",
                    0x3D => "gpf",
                    0x3E => "gpl",
                    0x3F => "ncct",
                    _ => {
                        self.fmt_illegal(instr);
                        return;
                    }
                };
                self.result.push_str(name);
            }
        }
    }
}

impl Default for Disassembler {
    fn default() -> Self {
        Self::new()
    }
}
