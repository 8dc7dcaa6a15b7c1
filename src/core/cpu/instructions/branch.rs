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

use super::super::{decode, gpr, CPU};

impl CPU {
    // === Branch Instructions ===
    //
    // A taken branch only rewrites `npc`; the instruction at pc + 4 (the
    // delay slot) has already been prefetched and executes on the next
    // step before control reaches the target.

    /// BCOND group (opcode 0x01): BLTZ, BGEZ, BLTZAL, BGEZAL
    ///
    /// The rt field encodes a 2x2 matrix: bit 0 selects BGEZ (1) vs BLTZ
    /// (0), bit 4 selects link. When the link bit is set, `ra` receives
    /// pc + 8 whether or not the branch is taken.
    pub(crate) fn op_bcond(&mut self, instr: u32) {
        let rt = decode::rt(instr);
        let is_bgez = (rt & 0x01) != 0;
        let is_link = (rt & 0x10) != 0;

        if is_link {
            self.set_reg(gpr::RA, self.pc.wrapping_add(8));
        }

        let negative = (self.reg(decode::rs(instr)) as i32) < 0;
        if negative ^ is_bgez {
            self.branch(instr);
        }
    }

    /// BEQ: branch if rs == rt
    pub(crate) fn op_beq(&mut self, instr: u32) {
        if self.reg(decode::rs(instr)) == self.reg(decode::rt(instr)) {
            self.branch(instr);
        }
    }

    /// BNE: branch if rs != rt
    pub(crate) fn op_bne(&mut self, instr: u32) {
        if self.reg(decode::rs(instr)) != self.reg(decode::rt(instr)) {
            self.branch(instr);
        }
    }

    /// BLEZ: branch if rs <= 0 (signed)
    pub(crate) fn op_blez(&mut self, instr: u32) {
        if (self.reg(decode::rs(instr)) as i32) <= 0 {
            self.branch(instr);
        }
    }

    /// BGTZ: branch if rs > 0 (signed)
    pub(crate) fn op_bgtz(&mut self, instr: u32) {
        if (self.reg(decode::rs(instr)) as i32) > 0 {
            self.branch(instr);
        }
    }

    /// Redirect `npc` to the branch target
    ///
    /// The target is evaluated against the branch instruction's own PC:
    /// pc + 4 + (sign_extend(offset) << 2).
    fn branch(&mut self, instr: u32) {
        self.npc = decode::branch_target(instr, self.pc);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::memory::Bus;

    fn make_i_type(op: u8, rs: u8, rt: u8, imm: u16) -> u32 {
        ((op as u32) << 26) | ((rs as u32) << 21) | ((rt as u32) << 16) | (imm as u32)
    }

    fn program_bus(base: u32, words: &[u32]) -> Bus {
        let mut bus = Bus::new();
        for (i, word) in words.iter().enumerate() {
            bus.store_word(base + (i as u32) * 4, *word);
        }
        bus
    }

    #[test]
    fn test_beq_taken_redirects_npc() {
        let mut bus = program_bus(0x1000, &[make_i_type(0x04, 0, 0, 4), 0, 0]);
        let mut cpu = CPU::new();
        cpu.set_pc(0x1000, &bus);

        cpu.step(&mut bus);
        // Target = 0x1000 + 4 + (4 << 2)
        assert_eq!(cpu.npc(), 0x1014);
    }

    #[test]
    fn test_beq_not_taken() {
        let mut bus = program_bus(0x1000, &[make_i_type(0x04, 1, 2, 4), 0, 0]);
        let mut cpu = CPU::new();
        cpu.set_pc(0x1000, &bus);
        cpu.set_reg(1, 1);
        cpu.set_reg(2, 2);

        cpu.step(&mut bus);
        assert_eq!(cpu.npc(), 0x1008);
    }

    #[test]
    fn test_delay_slot_executes_before_target() {
        // beq zero,zero,+1 ; ori v0,zero,0x1234 ; ori v0,zero,0x5678
        let mut bus = program_bus(
            0x1000,
            &[
                make_i_type(0x04, 0, 0, 1),
                make_i_type(0x0D, 0, 2, 0x1234),
                make_i_type(0x0D, 0, 2, 0x5678),
            ],
        );
        let mut cpu = CPU::new();
        cpu.set_pc(0x1000, &bus);

        cpu.step(&mut bus); // branch
        cpu.step(&mut bus); // delay slot
        assert_eq!(cpu.reg(2), 0x1234, "delay slot write must be observable");

        cpu.step(&mut bus); // target
        assert_eq!(cpu.reg(2), 0x5678);
    }

    #[test]
    fn test_backward_branch_loops() {
        // At 0x1000: bne at,v0,-1 branches back onto itself via the slot
        let mut bus = program_bus(
            0x1000,
            &[make_i_type(0x05, 1, 2, 0xFFFF), 0, 0],
        );
        let mut cpu = CPU::new();
        cpu.set_pc(0x1000, &bus);
        cpu.set_reg(1, 1);

        cpu.step(&mut bus);
        assert_eq!(cpu.npc(), 0x1000, "offset -1 targets the branch itself");
    }

    #[test]
    fn test_blez_bgtz_signed_test() {
        let mut bus = program_bus(0x1000, &[make_i_type(0x06, 1, 0, 4), 0]);
        let mut cpu = CPU::new();
        cpu.set_pc(0x1000, &bus);
        cpu.set_reg(1, 0x80000000); // negative

        cpu.step(&mut bus);
        assert_eq!(cpu.npc(), 0x1014, "blez taken for negative value");

        let mut bus = program_bus(0x1000, &[make_i_type(0x07, 1, 0, 4), 0]);
        let mut cpu = CPU::new();
        cpu.set_pc(0x1000, &bus);
        cpu.set_reg(1, 0x80000000);

        cpu.step(&mut bus);
        assert_eq!(cpu.npc(), 0x1008, "bgtz not taken for negative value");
    }

    #[test]
    fn test_bltz_bgez_condition_matrix() {
        for (rt_field, value, taken) in [
            (0x00u8, 0xFFFFFFFFu32, true),  // bltz, negative
            (0x00, 1, false),               // bltz, positive
            (0x01, 1, true),                // bgez, positive
            (0x01, 0, true),                // bgez, zero
            (0x01, 0xFFFFFFFF, false),      // bgez, negative
        ] {
            let mut bus = program_bus(0x1000, &[make_i_type(0x01, 1, rt_field, 4), 0]);
            let mut cpu = CPU::new();
            cpu.set_pc(0x1000, &bus);
            cpu.set_reg(1, value);

            cpu.step(&mut bus);
            let expected = if taken { 0x1014 } else { 0x1008 };
            assert_eq!(cpu.npc(), expected, "rt=0x{:02X} value=0x{:08X}", rt_field, value);
        }
    }

    #[test]
    fn test_bcond_link_is_unconditional() {
        // bgezal with a negative register: branch not taken, ra still set
        let mut bus = program_bus(0x1000, &[make_i_type(0x01, 1, 0x11, 4), 0]);
        let mut cpu = CPU::new();
        cpu.set_pc(0x1000, &bus);
        cpu.set_reg(1, 0xFFFFFFFF);

        cpu.step(&mut bus);
        assert_eq!(cpu.npc(), 0x1008, "branch not taken");
        assert_eq!(cpu.reg(31), 0x1008, "link written even when not taken");
    }

    #[test]
    fn test_bltzal_taken_links_past_delay_slot() {
        let mut bus = program_bus(0x1000, &[make_i_type(0x01, 1, 0x10, 4), 0]);
        let mut cpu = CPU::new();
        cpu.set_pc(0x1000, &bus);
        cpu.set_reg(1, 0xFFFFFFFF);

        cpu.step(&mut bus);
        assert_eq!(cpu.npc(), 0x1014);
        assert_eq!(cpu.reg(31), 0x1008, "link value is pc + 8");
    }
}
