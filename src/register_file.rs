// Copyright (c) 2024 Mudit Bhargava
//
// Permission is hereby granted, free of charge, to any person obtaining a copy
// of this software and associated documentation files (the "Software"), to deal
// in the Software without restriction, including without limitation the rights
// to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
// copies of the Software, and to permit persons to whom the Software is
// furnished to do so, subject to the following conditions:
//
// The above copyright notice and this permission notice shall be included in all
// copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
// IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
// FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
// AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
// LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
// OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
// SOFTWARE.
//

// register_file.rs
//
// Logical register file with a physical rename back-end. R0 is a regular,
// writable register here -- it is not hardwired to zero the way a real MIPS
// implementation wires it, since nothing in this instruction set depends on
// that convention and renaming treats every logical register uniformly.

use serde::Serialize;

use crate::errors::SimulatorError;
use crate::instruction::Register;

const NUM_LOGICAL: usize = 64; // R0..31, F0..31
const NUM_PHYSICAL: usize = 128;

fn logical_index(reg: Register) -> usize {
    match reg {
        Register::R(n) => n as usize,
        Register::F(n) => 32 + n as usize,
    }
}

/// Snapshot of one logical register, for the observation surface.
#[derive(Debug, Clone, Serialize)]
pub struct RegisterSnapshot {
    pub name: String,
    pub value: i32,
    pub producer_tag: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct RegisterFile {
    rename_map: [usize; NUM_LOGICAL],
    phys_values: [i32; NUM_PHYSICAL],
    /// ROB index of the in-flight producer for each logical register, or
    /// `None` if the architectural value is authoritative.
    producer_tag: [Option<usize>; NUM_LOGICAL],
    free_list: Vec<usize>,
}

impl RegisterFile {
    pub fn new() -> Self {
        let mut rename_map = [0usize; NUM_LOGICAL];
        for (i, slot) in rename_map.iter_mut().enumerate() {
            *slot = i;
        }
        let free_list = (NUM_LOGICAL..NUM_PHYSICAL).rev().collect();
        Self {
            rename_map,
            phys_values: [0; NUM_PHYSICAL],
            producer_tag: [None; NUM_LOGICAL],
            free_list,
        }
    }

    pub fn value(&self, reg: Register) -> i32 {
        let phys = self.rename_map[logical_index(reg)];
        self.phys_values[phys]
    }

    pub fn tag(&self, reg: Register) -> Option<usize> {
        self.producer_tag[logical_index(reg)]
    }

    pub fn is_ready(&self, reg: Register) -> bool {
        self.tag(reg).is_none()
    }

    pub fn set_producer(&mut self, reg: Register, rob_index: usize) {
        self.producer_tag[logical_index(reg)] = Some(rob_index);
    }

    /// Allocates a fresh physical register for `reg`'s next write and
    /// returns the physical register that used to back it, so the caller
    /// can restore it on a flush.
    pub fn allocate(&mut self, reg: Register) -> Result<usize, SimulatorError> {
        let idx = logical_index(reg);
        let old_phys = self.rename_map[idx];
        let new_phys = self.free_list.pop().ok_or_else(|| SimulatorError::NoFreePhysicalRegister {
            logical: reg.to_string(),
        })?;
        self.rename_map[idx] = new_phys;
        Ok(old_phys)
    }

    /// Undoes a rename: points `reg` back at `old_phys`, frees whatever
    /// physical register it currently maps to, and restores the producer
    /// tag that was in effect before this entry's issue. Used during
    /// misprediction recovery, walking flushed entries from newest to
    /// oldest, so each call's `old_producer` chains to the next-older
    /// surviving producer (or `None` if nothing is left in flight).
    pub fn rewind(&mut self, reg: Register, old_phys: usize, old_producer: Option<usize>) {
        let idx = logical_index(reg);
        let current = self.rename_map[idx];
        if current != old_phys {
            self.free_list.push(current);
        }
        self.rename_map[idx] = old_phys;
        self.producer_tag[idx] = old_producer;
    }

    pub fn free(&mut self, phys: usize) {
        self.free_list.push(phys);
    }

    /// Writes `value` to `reg`'s current physical register and, if this
    /// commit is still the register's active producer, clears the tag.
    pub fn commit_write(&mut self, reg: Register, value: i32, committing_rob_index: usize) {
        let idx = logical_index(reg);
        let phys = self.rename_map[idx];
        self.phys_values[phys] = value;
        if self.producer_tag[idx] == Some(committing_rob_index) {
            self.producer_tag[idx] = None;
        }
    }

    pub fn snapshot(&self) -> Vec<RegisterSnapshot> {
        let mut out = Vec::with_capacity(NUM_LOGICAL);
        for n in 0..32u8 {
            let reg = Register::R(n);
            out.push(RegisterSnapshot {
                name: reg.to_string(),
                value: self.value(reg),
                producer_tag: self.tag(reg),
            });
        }
        for n in 0..32u8 {
            let reg = Register::F(n);
            out.push(RegisterSnapshot {
                name: reg.to_string(),
                value: self.value(reg),
                producer_tag: self.tag(reg),
            });
        }
        out
    }
}

impl Default for RegisterFile {
    fn default() -> Self {
        Self::new()
    }
}

/// Parses a register name such as `"R3"` or `"F12"`. Used by the parser and
/// by tests that build registers by name, mirroring how the textual grammar
/// refers to them.
pub fn parse_register_name(s: &str) -> Option<Register> {
    let (prefix, rest) = s.split_at(1);
    let n: u8 = rest.parse().ok()?;
    match prefix.to_ascii_uppercase().as_str() {
        "R" => Some(Register::R(n)),
        "F" => Some(Register::F(n)),
        _ => None,
    }
}

