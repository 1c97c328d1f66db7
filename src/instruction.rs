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

// instruction.rs
//
// The decoded instruction model for the Tomasulo core: a small MIPS-like
// subset of eight operations, enough to exercise renaming, dynamic
// scheduling, and branch speculation.

use std::fmt;

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Op {
    Add,
    Sub,
    Mul,
    Div,
    Ld,
    St,
    Beq,
    Bne,
}

impl Op {
    pub fn default_latency(self) -> u32 {
        match self {
            Op::Add | Op::Sub => 1,
            Op::Mul => 3,
            Op::Div => 5,
            Op::Ld | Op::St => 2,
            Op::Beq | Op::Bne => 1,
        }
    }

    pub fn is_branch(self) -> bool {
        matches!(self, Op::Beq | Op::Bne)
    }

    pub fn is_load(self) -> bool {
        matches!(self, Op::Ld)
    }

    pub fn is_store(self) -> bool {
        matches!(self, Op::St)
    }

    /// Writes a value into `dest` that later instructions may read.
    /// Stores and branches do not (they still occupy a ROB slot, but commit
    /// performs no register write for them).
    pub fn writes_register(self) -> bool {
        !matches!(self, Op::St | Op::Beq | Op::Bne)
    }

    pub fn station_class(self) -> StationClass {
        match self {
            Op::Add | Op::Sub | Op::Beq | Op::Bne => StationClass::Add,
            Op::Mul | Op::Div => StationClass::Mul,
            Op::Ld | Op::St => StationClass::Mem,
        }
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Op::Add => "ADD",
            Op::Sub => "SUB",
            Op::Mul => "MUL",
            Op::Div => "DIV",
            Op::Ld => "LD",
            Op::St => "ST",
            Op::Beq => "BEQ",
            Op::Bne => "BNE",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum StationClass {
    Add,
    Mul,
    Mem,
}

/// A logical register name. `R0..R31` are general-purpose; `F0..F31` are
/// modeled identically (no separate floating-point datapath) to keep the
/// core simulator narrow, per the instruction set this crate models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Register {
    R(u8),
    F(u8),
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Register::R(n) => write!(f, "R{}", n),
            Register::F(n) => write!(f, "F{}", n),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Instruction {
    pub op: Op,
    pub dest: Option<Register>,
    pub src1: Option<Register>,
    pub src2: Option<Register>,
    pub immediate: Option<i32>,
    pub latency: u32,
    /// The line this instruction parsed from, kept for trace/debug output.
    pub text: String,
}

impl Instruction {
    pub fn new(
        op: Op,
        dest: Option<Register>,
        src1: Option<Register>,
        src2: Option<Register>,
        immediate: Option<i32>,
        latency: u32,
        text: impl Into<String>,
    ) -> Self {
        Self {
            op,
            dest,
            src1,
            src2,
            immediate,
            latency,
            text: text.into(),
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.text)
    }
}
