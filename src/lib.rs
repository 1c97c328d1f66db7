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

// lib.rs
//
// Library entry point for the Tomasulo dynamic scheduling simulator: a
// reorder buffer, register renaming, reservation stations, and branch
// speculation over a small MIPS-like instruction set.

pub mod branch_predictor;
pub mod config;
pub mod errors;
pub mod instruction;
pub mod logger;
pub mod memory;
pub mod parser;
pub mod processor;
pub mod register_file;
pub mod reservation_station;
pub mod rob;
pub mod speculation;

pub use config::ProcessorConfig;
pub use errors::SimulatorError;
pub use instruction::{Instruction, Op, Register};
pub use parser::parse_program;
pub use processor::{Metrics, Processor, ProcessorState};
