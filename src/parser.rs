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

// parser.rs
//
// Turns program text into `Instruction`s. Accepts:
//   ADD/SUB/MUL/DIV Rd, Rs, Rt
//   LD Rd, imm(Rb)
//   ST Rs, imm(Rb)
//   BEQ/BNE Rs, Rt, imm
// Blank lines and lines starting with `#` or `;` (after trimming) are
// comments; a trailing `#`/`;` truncates the rest of the line.

use crate::errors::SimulatorError;
use crate::instruction::{Instruction, Op};
use crate::register_file::parse_register_name;

pub fn parse_program(text: &str) -> Result<Vec<Instruction>, SimulatorError> {
    let mut instructions = Vec::new();
    for (i, raw_line) in text.lines().enumerate() {
        let line_no = i + 1;
        let line = strip_comment(raw_line).trim();
        if line.is_empty() {
            continue;
        }
        instructions.push(parse_line(line, line_no)?);
    }
    Ok(instructions)
}

fn strip_comment(line: &str) -> &str {
    let end = line.find(['#', ';']).unwrap_or(line.len());
    &line[..end]
}

fn parse_line(line: &str, line_no: usize) -> Result<Instruction, SimulatorError> {
    let mut split = line.splitn(2, char::is_whitespace);
    let op_tok = split.next().unwrap_or("");
    let rest = split.next().unwrap_or("").trim();

    let err = || SimulatorError::ParseError { line: line_no, text: line.to_string() };

    let op = match op_tok.to_ascii_uppercase().as_str() {
        "ADD" => Op::Add,
        "SUB" => Op::Sub,
        "MUL" => Op::Mul,
        "DIV" => Op::Div,
        "LD" => Op::Ld,
        "ST" => Op::St,
        "BEQ" => Op::Beq,
        "BNE" => Op::Bne,
        _ => return Err(err()),
    };

    let operands = split_operands(rest);

    let instr = match op {
        Op::Add | Op::Sub | Op::Mul | Op::Div => {
            if operands.len() != 3 {
                return Err(err());
            }
            let dest = parse_reg(&operands[0], line_no, line)?;
            let src1 = parse_reg(&operands[1], line_no, line)?;
            let src2 = parse_reg(&operands[2], line_no, line)?;
            Instruction::new(op, Some(dest), Some(src1), Some(src2), None, op.default_latency(), line)
        },
        Op::Ld => {
            if operands.len() != 2 {
                return Err(err());
            }
            let dest = parse_reg(&operands[0], line_no, line)?;
            let (imm, base) = parse_mem_operand(&operands[1], line_no, line)?;
            Instruction::new(op, Some(dest), Some(base), None, Some(imm), op.default_latency(), line)
        },
        Op::St => {
            if operands.len() != 2 {
                return Err(err());
            }
            let data = parse_reg(&operands[0], line_no, line)?;
            let (imm, base) = parse_mem_operand(&operands[1], line_no, line)?;
            Instruction::new(op, Some(data), Some(base), None, Some(imm), op.default_latency(), line)
        },
        Op::Beq | Op::Bne => {
            if operands.len() != 3 {
                return Err(err());
            }
            let src1 = parse_reg(&operands[0], line_no, line)?;
            let src2 = parse_reg(&operands[1], line_no, line)?;
            let imm: i32 = operands[2].parse().map_err(|_| err())?;
            Instruction::new(op, None, Some(src1), Some(src2), Some(imm), op.default_latency(), line)
        },
    };
    Ok(instr)
}

fn split_operands(rest: &str) -> Vec<String> {
    rest.split(',').map(|s| s.trim().to_string()).filter(|s| !s.is_empty()).collect()
}

fn parse_reg(token: &str, line_no: usize, line: &str) -> Result<crate::instruction::Register, SimulatorError> {
    parse_register_name(token).ok_or_else(|| SimulatorError::ParseError { line: line_no, text: line.to_string() })
}

fn parse_mem_operand(token: &str, line_no: usize, line: &str) -> Result<(i32, crate::instruction::Register), SimulatorError> {
    let err = || SimulatorError::ParseError { line: line_no, text: line.to_string() };
    let open = token.find('(').ok_or_else(err)?;
    let close = token.find(')').ok_or_else(err)?;
    if close < open {
        return Err(err());
    }
    let imm: i32 = token[..open].trim().parse().map_err(|_| err())?;
    let reg = parse_reg(token[open + 1..close].trim(), line_no, line)?;
    Ok((imm, reg))
}
