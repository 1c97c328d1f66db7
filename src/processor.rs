// processor.rs
//
// The Tomasulo pipeline itself: Issue, Execute, and Commit run in that
// order every cycle (see `step`), plus the misprediction recovery path
// that rewinds the rename map, flushes reservation stations and reorder
// buffer entries, and redirects the fetch PC.

use log::{debug, error, trace, warn};
use serde::Serialize;

use crate::branch_predictor::BranchPredictor;
use crate::config::ProcessorConfig;
use crate::errors::SimulatorError;
use crate::instruction::{Instruction, Op};
use crate::memory::Memory;
use crate::register_file::{RegisterFile, RegisterSnapshot};
use crate::reservation_station::{ReservationStation, ReservationStations};
use crate::rob::{ReorderBuffer, RobEntry};
use crate::speculation::SpeculationManager;

#[derive(Debug, Clone, Default, Serialize)]
pub struct Metrics {
    pub total_cycles: u64,
    pub committed_instructions: u64,
    pub total_instructions: usize,
    pub bubble_cycles: u64,
    pub ipc: f64,
    pub mispredictions: u64,
    pub speculative_instructions_issued: u64,
    pub speculative_instructions_flushed: u64,
    pub branch_prediction_accuracy: f64,
    pub btb_hit_rate: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct RobSlot {
    pub index: usize,
    pub entry: RobEntry,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProcessorState {
    pub cycle: u64,
    pub pc: usize,
    pub metrics: Metrics,
    pub registers: Vec<RegisterSnapshot>,
    pub reservation_stations: Vec<ReservationStation>,
    pub rob_entries: Vec<RobSlot>,
    pub speculation_level: u32,
    pub speculation_stack: Vec<usize>,
}

pub struct Processor {
    config: ProcessorConfig,
    instructions: Vec<Instruction>,
    pc: usize,
    cycle: u64,
    registers: RegisterFile,
    memory: Memory,
    stations: ReservationStations,
    rob: ReorderBuffer,
    predictor: Option<BranchPredictor>,
    spec_mgr: SpeculationManager,
    /// When speculation is disabled, the rob index of an unresolved branch
    /// that blocks further issue until it resolves.
    blocking_branch: Option<usize>,
    committed_instructions: u64,
    total_cycles: u64,
    bubble_cycles: u64,
    /// Consecutive cycles with no issue/execute/commit activity, reset to
    /// zero the instant any of the three makes progress. Distinct from
    /// `bubble_cycles`, which is the reported lifetime total and never
    /// resets -- the deadlock watchdog must fire on a true stall streak,
    /// not on an accumulation of isolated bubbles spread across a long run.
    consecutive_bubble_cycles: u64,
    mispredictions: u64,
    finished: bool,
}

impl Processor {
    pub fn new(config: ProcessorConfig) -> Self {
        let predictor = if config.enable_speculation {
            Some(BranchPredictor::new(config.btb_size, config.history_bits, config.beq_taken_bias))
        } else {
            None
        };
        let stations = ReservationStations::new(config.num_add_stations, config.num_mul_stations, config.num_mem_stations);
        let rob = ReorderBuffer::new(config.rob_size);
        Self {
            config,
            instructions: Vec::new(),
            pc: 0,
            cycle: 0,
            registers: RegisterFile::new(),
            memory: Memory::new(),
            stations,
            rob,
            predictor,
            spec_mgr: SpeculationManager::new(),
            blocking_branch: None,
            committed_instructions: 0,
            total_cycles: 0,
            bubble_cycles: 0,
            consecutive_bubble_cycles: 0,
            mispredictions: 0,
            finished: false,
        }
    }

    pub fn load(&mut self, instructions: Vec<Instruction>) {
        self.instructions = instructions;
        self.pc = 0;
        self.cycle = 0;
        self.committed_instructions = 0;
        self.total_cycles = 0;
        self.bubble_cycles = 0;
        self.consecutive_bubble_cycles = 0;
        self.mispredictions = 0;
        self.finished = self.instructions.is_empty();
        self.blocking_branch = None;
    }

    pub fn memory_mut(&mut self) -> &mut Memory {
        &mut self.memory
    }

    pub fn memory(&self) -> &Memory {
        &self.memory
    }

    pub fn registers(&self) -> &RegisterFile {
        &self.registers
    }

    /// Seeds a register's architectural value before a run, the way
    /// `memory_mut().preload(...)` seeds memory -- used by test fixtures
    /// that need a non-zero starting register state.
    pub fn preload_register(&mut self, reg: crate::instruction::Register, value: i32) {
        self.registers.commit_write(reg, value, usize::MAX);
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    /// Advances the processor by one cycle. Returns `Ok(true)` while there
    /// is still work pending, `Ok(false)` once the program has fully
    /// drained, and `Err` on a DIV-by-zero or a watchdog-triggered
    /// deadlock.
    pub fn step(&mut self) -> Result<bool, SimulatorError> {
        self.cycle += 1;
        self.total_cycles += 1;

        let issued = self.issue()?;
        let executed = self.execute()?;
        let committed = self.commit();

        if !issued && !executed && !committed {
            self.bubble_cycles += 1;
            self.consecutive_bubble_cycles += 1;
            if self.consecutive_bubble_cycles > self.config.bubble_threshold {
                error!(
                    "deadlock watchdog tripped at cycle {} ({} consecutive bubble cycles)",
                    self.cycle, self.consecutive_bubble_cycles
                );
                self.finished = true;
                return Err(SimulatorError::Deadlock {
                    cycle: self.cycle,
                    bubble_cycles: self.consecutive_bubble_cycles,
                });
            }
        } else {
            self.consecutive_bubble_cycles = 0;
        }

        self.finished = self.pc >= self.instructions.len() && self.rob.is_empty() && self.stations.all().all(|s| !s.busy);
        Ok(!self.finished)
    }

    /// Runs to completion (or a deadlock/div-by-zero error), returning
    /// final metrics.
    pub fn run(&mut self) -> Result<Metrics, SimulatorError> {
        while self.step()? {}
        Ok(self.metrics())
    }

    fn issue(&mut self) -> Result<bool, SimulatorError> {
        let mut issued_any = false;
        for _ in 0..self.config.max_issue_per_cycle {
            if let Some(blocking) = self.blocking_branch {
                let resolved = self.rob.get(blocking).map(|e| e.actual_taken.is_some()).unwrap_or(true);
                if !resolved {
                    break;
                }
                self.blocking_branch = None;
            }
            if self.pc >= self.instructions.len() {
                break;
            }
            if self.rob.is_full() {
                trace!("issue stalled at pc={}: rob full", self.pc);
                break;
            }
            let instr = self.instructions[self.pc].clone();
            let class = instr.op.station_class();
            let Some(station_idx) = self.stations.find_free(class) else {
                trace!("issue stalled at pc={}: no free {:?} station", self.pc, class);
                break;
            };

            let pc = self.pc;
            let is_speculative = self.spec_mgr.is_speculating();

            let (vj, qj, vk, qk, address) = self.configure_operands(&instr);

            let destination = if instr.op.writes_register() { instr.dest } else { None };
            let old_producer = destination.map(|reg| self.registers.tag(reg));
            let old_phys = match destination {
                Some(reg) => Some(self.registers.allocate(reg)?),
                None => None,
            };

            let rob_index = self.rob.add_entry(instr.clone(), destination, is_speculative, pc);
            if let Some(old_phys) = old_phys {
                if let Some(entry) = self.rob_entry_mut(rob_index) {
                    entry.old_phys = Some(old_phys);
                    entry.old_producer = old_producer.flatten();
                }
            }
            if let Some(dest) = destination {
                self.registers.set_producer(dest, rob_index);
            }
            if is_speculative {
                self.spec_mgr.add_speculative_instruction(pc, rob_index);
            }

            let (predicted_taken, next_pc) = if instr.op.is_branch() {
                let taken = if let Some(predictor) = self.predictor.as_mut() {
                    predictor.predict(pc, instr.op).taken
                } else {
                    false
                };
                let target = if taken {
                    branch_target(pc, instr.immediate.unwrap_or(0))
                } else {
                    pc + 1
                };
                (Some(taken), target)
            } else {
                (None, pc + 1)
            };

            self.stations.issue(
                class,
                station_idx,
                &instr,
                rob_index,
                pc,
                vj,
                qj,
                vk,
                qk,
                address,
                is_speculative,
                predicted_taken,
                None,
            );

            if instr.op.is_branch() {
                if self.config.enable_speculation {
                    self.spec_mgr.start_speculation(pc);
                } else {
                    self.blocking_branch = Some(rob_index);
                }
            }

            debug!("issue: pc={} {} -> rob[{}] ({:?})", pc, instr, rob_index, class);
            self.pc = next_pc;
            issued_any = true;
        }
        Ok(issued_any)
    }

    fn rob_entry_mut(&mut self, index: usize) -> Option<&mut RobEntry> {
        // ReorderBuffer keeps entries private; route through a narrow accessor
        // so Issue can stash old_phys right after allocation.
        self.rob.entry_mut(index)
    }

    fn configure_operands(
        &self,
        instr: &Instruction,
    ) -> (Option<i32>, Option<usize>, Option<i32>, Option<usize>, Option<i64>) {
        let mut vj = None;
        let mut qj = None;
        let mut vk = None;
        let mut qk = None;
        let mut address = None;

        match instr.op {
            Op::Ld => {
                let base = instr.src1.map(|r| self.registers.value(r) as i64).unwrap_or(0);
                address = Some(base + instr.immediate.unwrap_or(0) as i64);
            },
            Op::St => {
                let base = instr.src1.map(|r| self.registers.value(r) as i64).unwrap_or(0);
                address = Some(base + instr.immediate.unwrap_or(0) as i64);
                if let Some(data_reg) = instr.dest {
                    if self.registers.is_ready(data_reg) {
                        vj = Some(self.registers.value(data_reg));
                    } else {
                        qj = self.registers.tag(data_reg);
                    }
                }
            },
            _ => {
                if let Some(r) = instr.src1 {
                    if self.registers.is_ready(r) {
                        vj = Some(self.registers.value(r));
                    } else {
                        qj = self.registers.tag(r);
                    }
                }
                if let Some(r) = instr.src2 {
                    if self.registers.is_ready(r) {
                        vk = Some(self.registers.value(r));
                    } else {
                        qk = self.registers.tag(r);
                    }
                }
            },
        }
        (vj, qj, vk, qk, address)
    }

    fn execute(&mut self) -> Result<bool, SimulatorError> {
        let (active, completed) = self.stations.tick_all();
        for (class, idx) in completed {
            let station = self.stations.station_mut(class, idx).clone();
            let Some(op) = station.op else { continue };
            let rob_index = station.rob_index.expect("completed station must have a rob index");
            let pc = station.pc.expect("completed station must have a pc");

            let value = match op {
                Op::Ld => {
                    let addr = station.address.unwrap_or(0);
                    self.memory.read(addr)
                },
                Op::St => {
                    let addr = station.address.unwrap_or(0);
                    let data = station.vj.unwrap_or(0);
                    self.memory.write(addr, data);
                    data
                },
                _ => execute_op(op, station.vj, station.vk, pc, rob_index)?,
            };

            self.stations.broadcast(rob_index, value);
            self.rob.update_entry(rob_index, value);
            self.stations.release(class, idx);
            debug!("execute: rob[{}] ({:?}) -> {}", rob_index, op, value);

            if op.is_branch() {
                self.resolve_branch(rob_index, pc, value, station.predicted_taken.unwrap_or(false));
            }
        }
        Ok(active)
    }

    fn resolve_branch(&mut self, rob_index: usize, branch_pc: usize, result: i32, predicted_taken: bool) {
        let actual_taken = result != 0;
        let immediate = self.instructions[branch_pc].immediate.unwrap_or(0);
        let correct_target = if actual_taken { branch_target(branch_pc, immediate) } else { branch_pc + 1 };
        self.rob.mark_resolved(rob_index, actual_taken, correct_target);

        let mispredicted = actual_taken != predicted_taken;
        if let Some(predictor) = self.predictor.as_mut() {
            let prediction = crate::branch_predictor::BranchPrediction {
                taken: predicted_taken,
                target: correct_target,
                confidence: 0.0,
                btb_hit: false,
            };
            predictor.update(branch_pc, actual_taken, correct_target, prediction);
        }

        if !self.config.enable_speculation {
            if self.blocking_branch == Some(rob_index) {
                if mispredicted {
                    self.pc = correct_target;
                }
                self.blocking_branch = None;
            }
            if mispredicted {
                self.mispredictions += 1;
                warn!("misprediction at pc={}: redirecting to pc={}", branch_pc, correct_target);
            }
            return;
        }

        if !mispredicted {
            self.spec_mgr.resolve_branch(branch_pc);
            self.rob.confirm_speculative(rob_index);
            return;
        }

        self.mispredictions += 1;
        warn!(
            "misprediction at pc={}: predicted_taken={} actual_taken={}, redirecting to pc={}",
            branch_pc, predicted_taken, actual_taken, correct_target
        );
        let flushed = self.spec_mgr.flush_after(branch_pc);
        let mut flushed_sorted: Vec<usize> = flushed;
        flushed_sorted.sort_by_key(|&idx| std::cmp::Reverse(self.rob.get(idx).map(|e| e.pc).unwrap_or(0)));
        for idx in flushed_sorted {
            if let Some(entry) = self.rob.get(idx) {
                if let (Some(dest), Some(old_phys)) = (entry.destination, entry.old_phys) {
                    self.registers.rewind(dest, old_phys, entry.old_producer);
                }
            }
            self.rob.mark_flushed(idx);
        }
        self.stations.flush_after_pc(&self.rob);
        self.pc = correct_target;
    }

    fn commit(&mut self) -> bool {
        self.rob.cleanup_flushed();
        let Some((idx, entry)) = self.rob.commit() else {
            return false;
        };
        if entry.instruction.op.writes_register() {
            if let (Some(dest), Some(value)) = (entry.destination, entry.value) {
                self.registers.commit_write(dest, value, idx);
            }
        }
        if let Some(old_phys) = entry.old_phys {
            self.registers.free(old_phys);
        }
        self.committed_instructions += 1;
        debug!("commit: rob[{}] {}", idx, entry.instruction);
        true
    }

    pub fn metrics(&self) -> Metrics {
        let ipc = if self.total_cycles == 0 {
            0.0
        } else {
            self.committed_instructions as f64 / self.total_cycles as f64
        };
        let (accuracy, btb_hit_rate, spec_issued, spec_flushed) = if let Some(predictor) = &self.predictor {
            let stats = self.spec_mgr.stats();
            (
                predictor.accuracy(),
                predictor.btb_hit_rate(),
                stats.speculative_instructions_issued,
                stats.speculative_instructions_flushed,
            )
        } else {
            (0.0, 0.0, 0, 0)
        };
        Metrics {
            total_cycles: self.total_cycles,
            committed_instructions: self.committed_instructions,
            total_instructions: self.instructions.len(),
            bubble_cycles: self.bubble_cycles,
            ipc,
            mispredictions: self.mispredictions,
            speculative_instructions_issued: spec_issued,
            speculative_instructions_flushed: spec_flushed,
            branch_prediction_accuracy: accuracy,
            btb_hit_rate,
        }
    }

    pub fn state(&self) -> ProcessorState {
        ProcessorState {
            cycle: self.cycle,
            pc: self.pc,
            metrics: self.metrics(),
            registers: self.registers.snapshot(),
            reservation_stations: self.stations.all().cloned().collect(),
            rob_entries: self.rob.entries_in_order().into_iter().map(|(index, entry)| RobSlot { index, entry: entry.clone() }).collect(),
            speculation_level: self.spec_mgr.level(),
            speculation_stack: self.spec_mgr.stack().to_vec(),
        }
    }
}

fn branch_target(pc: usize, immediate: i32) -> usize {
    let target = pc as i64 + 1 + immediate as i64;
    target.max(0) as usize
}

fn floor_div(a: i32, b: i32) -> i32 {
    let q = a.wrapping_div(b);
    let r = a.wrapping_rem(b);
    if r != 0 && (r < 0) != (b < 0) {
        q - 1
    } else {
        q
    }
}

/// Handles the arithmetic and compare ops. LD/ST go through memory and are
/// handled directly in `Processor::execute`, since they need `&mut Memory`.
fn execute_op(op: Op, vj: Option<i32>, vk: Option<i32>, pc: usize, rob_index: usize) -> Result<i32, SimulatorError> {
    let vj = vj.unwrap_or(0);
    let vk = vk.unwrap_or(0);
    let result = match op {
        Op::Add => vj.wrapping_add(vk),
        Op::Sub => vj.wrapping_sub(vk),
        Op::Mul => vj.wrapping_mul(vk),
        Op::Div => {
            if vk == 0 {
                return Err(SimulatorError::DivideByZero { pc, rob_index });
            }
            floor_div(vj, vk)
        },
        Op::Beq => (vj == vk) as i32,
        Op::Bne => (vj != vk) as i32,
        Op::Ld | Op::St => unreachable!("LD/ST handled in Processor::execute"),
    };
    Ok(result)
}
