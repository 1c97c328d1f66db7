// reservation_station.rs
//
// Reservation stations grouped into Add/Mul/Mem pools, matching the
// functional-unit classes an instruction's op routes to. Producer tags
// (Qj/Qk) name a reorder buffer index rather than a station, so forwarding
// is decoupled from station reuse -- a station can be released and reused
// by a later instruction without stale tags from an earlier one resolving
// against it.

use serde::Serialize;

use crate::instruction::{Instruction, Op, StationClass};
use crate::rob::ReorderBuffer;

#[derive(Debug, Clone, Serialize)]
pub struct ReservationStation {
    pub name: String,
    pub busy: bool,
    pub op: Option<Op>,
    pub vj: Option<i32>,
    pub vk: Option<i32>,
    pub qj: Option<usize>,
    pub qk: Option<usize>,
    pub address: Option<i64>,
    pub remaining_cycles: u32,
    pub rob_index: Option<usize>,
    pub pc: Option<usize>,
    pub speculative: bool,
    pub predicted_taken: Option<bool>,
    pub predicted_target: Option<usize>,
}

impl ReservationStation {
    fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            busy: false,
            op: None,
            vj: None,
            vk: None,
            qj: None,
            qk: None,
            address: None,
            remaining_cycles: 0,
            rob_index: None,
            pc: None,
            speculative: false,
            predicted_taken: None,
            predicted_target: None,
        }
    }

    pub fn is_waiting_on_operands(&self) -> bool {
        self.qj.is_some() || self.qk.is_some()
    }

    fn reset(&mut self) {
        let name = std::mem::take(&mut self.name);
        *self = ReservationStation::new(name);
    }

    #[allow(clippy::too_many_arguments)]
    fn issue(
        &mut self,
        instruction: &Instruction,
        rob_index: usize,
        pc: usize,
        vj: Option<i32>,
        qj: Option<usize>,
        vk: Option<i32>,
        qk: Option<usize>,
        address: Option<i64>,
        speculative: bool,
        predicted_taken: Option<bool>,
        predicted_target: Option<usize>,
    ) {
        self.busy = true;
        self.op = Some(instruction.op);
        self.vj = vj;
        self.qj = qj;
        self.vk = vk;
        self.qk = qk;
        self.address = address;
        self.remaining_cycles = instruction.latency + 1;
        self.rob_index = Some(rob_index);
        self.pc = Some(pc);
        self.speculative = speculative;
        self.predicted_taken = predicted_taken;
        self.predicted_target = predicted_target;
    }

    /// Forwards a completed result if this station was waiting on it.
    fn snoop(&mut self, producer_rob_index: usize, value: i32) {
        if self.qj == Some(producer_rob_index) {
            self.vj = Some(value);
            self.qj = None;
        }
        if self.qk == Some(producer_rob_index) {
            self.vk = Some(value);
            self.qk = None;
        }
    }

    /// Whether this station is actively executing this cycle: busy, with
    /// both operands available, regardless of whether it completes.
    fn is_active(&self) -> bool {
        self.busy && !self.is_waiting_on_operands()
    }

    /// Ticks one cycle. Returns `true` the cycle this station's operation
    /// completes (remaining_cycles reaches zero with both operands ready).
    fn tick(&mut self) -> bool {
        if !self.is_active() {
            return false;
        }
        if self.remaining_cycles > 0 {
            self.remaining_cycles -= 1;
        }
        self.remaining_cycles == 0
    }
}

pub struct ReservationStations {
    pub add: Vec<ReservationStation>,
    pub mul: Vec<ReservationStation>,
    pub mem: Vec<ReservationStation>,
}

impl ReservationStations {
    pub fn new(num_add: usize, num_mul: usize, num_mem: usize) -> Self {
        let add = (0..num_add).map(|i| ReservationStation::new(format!("Add{}", i))).collect();
        let mul = (0..num_mul).map(|i| ReservationStation::new(format!("Mul{}", i))).collect();
        let mem = (0..num_mem).map(|i| ReservationStation::new(format!("Mem{}", i))).collect();
        Self { add, mul, mem }
    }

    fn pool_mut(&mut self, class: StationClass) -> &mut Vec<ReservationStation> {
        match class {
            StationClass::Add => &mut self.add,
            StationClass::Mul => &mut self.mul,
            StationClass::Mem => &mut self.mem,
        }
    }

    pub fn find_free(&mut self, class: StationClass) -> Option<usize> {
        self.pool_mut(class).iter().position(|s| !s.busy)
    }

    pub fn station_mut(&mut self, class: StationClass, index: usize) -> &mut ReservationStation {
        &mut self.pool_mut(class)[index]
    }

    #[allow(clippy::too_many_arguments)]
    pub fn issue(
        &mut self,
        class: StationClass,
        index: usize,
        instruction: &Instruction,
        rob_index: usize,
        pc: usize,
        vj: Option<i32>,
        qj: Option<usize>,
        vk: Option<i32>,
        qk: Option<usize>,
        address: Option<i64>,
        speculative: bool,
        predicted_taken: Option<bool>,
        predicted_target: Option<usize>,
    ) {
        self.station_mut(class, index).issue(
            instruction,
            rob_index,
            pc,
            vj,
            qj,
            vk,
            qk,
            address,
            speculative,
            predicted_taken,
            predicted_target,
        );
    }

    pub fn release(&mut self, class: StationClass, index: usize) {
        self.station_mut(class, index).reset();
    }

    /// Advances every busy station one cycle. Returns whether any station
    /// was actively executing this cycle (busy with both operands ready,
    /// whether or not it completed) alongside the stations that completed,
    /// as `(class, index)` -- a station counting down `remaining_cycles`
    /// without completing is still executing, not a bubble.
    pub fn tick_all(&mut self) -> (bool, Vec<(StationClass, usize)>) {
        let mut completed = Vec::new();
        let mut any_active = false;
        for (i, s) in self.add.iter_mut().enumerate() {
            any_active |= s.is_active();
            if s.tick() {
                completed.push((StationClass::Add, i));
            }
        }
        for (i, s) in self.mul.iter_mut().enumerate() {
            any_active |= s.is_active();
            if s.tick() {
                completed.push((StationClass::Mul, i));
            }
        }
        for (i, s) in self.mem.iter_mut().enumerate() {
            any_active |= s.is_active();
            if s.tick() {
                completed.push((StationClass::Mem, i));
            }
        }
        (any_active, completed)
    }

    /// Broadcasts a completed result to every station waiting on it.
    pub fn broadcast(&mut self, producer_rob_index: usize, value: i32) {
        for s in self.add.iter_mut().chain(self.mul.iter_mut()).chain(self.mem.iter_mut()) {
            s.snoop(producer_rob_index, value);
        }
    }

    /// Releases every busy station whose backing reorder-buffer entry has
    /// been flushed. Matches `SpeculationManager::flush_after`'s record set
    /// rather than re-deriving it from `pc > branch_pc`: a predicted-taken
    /// branch with a backward target can speculatively issue a station at
    /// `pc <= branch_pc` whose rob entry still ends up flushed on
    /// misprediction, and a raw pc comparison would leave it busy.
    pub fn flush_after_pc(&mut self, rob: &ReorderBuffer) {
        for s in self.add.iter_mut().chain(self.mul.iter_mut()).chain(self.mem.iter_mut()) {
            if !s.busy {
                continue;
            }
            let flushed = s.rob_index.and_then(|idx| rob.get(idx)).map(|e| e.flushed).unwrap_or(false);
            if flushed {
                let name = std::mem::take(&mut s.name);
                *s = ReservationStation::new(name);
            }
        }
    }

    pub fn all(&self) -> impl Iterator<Item = &ReservationStation> {
        self.add.iter().chain(self.mul.iter()).chain(self.mem.iter())
    }
}
