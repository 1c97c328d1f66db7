// rob.rs
//
// The reorder buffer: a circular queue that lets instructions execute out
// of order but commit architectural state strictly in program order.
// Indices into this buffer double as the tags broadcast on the result bus,
// so a station holding a Qj/Qk names a ROB slot directly rather than a
// station name.

use serde::Serialize;

use crate::instruction::{Instruction, Register};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RobState {
    Issue,
    Execute,
    WriteResult,
    Commit,
}

#[derive(Debug, Clone, Serialize)]
pub struct RobEntry {
    pub instruction: Instruction,
    pub state: RobState,
    pub destination: Option<Register>,
    pub value: Option<i32>,
    pub ready: bool,
    pub speculative: bool,
    pub flushed: bool,
    pub old_phys: Option<usize>,
    /// The destination register's producer tag immediately before this
    /// entry's issue renamed it -- restored on flush so a rewind doesn't
    /// leave the register waiting on a producer that will never broadcast.
    pub old_producer: Option<usize>,
    pub pc: usize,
    pub actual_taken: Option<bool>,
    pub actual_target: Option<usize>,
}

impl RobEntry {
    fn new(instruction: Instruction, destination: Option<Register>, speculative: bool, pc: usize) -> Self {
        Self {
            instruction,
            state: RobState::Issue,
            destination,
            value: None,
            ready: false,
            speculative,
            flushed: false,
            old_phys: None,
            old_producer: None,
            pc,
            actual_taken: None,
            actual_target: None,
        }
    }

    pub fn can_commit(&self) -> bool {
        self.ready && !self.flushed
    }
}

pub struct ReorderBuffer {
    entries: Vec<Option<RobEntry>>,
    head: usize,
    tail: usize,
    count: usize,
    capacity: usize,
}

impl ReorderBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: vec![None; capacity],
            head: 0,
            tail: 0,
            count: 0,
            capacity,
        }
    }

    pub fn is_full(&self) -> bool {
        self.count == self.capacity
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn len(&self) -> usize {
        self.count
    }

    /// Allocates a slot at the tail. Callers must check `is_full()` first;
    /// Issue never lets this be called on a full buffer.
    pub fn add_entry(
        &mut self,
        instruction: Instruction,
        destination: Option<Register>,
        speculative: bool,
        pc: usize,
    ) -> usize {
        debug_assert!(!self.is_full(), "add_entry called on a full reorder buffer");
        let index = self.tail;
        self.entries[index] = Some(RobEntry::new(instruction, destination, speculative, pc));
        self.tail = (self.tail + 1) % self.capacity;
        self.count += 1;
        index
    }

    pub fn update_entry(&mut self, index: usize, value: i32) {
        if let Some(entry) = self.entries[index].as_mut() {
            if !entry.flushed {
                entry.value = Some(value);
                entry.ready = true;
                entry.state = RobState::WriteResult;
            }
        }
    }

    pub fn mark_flushed(&mut self, index: usize) {
        if let Some(entry) = self.entries[index].as_mut() {
            entry.flushed = true;
        }
    }

    pub fn mark_resolved(&mut self, index: usize, actual_taken: bool, actual_target: usize) {
        if let Some(entry) = self.entries[index].as_mut() {
            entry.actual_taken = Some(actual_taken);
            entry.actual_target = Some(actual_target);
        }
    }

    pub fn confirm_speculative(&mut self, index: usize) {
        if let Some(entry) = self.entries[index].as_mut() {
            entry.speculative = false;
        }
    }

    pub fn get(&self, index: usize) -> Option<&RobEntry> {
        self.entries[index].as_ref()
    }

    pub fn entry_mut(&mut self, index: usize) -> Option<&mut RobEntry> {
        self.entries[index].as_mut()
    }

    /// Drops leading tombstones (flushed entries) from the head without
    /// treating them as a commit.
    pub fn cleanup_flushed(&mut self) -> usize {
        let mut removed = 0;
        while self.count > 0 {
            let flushed = self.entries[self.head].as_ref().map(|e| e.flushed).unwrap_or(false);
            if !flushed {
                break;
            }
            self.entries[self.head] = None;
            self.head = (self.head + 1) % self.capacity;
            self.count -= 1;
            removed += 1;
        }
        removed
    }

    /// Commits the head entry if it is ready. Assumes `cleanup_flushed` has
    /// already been called this cycle.
    pub fn commit(&mut self) -> Option<(usize, RobEntry)> {
        if self.count == 0 {
            return None;
        }
        let head = self.head;
        let ready = self.entries[head].as_ref().map(|e| e.can_commit()).unwrap_or(false);
        if !ready {
            return None;
        }
        let mut entry = self.entries[head].take().expect("checked Some above");
        entry.state = RobState::Commit;
        self.head = (self.head + 1) % self.capacity;
        self.count -= 1;
        Some((head, entry))
    }

    /// Entries from oldest to newest, with their slot index -- used both
    /// for the observation snapshot and for locating flush targets by PC.
    pub fn entries_in_order(&self) -> Vec<(usize, &RobEntry)> {
        let mut out = Vec::with_capacity(self.count);
        let mut idx = self.head;
        for _ in 0..self.count {
            if let Some(entry) = self.entries[idx].as_ref() {
                out.push((idx, entry));
            }
            idx = (idx + 1) % self.capacity;
        }
        out
    }
}
