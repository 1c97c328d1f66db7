// branch_predictor.rs
//
// A branch target buffer combined with a 2-bit saturating counter indexed
// by global history. On a BTB hit the predicted target comes straight from
// the buffer; on a miss, direction is taken from the pattern table and the
// target defaults to fall-through until the branch resolves.

use std::collections::HashMap;

use serde::Serialize;

use crate::instruction::Op;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PredictionState {
    StronglyNotTaken,
    WeaklyNotTaken,
    WeaklyTaken,
    StronglyTaken,
}

impl PredictionState {
    pub fn is_taken(self) -> bool {
        matches!(self, PredictionState::WeaklyTaken | PredictionState::StronglyTaken)
    }

    fn update(self, taken: bool) -> Self {
        use PredictionState::*;
        match (self, taken) {
            (StronglyNotTaken, true) => WeaklyNotTaken,
            (WeaklyNotTaken, true) => WeaklyTaken,
            (WeaklyTaken, true) => StronglyTaken,
            (StronglyTaken, true) => StronglyTaken,
            (StronglyNotTaken, false) => StronglyNotTaken,
            (WeaklyNotTaken, false) => StronglyNotTaken,
            (WeaklyTaken, false) => WeaklyNotTaken,
            (StronglyTaken, false) => WeaklyTaken,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BtbEntry {
    pub tag: usize,
    pub target: usize,
    pub state: PredictionState,
    pub last_outcome: Option<bool>,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct BranchPrediction {
    pub taken: bool,
    pub target: usize,
    pub confidence: f64,
    pub btb_hit: bool,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct BranchPredictorStats {
    pub predictions: u64,
    pub correct: u64,
    pub btb_hits: u64,
    pub btb_misses: u64,
}

pub struct BranchPredictor {
    btb: HashMap<usize, BtbEntry>,
    btb_size: usize,
    history_bits: u8,
    global_history: u32,
    pattern_table: Vec<PredictionState>,
    beq_taken_bias: bool,
    stats: BranchPredictorStats,
}

impl BranchPredictor {
    pub fn new(btb_size: usize, history_bits: u8, beq_taken_bias: bool) -> Self {
        let pattern_table_size = 1usize << history_bits;
        Self {
            btb: HashMap::new(),
            btb_size,
            history_bits,
            global_history: 0,
            pattern_table: vec![PredictionState::WeaklyNotTaken; pattern_table_size],
            beq_taken_bias,
            stats: BranchPredictorStats::default(),
        }
    }

    fn history_mask(&self) -> u32 {
        (1u32 << self.history_bits) - 1
    }

    pub fn predict(&mut self, pc: usize, op: Op) -> BranchPrediction {
        self.stats.predictions += 1;
        if let Some(entry) = self.btb.get(&pc) {
            self.stats.btb_hits += 1;
            let confidence = match entry.state {
                PredictionState::StronglyNotTaken | PredictionState::StronglyTaken => 0.9,
                _ => 0.6,
            };
            return BranchPrediction {
                taken: entry.state.is_taken(),
                target: entry.target,
                confidence,
                btb_hit: true,
            };
        }
        self.stats.btb_misses += 1;
        let index = (self.global_history & self.history_mask()) as usize;
        let counter = self.pattern_table[index];
        let mut taken = counter.is_taken();
        // Cold-start heuristic: many BEQ loop back-edges trend taken; when
        // the global counter is ambivalent (weakly-not-taken) and nothing
        // is in the BTB yet, guess taken for BEQ specifically. Off by
        // default -- see ProcessorConfig::beq_taken_bias.
        if self.beq_taken_bias && op == Op::Beq && counter == PredictionState::WeaklyNotTaken {
            taken = true;
        }
        BranchPrediction {
            taken,
            target: pc + 1,
            confidence: 0.6,
            btb_hit: false,
        }
    }

    pub fn update(&mut self, pc: usize, actual_taken: bool, actual_target: usize, prediction: BranchPrediction) {
        if actual_taken == prediction.taken && (!actual_taken || actual_target == prediction.target) {
            self.stats.correct += 1;
        }
        self.update_btb(pc, actual_taken, actual_target);
        let index = (self.global_history & self.history_mask()) as usize;
        self.pattern_table[index] = self.pattern_table[index].update(actual_taken);
        self.global_history = ((self.global_history << 1) | (actual_taken as u32)) & self.history_mask();
    }

    fn update_btb(&mut self, pc: usize, actual_taken: bool, actual_target: usize) {
        if !self.btb.contains_key(&pc) && self.btb.len() >= self.btb_size {
            if let Some(&evict) = self.btb.keys().min() {
                self.btb.remove(&evict);
            }
        }
        let state = self
            .btb
            .get(&pc)
            .map(|e| e.state)
            .unwrap_or(PredictionState::WeaklyNotTaken)
            .update(actual_taken);
        self.btb.insert(
            pc,
            BtbEntry {
                tag: pc,
                target: actual_target,
                state,
                last_outcome: Some(actual_taken),
            },
        );
    }

    pub fn accuracy(&self) -> f64 {
        if self.stats.predictions == 0 {
            0.0
        } else {
            self.stats.correct as f64 / self.stats.predictions as f64
        }
    }

    pub fn btb_hit_rate(&self) -> f64 {
        let total = self.stats.btb_hits + self.stats.btb_misses;
        if total == 0 {
            0.0
        } else {
            self.stats.btb_hits as f64 / total as f64
        }
    }

    pub fn stats(&self) -> &BranchPredictorStats {
        &self.stats
    }
}
