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

// config.rs
//
// Construction options for the Tomasulo processor: reservation station pool
// sizes, reorder buffer capacity, issue width, and branch predictor shape.

use std::collections::HashMap;

use crate::instruction::Op;

/// Per-op execute latency, in cycles. Missing ops fall back to
/// [`ProcessorConfig::default_latency`].
#[derive(Debug, Clone)]
pub struct LatencyTable {
    overrides: HashMap<Op, u32>,
}

impl LatencyTable {
    pub fn new() -> Self {
        Self { overrides: HashMap::new() }
    }

    pub fn with_latency(mut self, op: Op, cycles: u32) -> Self {
        assert!(cycles > 0, "latency must be positive");
        self.overrides.insert(op, cycles);
        self
    }

    pub fn get(&self, op: Op) -> u32 {
        self.overrides.get(&op).copied().unwrap_or_else(|| op.default_latency())
    }
}

impl Default for LatencyTable {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone)]
pub struct ProcessorConfig {
    pub latencies: LatencyTable,
    pub num_add_stations: usize,
    pub num_mul_stations: usize,
    pub num_mem_stations: usize,
    pub rob_size: usize,
    pub enable_speculation: bool,
    pub max_issue_per_cycle: usize,
    pub btb_size: usize,
    pub history_bits: u8,
    /// Cold-start heuristic: bias BEQ toward taken when the pattern table is
    /// weakly-not-taken. Off by default; see the branch predictor module.
    pub beq_taken_bias: bool,
    pub bubble_threshold: u64,
}

impl ProcessorConfig {
    pub fn new() -> Self {
        Self {
            latencies: LatencyTable::new(),
            num_add_stations: 3,
            num_mul_stations: 3,
            num_mem_stations: 2,
            rob_size: 8,
            enable_speculation: true,
            max_issue_per_cycle: 4,
            btb_size: 16,
            history_bits: 4,
            beq_taken_bias: false,
            bubble_threshold: 30,
        }
    }

    pub fn with_latencies(mut self, latencies: LatencyTable) -> Self {
        self.latencies = latencies;
        self
    }

    pub fn with_station_counts(mut self, add: usize, mul: usize, mem: usize) -> Self {
        assert!(add > 0 && mul > 0 && mem > 0, "station pools must be non-empty");
        self.num_add_stations = add;
        self.num_mul_stations = mul;
        self.num_mem_stations = mem;
        self
    }

    pub fn with_rob_size(mut self, size: usize) -> Self {
        assert!(size > 0, "rob size must be positive");
        self.rob_size = size;
        self
    }

    pub fn with_speculation(mut self, enabled: bool) -> Self {
        self.enable_speculation = enabled;
        self
    }

    pub fn with_max_issue_per_cycle(mut self, width: usize) -> Self {
        assert!(width > 0, "issue width must be positive");
        self.max_issue_per_cycle = width;
        self
    }

    pub fn with_btb(mut self, btb_size: usize, history_bits: u8) -> Self {
        assert!(btb_size > 0, "btb size must be positive");
        assert!(history_bits > 0 && history_bits <= 16, "history_bits out of range");
        self.btb_size = btb_size;
        self.history_bits = history_bits;
        self
    }

    pub fn with_beq_taken_bias(mut self, enabled: bool) -> Self {
        self.beq_taken_bias = enabled;
        self
    }

    pub fn with_bubble_threshold(mut self, threshold: u64) -> Self {
        assert!(threshold > 0, "bubble threshold must be positive");
        self.bubble_threshold = threshold;
        self
    }
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self::new()
    }
}
