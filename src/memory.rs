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

// memory.rs
//
// An abstract address -> word data memory. No caches, no regions, no
// alignment rules -- the processor's LD/ST only need a sparse integer map.

use std::collections::HashMap;

#[derive(Debug, Clone, Default)]
pub struct Memory {
    words: HashMap<i64, i32>,
}

impl Memory {
    pub fn new() -> Self {
        Self { words: HashMap::new() }
    }

    /// Reads may happen before `write` ever touches an address; those reads
    /// are architecturally zero, not an error.
    pub fn read(&self, addr: i64) -> i32 {
        self.words.get(&addr).copied().unwrap_or(0)
    }

    pub fn write(&mut self, addr: i64, value: i32) {
        self.words.insert(addr, value);
    }

    /// Seeds memory before a run without going through the timing model --
    /// used to set up test fixtures the way the seed scenarios describe.
    pub fn preload(&mut self, addr: i64, value: i32) {
        self.write(addr, value);
    }
}
