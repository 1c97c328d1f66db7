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

// logger.rs
//
// A small CLI-facing logger, separate from the `log` crate events the core
// emits internally (see processor.rs). This one formats the end-of-run
// summary the binary prints, using color to make pass/fail states in the
// metrics easy to scan.

use std::fs::File;
use std::io::Write;

use colored::Colorize;

pub struct Logger {
    pub file: Option<File>,
    pub level: LogLevel,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
}

impl Logger {
    pub fn new(file_path: Option<&str>, level: LogLevel) -> Self {
        let file = file_path.map(|path| File::create(path).expect("failed to create log file"));
        Self { file, level }
    }

    pub fn log(&mut self, level: LogLevel, message: &str) {
        if level < self.level {
            return;
        }
        if let Some(file) = &mut self.file {
            writeln!(file, "[{:?}] {}", level, message).expect("failed to write log file");
        } else {
            let line = format!("[{:?}] {}", level, message);
            let colored = match level {
                LogLevel::Debug => line.dimmed().to_string(),
                LogLevel::Info => line.normal().to_string(),
                LogLevel::Warning => line.yellow().to_string(),
                LogLevel::Error => line.red().bold().to_string(),
            };
            // stderr, not stdout: keeps stdout free for the machine-readable
            // `--json` snapshot the caller may be piping elsewhere.
            eprintln!("{}", colored);
        }
    }

    pub fn debug(&mut self, message: &str) {
        self.log(LogLevel::Debug, message);
    }

    pub fn info(&mut self, message: &str) {
        self.log(LogLevel::Info, message);
    }

    pub fn warning(&mut self, message: &str) {
        self.log(LogLevel::Warning, message);
    }

    pub fn error(&mut self, message: &str) {
        self.log(LogLevel::Error, message);
    }
}
