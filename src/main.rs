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

// main.rs
//
// Command-line driver: parses a program file, builds a processor from the
// CLI flags, runs it to completion (or a cycle cap), and reports metrics
// either as a human-readable summary or as a JSON state snapshot.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tomasulo_sim::logger::{LogLevel, Logger};
use tomasulo_sim::{parse_program, ProcessorConfig};

#[derive(Parser)]
#[command(name = "tomasulo_sim")]
#[command(about = "A Tomasulo dynamic scheduling simulator with register renaming and branch speculation")]
#[command(version)]
struct Cli {
    /// Assembly program to run
    #[arg(short, long)]
    input: PathBuf,

    /// Number of Add/Sub/branch reservation stations
    #[arg(long, default_value_t = 3)]
    add_stations: usize,

    /// Number of Mul/Div reservation stations
    #[arg(long, default_value_t = 3)]
    mul_stations: usize,

    /// Number of load/store reservation stations
    #[arg(long, default_value_t = 2)]
    mem_stations: usize,

    /// Reorder buffer capacity
    #[arg(long, default_value_t = 8)]
    rob_size: usize,

    /// Maximum instructions issued per cycle
    #[arg(long, default_value_t = 4)]
    issue_width: usize,

    /// Disable branch speculation (stall on every branch instead)
    #[arg(long)]
    no_speculation: bool,

    /// Branch target buffer capacity
    #[arg(long, default_value_t = 16)]
    btb_size: usize,

    /// Width of the global history register, in bits
    #[arg(long, default_value_t = 4)]
    history_bits: u8,

    /// Bias BEQ toward taken on a cold predictor miss
    #[arg(long)]
    beq_taken_bias: bool,

    /// Consecutive-bubble deadlock threshold
    #[arg(long, default_value_t = 30)]
    bubble_threshold: u64,

    /// Cycle cap, independent of the deadlock watchdog
    #[arg(long, default_value_t = 100_000)]
    max_cycles: u64,

    /// Log level for the run summary (error, warn, info, debug)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Write the run summary to a file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Print the full processor state as JSON instead of a summary
    #[arg(long)]
    json: bool,
}

fn parse_log_level(s: &str) -> LogLevel {
    match s.to_lowercase().as_str() {
        "error" => LogLevel::Error,
        "warn" | "warning" => LogLevel::Warning,
        "debug" => LogLevel::Debug,
        _ => LogLevel::Info,
    }
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();
    let mut logger = Logger::new(cli.output.as_ref().map(|p| p.to_string_lossy().to_string()).as_deref(), parse_log_level(&cli.log_level));

    let text = match std::fs::read_to_string(&cli.input) {
        Ok(text) => text,
        Err(e) => {
            logger.error(&format!("failed to read {}: {}", cli.input.display(), e));
            return ExitCode::FAILURE;
        },
    };

    let instructions = match parse_program(&text) {
        Ok(instructions) => instructions,
        Err(e) => {
            logger.error(&format!("{}", e));
            return ExitCode::FAILURE;
        },
    };

    let config = ProcessorConfig::new()
        .with_station_counts(cli.add_stations, cli.mul_stations, cli.mem_stations)
        .with_rob_size(cli.rob_size)
        .with_speculation(!cli.no_speculation)
        .with_max_issue_per_cycle(cli.issue_width)
        .with_btb(cli.btb_size, cli.history_bits)
        .with_beq_taken_bias(cli.beq_taken_bias)
        .with_bubble_threshold(cli.bubble_threshold);

    let mut processor = tomasulo_sim::Processor::new(config);
    processor.load(instructions);

    logger.info(&format!("loaded {}", cli.input.display()));

    loop {
        match processor.step() {
            Ok(true) => {
                if processor.cycle() >= cli.max_cycles {
                    logger.warning(&format!("reached cycle cap ({})", cli.max_cycles));
                    break;
                }
            },
            Ok(false) => break,
            Err(e) => {
                logger.error(&format!("simulation halted: {}", e));
                return ExitCode::FAILURE;
            },
        }
    }

    if cli.json {
        match serde_json::to_string_pretty(&processor.state()) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                logger.error(&format!("failed to serialize state: {}", e));
                return ExitCode::FAILURE;
            },
        }
    } else {
        let metrics = processor.metrics();
        logger.info(&format!(
            "cycles={} committed={}/{} ipc={:.3} bubble_cycles={}",
            metrics.total_cycles, metrics.committed_instructions, metrics.total_instructions, metrics.ipc, metrics.bubble_cycles
        ));
        logger.info(&format!(
            "mispredictions={} branch_accuracy={:.3} btb_hit_rate={:.3}",
            metrics.mispredictions, metrics.branch_prediction_accuracy, metrics.btb_hit_rate
        ));
    }

    ExitCode::SUCCESS
}
