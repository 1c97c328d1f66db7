use std::error::Error;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimulatorError {
    // Execution errors
    DivideByZero { pc: usize, rob_index: usize },

    // Scheduler invariants (should never escape a correct Issue stage)
    RobOverflow,
    NoFreePhysicalRegister { logical: String },

    // Front-end errors
    ParseError { line: usize, text: String },

    // Liveness watchdog
    Deadlock { cycle: u64, bubble_cycles: u64 },
}

impl fmt::Display for SimulatorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimulatorError::DivideByZero { pc, rob_index } => {
                write!(f, "division by zero at pc={} (rob index {})", pc, rob_index)
            },
            SimulatorError::RobOverflow => write!(f, "reorder buffer overflow"),
            SimulatorError::NoFreePhysicalRegister { logical } => {
                write!(f, "no free physical register to rename {}", logical)
            },
            SimulatorError::ParseError { line, text } => {
                write!(f, "parse error on line {}: {}", line, text)
            },
            SimulatorError::Deadlock { cycle, bubble_cycles } => write!(
                f,
                "deadlock detected at cycle {}: {} consecutive bubble cycles",
                cycle, bubble_cycles
            ),
        }
    }
}

impl Error for SimulatorError {}
