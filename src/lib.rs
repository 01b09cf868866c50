//! This crate provides a deterministic multi-tape Turing Machine engine.
//! It includes modules for describing programs, parsing `.tur` files and JSON requests,
//! analyzing program structure, and running machines with loop detection and a full
//! execution trace.

pub mod analyzer;
pub mod config;
pub mod detector;
pub mod loader;
pub mod machine;
pub mod parser;
pub mod programs;
pub mod request;
pub mod table;
pub mod tape;
pub mod trace;
pub mod types;

/// Re-exports the `Rule` enum from the parser module, used by the `pest` grammar.
pub use crate::parser::Rule;
/// Re-exports the structural checks and lints from the analyzer module.
pub use analyzer::{analyze, lint, Diagnostic};
/// Re-exports the host limits.
pub use config::Limits;
/// Re-exports the repeated-configuration detector.
pub use detector::{Fingerprint, LoopDetector};
/// Re-exports the `ProgramLoader` struct from the loader module.
pub use loader::ProgramLoader;
/// Re-exports the machine and its configuration.
pub use machine::{Configuration, TuringMachine};
/// Re-exports the `parse` function from the parser module.
pub use parser::parse;
/// Re-exports `ProgramInfo`, `ProgramManager`, and `PROGRAMS` from the programs module.
pub use programs::{ProgramInfo, ProgramManager, PROGRAMS};
/// Re-exports the JSON request and response documents.
pub use request::{simulate, RequestTransition, SimulationRequest, SimulationResponse};
/// Re-exports the transition table.
pub use table::TransitionTable;
/// Re-exports the tape and its materialized window.
pub use tape::{Tape, Window};
/// Re-exports the trace records.
pub use trace::{Execution, ExecutionStep};
/// Re-exports various types related to Turing Machine definition and execution from the types module.
pub use types::{
    Direction, HaltReason, Program, Step, StructuralError, Transition, TuringMachineError,
    MAX_HEAD_OFFSET, MAX_PROGRAM_SIZE,
};
