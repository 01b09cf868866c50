//! This module defines the core data structures and types used throughout the Turing Machine
//! engine, including program representation, transitions, halting outcomes, and error types.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use thiserror::Error;

use crate::Rule;

/// The default blank symbol used on the Turing Machine tapes.
pub const DEFAULT_BLANK_SYMBOL: char = '_';
/// A special input symbol used in program text to represent the blank symbol.
pub const INPUT_BLANK_SYMBOL: char = '_';
/// The default initial state for programs that don't name one.
pub const DEFAULT_INITIAL_STATE: &str = "q0";
/// The maximum allowed size for a Turing Machine program in bytes.
pub const MAX_PROGRAM_SIZE: usize = 65536; // 64KB
/// The default step budget of a run.
pub const DEFAULT_MAX_STEPS: usize = 1000;
/// The hard ceiling on the step budget a host accepts.
pub const MAX_EXECUTION_STEPS: usize = 1_000_000;
/// The maximum number of tapes a host accepts.
pub const MAX_TAPES: usize = 10;
/// How far outside its initial content a head may start.
pub const MAX_HEAD_OFFSET: i64 = 10_000;

/// Represents a Turing Machine program, supporting both single and multi-tape configurations.
///
/// A program defines the initial setup of the machine and its transition rules. It is
/// built once per run and never mutated by the engine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Program {
    /// The name of the Turing Machine program.
    pub name: String,
    /// The initial state of the Turing Machine.
    pub initial_state: String,
    /// States in which halting counts as acceptance.
    pub final_states: BTreeSet<String>,
    /// The blank symbol used on the tapes.
    pub blank: char,
    /// One string per tape holding its initial content, starting at position 0.
    pub tapes: Vec<String>,
    /// The initial head position of each tape.
    pub heads: Vec<i64>,
    /// The number of tapes every rule and configuration must address.
    pub num_tapes: usize,
    /// Transition rules in declaration order.
    pub rules: Vec<Transition>,
    /// The step budget of a run.
    pub max_steps: usize,
    /// Whether repeated configurations end the run.
    pub detect_loops: bool,
}

impl Program {
    /// Returns the initial content of the first tape as a `String`.
    /// This is a convenience method for single-tape compatibility.
    pub fn initial_tape(&self) -> String {
        self.tapes.first().cloned().unwrap_or_default()
    }

    /// Returns the initial head position of the first tape.
    pub fn head_position(&self) -> i64 {
        self.heads.first().copied().unwrap_or(0)
    }

    /// Checks if the program is configured for a single-tape Turing Machine.
    pub fn is_single_tape(&self) -> bool {
        self.num_tapes == 1
    }

    /// Returns true if `state` is one of the accepting states.
    pub fn is_final(&self, state: &str) -> bool {
        self.final_states.contains(state)
    }

    /// Returns every state mentioned by the program, sorted.
    pub fn states(&self) -> BTreeSet<&str> {
        let mut states: BTreeSet<&str> = self
            .rules
            .iter()
            .flat_map(|t| [t.state.as_str(), t.next_state.as_str()])
            .collect();
        states.insert(&self.initial_state);
        states.extend(self.final_states.iter().map(String::as_str));
        states
    }

    /// Replaces the initial tape contents, e.g. with user input.
    ///
    /// Head positions are kept; the tape count is checked when a machine is built.
    pub fn with_tapes<I, S>(mut self, tapes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tapes = tapes.into_iter().map(Into::into).collect();
        self
    }
}

/// Represents a single transition rule for a Turing Machine.
///
/// A transition defines how the machine behaves when it is in `state`
/// and reads `read` from its tapes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transition {
    /// The state this rule applies to.
    pub state: String,
    /// A vector of characters to be read from each tape.
    pub read: Vec<char>,
    /// A vector of characters to be written to each tape.
    pub write: Vec<char>,
    /// A vector of directions for each tape's head to move after the transition.
    pub directions: Vec<Direction>,
    /// The next state the machine transitions to.
    pub next_state: String,
}

impl Transition {
    /// Checks that the rule addresses exactly `num_tapes` tapes.
    ///
    /// `index` is the rule's position in declaration order and is only used for reporting.
    pub fn check_arity(&self, index: usize, num_tapes: usize) -> Result<(), StructuralError> {
        if self.read.len() == num_tapes
            && self.write.len() == num_tapes
            && self.directions.len() == num_tapes
        {
            return Ok(());
        }

        Err(StructuralError::RuleArity {
            index,
            state: self.state.clone(),
            read: self.read.len(),
            write: self.write.len(),
            moves: self.directions.len(),
            expected: num_tapes,
        })
    }

    /// A human-readable summary of the rule's effect, e.g. `write 1, move R, goto q1`.
    pub fn describe(&self) -> String {
        if let ([write], [direction]) = (self.write.as_slice(), self.directions.as_slice()) {
            return format!("write {write}, move {direction}, goto {}", self.next_state);
        }

        let writes = self
            .write
            .iter()
            .map(char::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        let moves = self
            .directions
            .iter()
            .map(Direction::to_string)
            .collect::<Vec<_>>()
            .join(", ");

        format!("write [{writes}], move [{moves}], goto {}", self.next_state)
    }
}

/// Represents the possible directions a Turing Machine head can move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Move the head one position to the left.
    #[serde(rename = "L")]
    Left,
    /// Move the head one position to the right.
    #[serde(rename = "R")]
    Right,
    /// Keep the head in the same position.
    #[serde(rename = "N", alias = "S")]
    Stay,
}

impl Direction {
    /// The signed head displacement of this move.
    pub fn offset(self) -> i64 {
        match self {
            Direction::Left => -1,
            Direction::Right => 1,
            Direction::Stay => 0,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Direction::Left => "L",
            Direction::Right => "R",
            Direction::Stay => "N",
        })
    }
}

/// Represents the outcome of a Turing Machine execution step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// The machine successfully performed a step and continues execution.
    Continue,
    /// The machine has halted and will not move again.
    Halt(HaltReason),
}

/// Why a run stopped. Every variant is a normal outcome, not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HaltReason {
    /// No rule matched and the machine was in a final state.
    Accepted,
    /// No rule matched and the machine was not in a final state.
    Rejected,
    /// The step budget ran out.
    StepLimit,
    /// A configuration produced by a step had been seen before.
    LoopDetected,
}

impl HaltReason {
    /// Returns true only for [`HaltReason::Accepted`].
    pub fn is_accepted(self) -> bool {
        self == HaltReason::Accepted
    }
}

impl fmt::Display for HaltReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            HaltReason::Accepted => "accepted",
            HaltReason::Rejected => "rejected",
            HaltReason::StepLimit => "step_limit",
            HaltReason::LoopDetected => "loop_detected",
        })
    }
}

/// Problems with a program's shape. These are reported before any step runs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StructuralError {
    /// The program declares no tapes at all.
    #[error("No tapes defined")]
    NoTapes,
    /// The number of initial tapes differs from the declared tape count.
    #[error("Expected {expected} initial tapes, got {actual}")]
    TapeCount { expected: usize, actual: usize },
    /// The number of head positions differs from the declared tape count.
    #[error("Number of head positions ({actual}) does not match number of tapes ({expected})")]
    HeadCount { expected: usize, actual: usize },
    /// A head starts too far outside its tape's initial content.
    #[error("Head {tape} starts at {position}, more than {limit} cells outside its tape")]
    HeadOutOfRange { tape: usize, position: i64, limit: i64 },
    /// A rule reads, writes or moves a different number of tapes than declared.
    #[error(
        "Transition #{index} in state '{state}' has {read} read symbols, {write} write symbols \
         and {moves} moves; expected {expected} of each"
    )]
    RuleArity {
        index: usize,
        state: String,
        read: usize,
        write: usize,
        moves: usize,
        expected: usize,
    },
    /// The program has no accepting states.
    #[error("At least one final state is required")]
    NoFinalStates,
    /// The step budget is zero.
    #[error("Step budget must be at least 1")]
    ZeroStepBudget,
}

/// Represents various errors that can occur during Turing Machine operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TuringMachineError {
    /// The program is malformed; no step was run.
    #[error("Structural error: {0}")]
    Structural(#[from] StructuralError),
    /// Indicates an error during the parsing of a Turing Machine program definition.
    #[error("Program parsing error: {0}")]
    ParseError(#[from] Box<pest::error::Error<Rule>>),
    /// Indicates an error during the validation of a Turing Machine program's structure or logic.
    #[error("Program validation error: {0}")]
    ValidationError(String),
    /// A request document could not be decoded.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
    /// Indicates an error related to file system operations, such as reading program files.
    #[error("File error: {0}")]
    FileError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(read: &[char], write: &[char], directions: &[Direction]) -> Transition {
        Transition {
            state: "q0".to_string(),
            read: read.to_vec(),
            write: write.to_vec(),
            directions: directions.to_vec(),
            next_state: "q1".to_string(),
        }
    }

    #[test]
    fn test_direction_serialization() {
        let left_json = serde_json::to_string(&Direction::Left).unwrap();
        let stay_json = serde_json::to_string(&Direction::Stay).unwrap();

        assert_eq!(left_json, "\"L\"");
        assert_eq!(stay_json, "\"N\"");

        let right: Direction = serde_json::from_str("\"R\"").unwrap();
        let stay: Direction = serde_json::from_str("\"S\"").unwrap();

        assert_eq!(right, Direction::Right);
        assert_eq!(stay, Direction::Stay);
    }

    #[test]
    fn test_halt_reason_wire_names() {
        assert_eq!(
            serde_json::to_string(&HaltReason::StepLimit).unwrap(),
            "\"step_limit\""
        );
        assert_eq!(
            serde_json::to_string(&HaltReason::LoopDetected).unwrap(),
            "\"loop_detected\""
        );
        assert_eq!(HaltReason::Rejected.to_string(), "rejected");
        assert!(HaltReason::Accepted.is_accepted());
        assert!(!HaltReason::StepLimit.is_accepted());
    }

    #[test]
    fn test_describe_single_tape() {
        let t = rule(&['0'], &['1'], &[Direction::Right]);
        assert_eq!(t.describe(), "write 1, move R, goto q1");
    }

    #[test]
    fn test_describe_multi_tape() {
        let t = rule(&['a', '_'], &['a', 'a'], &[Direction::Right, Direction::Stay]);
        assert_eq!(t.describe(), "write [a, a], move [R, N], goto q1");
    }

    #[test]
    fn test_check_arity() {
        let t = rule(&['a', 'b'], &['a'], &[Direction::Right, Direction::Right]);

        assert!(rule(&['a'], &['b'], &[Direction::Left]).check_arity(0, 1).is_ok());
        assert_eq!(
            t.check_arity(3, 2),
            Err(StructuralError::RuleArity {
                index: 3,
                state: "q0".to_string(),
                read: 2,
                write: 1,
                moves: 2,
                expected: 2,
            })
        );
    }

    #[test]
    fn test_error_display() {
        let error = TuringMachineError::from(StructuralError::NoFinalStates);

        let error_msg = format!("{}", error);
        assert!(error_msg.contains("Structural error"));
        assert!(error_msg.contains("final state"));
    }
}
