//! Execution trace records and the result of a completed run.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::machine::Configuration;
use crate::types::{HaltReason, Transition};

/// A snapshot taken just before a transition was applied.
///
/// Snapshots own their data; later steps never change a recorded entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionStep {
    /// Zero-based index of the transition this entry precedes.
    pub step_number: usize,
    /// The state before the transition.
    pub current_state: String,
    /// Materialized tape windows before the transition.
    pub tape_contents: Vec<String>,
    /// Position of the first character of each entry in `tape_contents`.
    pub tape_origins: Vec<i64>,
    /// Head positions before the transition.
    pub head_positions: Vec<i64>,
    /// Symbols under the heads, i.e. the lookup key.
    pub symbols_read: Vec<char>,
    /// What the applied rule did, e.g. `write 1, move R, goto q1`.
    pub action_taken: String,
}

impl ExecutionStep {
    pub(crate) fn capture(
        step_number: usize,
        configuration: &Configuration,
        symbols_read: Vec<char>,
        rule: &Transition,
    ) -> Self {
        let (tape_origins, tape_contents): (Vec<i64>, Vec<String>) = configuration
            .tapes()
            .iter()
            .map(|tape| {
                let window = tape.window();
                (window.origin, window.content)
            })
            .unzip();

        Self {
            step_number,
            current_state: configuration.state().to_string(),
            tape_contents,
            tape_origins,
            head_positions: configuration.heads().to_vec(),
            symbols_read,
            action_taken: rule.describe(),
        }
    }
}

/// Everything a finished run produced.
#[derive(Debug, Clone)]
pub struct Execution {
    /// Why the run stopped.
    pub halt: HaltReason,
    /// The configuration the machine stopped in.
    pub configuration: Configuration,
    /// Number of transitions applied.
    pub total_steps: usize,
    /// One entry per applied transition, in order.
    pub steps: Vec<ExecutionStep>,
    /// Wall time spent running. Not part of the deterministic result.
    pub elapsed: Duration,
}

impl Execution {
    pub fn accepted(&self) -> bool {
        self.halt.is_accepted()
    }

    pub fn final_state(&self) -> &str {
        self.configuration.state()
    }

    /// Materialized final tapes.
    pub fn final_tapes(&self) -> Vec<String> {
        self.configuration
            .tapes()
            .iter()
            .map(|tape| tape.contents())
            .collect()
    }

    /// A short human-readable summary of the outcome.
    pub fn message(&self) -> String {
        match self.halt {
            HaltReason::Accepted => format!("Accepted in state {}", self.final_state()),
            HaltReason::Rejected => format!("Rejected in state {}", self.final_state()),
            HaltReason::StepLimit => {
                format!("Stopped after {} steps (step limit)", self.total_steps)
            }
            HaltReason::LoopDetected => format!(
                "Infinite loop detected at step {} (configuration repeated)",
                self.total_steps
            ),
        }
    }
}
