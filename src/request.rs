//! JSON request and response documents exchanged with a host.
//!
//! Field names follow the snake_case wire format of the simulation endpoint. A request is
//! turned into a [`Program`] (checked against [`Limits`] and analyzed structurally) before
//! anything runs; the response flattens an [`Execution`].

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::analyzer::analyze;
use crate::config::Limits;
use crate::machine::TuringMachine;
use crate::trace::{Execution, ExecutionStep};
use crate::types::{
    Direction, HaltReason, Program, Transition, TuringMachineError, DEFAULT_BLANK_SYMBOL,
    DEFAULT_INITIAL_STATE, DEFAULT_MAX_STEPS,
};

fn default_blank() -> char {
    DEFAULT_BLANK_SYMBOL
}

fn default_initial_state() -> String {
    DEFAULT_INITIAL_STATE.to_string()
}

fn default_max_steps() -> usize {
    DEFAULT_MAX_STEPS
}

fn default_true() -> bool {
    true
}

/// A request to run one program.
///
/// Either `initial_tape` (single tape) or `initial_tapes` must be present; `initial_tapes`
/// wins when both are.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial_tape: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial_tapes: Option<Vec<String>>,
    /// Declared tape count. Defaults to the number of initial tapes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_tapes: Option<usize>,
    #[serde(default = "default_blank")]
    pub blank_symbol: char,
    #[serde(default = "default_initial_state")]
    pub initial_state: String,
    #[serde(default)]
    pub final_states: Vec<String>,
    #[serde(default)]
    pub transitions: Vec<RequestTransition>,
    #[serde(default = "default_max_steps")]
    pub max_steps: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub head_position: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub head_positions: Option<Vec<i64>>,
    #[serde(default = "default_true")]
    pub detect_loops: bool,
}

/// One transition in wire form: the single-tape fields or the multi-tape fields.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RequestTransition {
    pub current_state: String,
    pub next_state: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read_symbol: Option<char>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub write_symbol: Option<char>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub move_direction: Option<Direction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read_symbols: Option<Vec<char>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub write_symbols: Option<Vec<char>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub move_directions: Option<Vec<Direction>>,
}

impl RequestTransition {
    fn into_transition(self, index: usize) -> Result<Transition, TuringMachineError> {
        let missing = |field: &str| {
            TuringMachineError::ValidationError(format!(
                "Transition #{index} from state '{}' has no {field}",
                self.current_state
            ))
        };

        let read =
            pick(self.read_symbols, self.read_symbol).ok_or_else(|| missing("read symbols"))?;
        let write =
            pick(self.write_symbols, self.write_symbol).ok_or_else(|| missing("write symbols"))?;
        let directions = pick(self.move_directions, self.move_direction)
            .ok_or_else(|| missing("move directions"))?;

        Ok(Transition {
            state: self.current_state,
            read,
            write,
            directions,
            next_state: self.next_state,
        })
    }
}

/// Prefers the multi-tape list, falling back to the single-tape value.
fn pick<T>(many: Option<Vec<T>>, one: Option<T>) -> Option<Vec<T>> {
    many.or_else(|| one.map(|value| vec![value]))
}

impl From<&Transition> for RequestTransition {
    fn from(transition: &Transition) -> Self {
        let base = RequestTransition {
            current_state: transition.state.clone(),
            next_state: transition.next_state.clone(),
            ..Default::default()
        };

        match (
            transition.read.as_slice(),
            transition.write.as_slice(),
            transition.directions.as_slice(),
        ) {
            (&[read], &[write], &[direction]) => RequestTransition {
                read_symbol: Some(read),
                write_symbol: Some(write),
                move_direction: Some(direction),
                ..base
            },
            _ => RequestTransition {
                read_symbols: Some(transition.read.clone()),
                write_symbols: Some(transition.write.clone()),
                move_directions: Some(transition.directions.clone()),
                ..base
            },
        }
    }
}

impl SimulationRequest {
    /// Decodes a request from JSON.
    pub fn from_json(input: &str) -> Result<Self, TuringMachineError> {
        serde_json::from_str(input).map_err(|e| TuringMachineError::InvalidRequest(e.to_string()))
    }

    /// Builds the program under the default [`Limits`].
    pub fn into_program(self) -> Result<Program, TuringMachineError> {
        self.into_program_with(&Limits::default())
    }

    /// Builds the program, rejecting it if it exceeds `limits` or is structurally invalid.
    pub fn into_program_with(self, limits: &Limits) -> Result<Program, TuringMachineError> {
        let tapes = match (self.initial_tapes, self.initial_tape) {
            (Some(tapes), _) => tapes,
            (None, Some(tape)) => vec![tape],
            (None, None) => {
                return Err(TuringMachineError::ValidationError(
                    "At least one tape must be given (initial_tape or initial_tapes)".to_string(),
                ))
            }
        };

        let heads = match (self.head_positions, self.head_position) {
            (Some(heads), _) => heads,
            (None, first) => {
                let mut heads = vec![0; tapes.len()];
                if let (Some(position), Some(head)) = (first, heads.first_mut()) {
                    *head = position;
                }
                heads
            }
        };

        let rules = self
            .transitions
            .into_iter()
            .enumerate()
            .map(|(i, transition)| transition.into_transition(i))
            .collect::<Result<Vec<_>, _>>()?;

        let program = Program {
            name: self.name.unwrap_or_else(|| "request".to_string()),
            initial_state: self.initial_state,
            final_states: self.final_states.into_iter().collect::<BTreeSet<_>>(),
            blank: self.blank_symbol,
            num_tapes: self.num_tapes.unwrap_or(tapes.len()),
            tapes,
            heads,
            rules,
            max_steps: self.max_steps,
            detect_loops: self.detect_loops,
        };

        limits.check(&program)?;
        analyze(&program)?;

        Ok(program)
    }
}

impl From<&Program> for SimulationRequest {
    fn from(program: &Program) -> Self {
        let single = program.is_single_tape();

        SimulationRequest {
            name: Some(program.name.clone()),
            initial_tape: single.then(|| program.initial_tape()),
            initial_tapes: (!single).then(|| program.tapes.clone()),
            num_tapes: Some(program.num_tapes),
            blank_symbol: program.blank,
            initial_state: program.initial_state.clone(),
            final_states: program.final_states.iter().cloned().collect(),
            transitions: program.rules.iter().map(RequestTransition::from).collect(),
            max_steps: program.max_steps,
            head_position: single.then(|| program.head_position()),
            head_positions: (!single).then(|| program.heads.clone()),
            detect_loops: program.detect_loops,
        }
    }
}

/// The outcome of a run in wire form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationResponse {
    pub success: bool,
    pub accepted: bool,
    pub final_state: String,
    pub final_tapes: Vec<String>,
    pub total_steps: usize,
    pub halted: bool,
    pub halt_reason: HaltReason,
    pub loop_detected: bool,
    /// Wall time in seconds.
    pub execution_time: f64,
    pub message: String,
    pub num_tapes: usize,
    pub execution_steps: Vec<ExecutionStep>,
}

impl From<Execution> for SimulationResponse {
    fn from(execution: Execution) -> Self {
        SimulationResponse {
            success: true,
            accepted: execution.accepted(),
            final_state: execution.final_state().to_string(),
            final_tapes: execution.final_tapes(),
            total_steps: execution.total_steps,
            halted: true,
            halt_reason: execution.halt,
            loop_detected: execution.halt == HaltReason::LoopDetected,
            execution_time: execution.elapsed.as_secs_f64(),
            message: execution.message(),
            num_tapes: execution.configuration.num_tapes(),
            execution_steps: execution.steps,
        }
    }
}

/// Builds the program described by `request` and runs it to completion.
pub fn simulate(request: SimulationRequest) -> Result<SimulationResponse, TuringMachineError> {
    let program = request.into_program()?;
    let execution = TuringMachine::new(program)?.execute();

    Ok(execution.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::StructuralError;

    const INCREMENT: &str = r#"{
        "initial_tape": "1011",
        "initial_state": "q0",
        "final_states": ["q_halt"],
        "transitions": [
            {"current_state": "q0", "read_symbol": "0", "next_state": "q0", "write_symbol": "0", "move_direction": "R"},
            {"current_state": "q0", "read_symbol": "1", "next_state": "q0", "write_symbol": "1", "move_direction": "R"},
            {"current_state": "q0", "read_symbol": "_", "next_state": "q1", "write_symbol": "_", "move_direction": "L"},
            {"current_state": "q1", "read_symbol": "0", "next_state": "q_halt", "write_symbol": "1", "move_direction": "N"},
            {"current_state": "q1", "read_symbol": "1", "next_state": "q1", "write_symbol": "0", "move_direction": "L"},
            {"current_state": "q1", "read_symbol": "_", "next_state": "q_halt", "write_symbol": "1", "move_direction": "N"}
        ]
    }"#;

    #[test]
    fn test_defaults_are_applied() {
        let request = SimulationRequest::from_json(INCREMENT).unwrap();

        assert_eq!(request.blank_symbol, '_');
        assert_eq!(request.max_steps, 1000);
        assert!(request.detect_loops);

        let program = request.into_program().unwrap();
        assert_eq!(program.num_tapes, 1);
        assert_eq!(program.heads, vec![0]);
        assert_eq!(program.rules.len(), 6);
        assert_eq!(program.rules[2].directions, vec![Direction::Left]);
        assert!(program.is_final("q_halt"));
    }

    #[test]
    fn test_simulate_increment() {
        let response = simulate(SimulationRequest::from_json(INCREMENT).unwrap()).unwrap();

        assert!(response.success);
        assert!(response.accepted);
        assert_eq!(response.halt_reason, HaltReason::Accepted);
        assert_eq!(response.final_tapes, vec!["1100"]);
        assert_eq!(response.final_state, "q_halt");
        assert_eq!(response.total_steps, response.execution_steps.len());
        assert_eq!(response.execution_steps[0].action_taken, "write 1, move R, goto q0");
        assert!(!response.loop_detected);
    }

    #[test]
    fn test_response_wire_format() {
        let mut request = SimulationRequest::from_json(INCREMENT).unwrap();
        request.max_steps = 2;

        let value = serde_json::to_value(simulate(request).unwrap()).unwrap();

        assert_eq!(value["halt_reason"], "step_limit");
        assert_eq!(value["accepted"], false);
        assert_eq!(value["total_steps"], 2);
        assert_eq!(value["execution_steps"][1]["current_state"], "q0");
        assert_eq!(value["execution_steps"][1]["symbols_read"][0], "0");
        assert_eq!(value["execution_steps"][1]["head_positions"][0], 1);
    }

    #[test]
    fn test_multi_tape_request() {
        let request = SimulationRequest::from_json(
            r#"{
                "initial_tapes": ["ab", ""],
                "final_states": ["done"],
                "transitions": [
                    {"current_state": "q0", "read_symbols": ["a", "_"], "next_state": "q0", "write_symbols": ["a", "a"], "move_directions": ["R", "R"]},
                    {"current_state": "q0", "read_symbols": ["b", "_"], "next_state": "q0", "write_symbols": ["b", "b"], "move_directions": ["R", "R"]},
                    {"current_state": "q0", "read_symbols": ["_", "_"], "next_state": "done", "write_symbols": ["_", "_"], "move_directions": ["S", "S"]}
                ]
            }"#,
        )
        .unwrap();

        let response = simulate(request).unwrap();
        assert_eq!(response.final_tapes, vec!["ab", "ab"]);
        assert_eq!(response.num_tapes, 2);
        assert_eq!(response.total_steps, 3);
    }

    #[test]
    fn test_missing_tapes() {
        let mut request = SimulationRequest::from_json(INCREMENT).unwrap();
        request.initial_tape = None;

        assert!(matches!(
            request.into_program(),
            Err(TuringMachineError::ValidationError(_))
        ));
    }

    #[test]
    fn test_declared_tape_count_mismatch() {
        let mut request = SimulationRequest::from_json(INCREMENT).unwrap();
        request.num_tapes = Some(2);
        request.head_positions = Some(vec![0, 0]);

        assert_eq!(
            request.into_program(),
            Err(StructuralError::TapeCount {
                expected: 2,
                actual: 1
            }
            .into())
        );
    }

    #[test]
    fn test_far_head_positions_are_rejected_before_running() {
        for (position, tape) in [(i64::MAX, ""), (i64::MAX - 10, "1")] {
            let request = SimulationRequest::from_json(&format!(
                r#"{{
                    "initial_tape": "{tape}",
                    "head_position": {position},
                    "final_states": ["h"],
                    "transitions": [
                        {{"current_state": "q0", "read_symbol": "_", "next_state": "q0", "write_symbol": "1", "move_direction": "R"}}
                    ]
                }}"#
            ))
            .unwrap();

            assert!(
                matches!(
                    simulate(request),
                    Err(TuringMachineError::Structural(StructuralError::HeadOutOfRange {
                        tape: 0,
                        ..
                    }))
                ),
                "{position}"
            );
        }
    }

    #[test]
    fn test_empty_final_states() {
        let mut request = SimulationRequest::from_json(INCREMENT).unwrap();
        request.final_states.clear();

        assert_eq!(
            request.into_program(),
            Err(StructuralError::NoFinalStates.into())
        );
    }

    #[test]
    fn test_transition_without_moves() {
        let mut request = SimulationRequest::from_json(INCREMENT).unwrap();
        request.transitions[3].move_direction = None;

        let error = request.into_program().unwrap_err();
        assert!(error.to_string().contains("Transition #3"));
        assert!(error.to_string().contains("move directions"));
    }

    #[test]
    fn test_step_budget_above_ceiling() {
        let mut request = SimulationRequest::from_json(INCREMENT).unwrap();
        request.max_steps = 1_000_001;

        assert!(matches!(
            request.into_program(),
            Err(TuringMachineError::ValidationError(_))
        ));
    }

    #[test]
    fn test_multi_char_symbol_is_rejected() {
        let result = SimulationRequest::from_json(
            r#"{"initial_tape": "1", "final_states": ["h"], "transitions": [
                {"current_state": "q0", "read_symbol": "10", "next_state": "h", "write_symbol": "1", "move_direction": "R"}
            ]}"#,
        );

        assert!(matches!(result, Err(TuringMachineError::InvalidRequest(_))));
    }

    #[test]
    fn test_request_from_program() {
        let program = SimulationRequest::from_json(INCREMENT)
            .unwrap()
            .into_program()
            .unwrap();

        let request = SimulationRequest::from(&program);
        assert_eq!(request.initial_tape.as_deref(), Some("1011"));
        assert_eq!(request.initial_tapes, None);
        assert_eq!(request.transitions[0].read_symbol, Some('0'));
        assert_eq!(request.transitions[0].read_symbols, None);
        assert_eq!(request.into_program().unwrap(), program);
    }
}
