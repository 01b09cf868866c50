//! This module provides functions for analyzing Turing Machine programs before execution.
//!
//! [`analyze`] performs the structural checks that must pass before a machine can be built:
//! tape counts, head counts, rule arity, final states and the step budget. [`lint`] reports
//! logical oddities that are legal but usually mistakes, such as unreachable states or rules
//! that can never fire.

use crate::types::{Program, StructuralError, TuringMachineError, MAX_HEAD_OFFSET};
use serde::Serialize;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt;

/// Non-fatal findings about a program.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// The initial state has no outgoing rules, so the machine halts before its first step.
    InitialStateWithoutRules { state: String },
    /// States with rules that can never be entered from the initial state.
    UnreachableStates { states: Vec<String> },
    /// A rule whose `(state, read)` key was already taken by an earlier rule.
    ShadowedRule { index: usize, state: String, read: Vec<char> },
    /// Final states that no rule leads to and that aren't the initial state.
    UnreachableFinalStates { states: Vec<String> },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::InitialStateWithoutRules { state } => {
                write!(f, "Initial state '{state}' has no rules")
            }
            Diagnostic::UnreachableStates { states } => {
                write!(f, "Unreachable states detected: {states:?}")
            }
            Diagnostic::ShadowedRule { index, state, read } => write!(
                f,
                "Transition #{index} in state '{state}' reading {read:?} is shadowed by an earlier rule"
            ),
            Diagnostic::UnreachableFinalStates { states } => {
                write!(f, "Final states never entered by any transition: {states:?}")
            }
        }
    }
}

/// Checks a `Program` for structural errors.
///
/// All checks run; the first failure is returned.
///
/// # Returns
///
/// * `Ok(())` if the program can be executed.
/// * `Err(TuringMachineError::Structural)` describing the first problem found.
pub fn analyze(program: &Program) -> Result<(), TuringMachineError> {
    let errors = [
        check_tapes,
        check_heads,
        check_head_range,
        check_rule_arity,
        check_final_states,
        check_step_budget,
    ]
    .iter()
    .filter_map(|f| f(program).err())
    .collect::<Vec<_>>();

    match errors.into_iter().next() {
        Some(first_error) => Err(first_error.into()),
        None => Ok(()),
    }
}

/// Runs every logical check and returns all findings, sorted by kind.
pub fn lint(program: &Program) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();

    diagnostics.extend(check_initial_state(program));
    diagnostics.extend(check_unreachable_states(program));
    diagnostics.extend(check_shadowed_rules(program));
    diagnostics.extend(check_final_states_reachable(program));

    diagnostics
}

/// The number of initial tapes must be positive and match the declared tape count.
fn check_tapes(program: &Program) -> Result<(), StructuralError> {
    if program.num_tapes == 0 || program.tapes.is_empty() {
        return Err(StructuralError::NoTapes);
    }

    if program.tapes.len() != program.num_tapes {
        return Err(StructuralError::TapeCount {
            expected: program.num_tapes,
            actual: program.tapes.len(),
        });
    }

    Ok(())
}

/// There must be exactly one head position per tape.
fn check_heads(program: &Program) -> Result<(), StructuralError> {
    if program.heads.len() != program.num_tapes {
        return Err(StructuralError::HeadCount {
            expected: program.num_tapes,
            actual: program.heads.len(),
        });
    }

    Ok(())
}

/// Heads start at most [`MAX_HEAD_OFFSET`] cells beyond either end of their tape's content.
fn check_head_range(program: &Program) -> Result<(), StructuralError> {
    for (tape, (content, &position)) in program.tapes.iter().zip(&program.heads).enumerate() {
        let len = i64::try_from(content.chars().count()).unwrap_or(i64::MAX);
        let upper = len.saturating_add(MAX_HEAD_OFFSET);

        if position < -MAX_HEAD_OFFSET || position > upper {
            return Err(StructuralError::HeadOutOfRange {
                tape,
                position,
                limit: MAX_HEAD_OFFSET,
            });
        }
    }

    Ok(())
}

/// Every rule must read, write and move exactly `num_tapes` tapes.
fn check_rule_arity(program: &Program) -> Result<(), StructuralError> {
    program
        .rules
        .iter()
        .enumerate()
        .try_for_each(|(i, rule)| rule.check_arity(i, program.num_tapes))
}

fn check_final_states(program: &Program) -> Result<(), StructuralError> {
    if program.final_states.is_empty() {
        return Err(StructuralError::NoFinalStates);
    }

    Ok(())
}

fn check_step_budget(program: &Program) -> Result<(), StructuralError> {
    if program.max_steps == 0 {
        return Err(StructuralError::ZeroStepBudget);
    }

    Ok(())
}

fn check_initial_state(program: &Program) -> Option<Diagnostic> {
    let has_rules = program
        .rules
        .iter()
        .any(|rule| rule.state == program.initial_state);

    (!has_rules).then(|| Diagnostic::InitialStateWithoutRules {
        state: program.initial_state.clone(),
    })
}

/// Finds states with rules that a depth-first traversal from the initial state never reaches.
fn check_unreachable_states(program: &Program) -> Option<Diagnostic> {
    let mut edges: HashMap<&str, Vec<&str>> = HashMap::new();
    for rule in &program.rules {
        edges
            .entry(rule.state.as_str())
            .or_default()
            .push(rule.next_state.as_str());
    }

    let mut visited = HashSet::new();
    let mut stack = vec![program.initial_state.as_str()];

    while let Some(state) = stack.pop() {
        if !visited.insert(state) {
            continue;
        }

        if let Some(next_states) = edges.get(state) {
            stack.extend(next_states.iter().filter(|next| !visited.contains(*next)));
        }
    }

    let unreachable: BTreeSet<&str> = edges
        .keys()
        .copied()
        .filter(|state| !visited.contains(state))
        .collect();

    (!unreachable.is_empty()).then(|| Diagnostic::UnreachableStates {
        states: unreachable.into_iter().map(String::from).collect(),
    })
}

fn check_shadowed_rules(program: &Program) -> Vec<Diagnostic> {
    let mut seen = HashSet::new();

    program
        .rules
        .iter()
        .enumerate()
        .filter(|(_, rule)| !seen.insert((rule.state.as_str(), rule.read.as_slice())))
        .map(|(index, rule)| Diagnostic::ShadowedRule {
            index,
            state: rule.state.clone(),
            read: rule.read.clone(),
        })
        .collect()
}

fn check_final_states_reachable(program: &Program) -> Option<Diagnostic> {
    let targets: HashSet<&str> = program
        .rules
        .iter()
        .map(|rule| rule.next_state.as_str())
        .collect();

    let never_entered: Vec<String> = program
        .final_states
        .iter()
        .filter(|state| **state != program.initial_state && !targets.contains(state.as_str()))
        .cloned()
        .collect();

    (!never_entered.is_empty()).then(|| Diagnostic::UnreachableFinalStates {
        states: never_entered,
    })
}
