//! This module defines the `TuringMachine` struct, which runs a multi-tape Turing Machine
//! program. It owns the live [`Configuration`], applies transitions one at a time, watches for
//! repeated configurations and records an execution trace.

use std::time::{Duration, Instant};

use crate::analyzer::analyze;
use crate::detector::LoopDetector;
use crate::table::TransitionTable;
use crate::tape::Tape;
use crate::trace::{Execution, ExecutionStep};
use crate::types::{HaltReason, Program, Step, StructuralError, Transition, TuringMachineError};

/// A full machine snapshot: state, every tape, and every head position.
///
/// `tapes` and `heads` always have the same length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Configuration {
    state: String,
    tapes: Vec<Tape>,
    heads: Vec<i64>,
}

impl Configuration {
    /// Creates a configuration with one head per tape.
    pub fn new(
        state: impl Into<String>,
        tapes: Vec<Tape>,
        heads: Vec<i64>,
    ) -> Result<Self, StructuralError> {
        if tapes.len() != heads.len() {
            return Err(StructuralError::HeadCount {
                expected: tapes.len(),
                actual: heads.len(),
            });
        }

        Ok(Self {
            state: state.into(),
            tapes,
            heads,
        })
    }

    /// The starting configuration of a structurally valid program.
    pub fn initial(program: &Program) -> Self {
        Self {
            state: program.initial_state.clone(),
            tapes: program
                .tapes
                .iter()
                .map(|content| Tape::new(content, program.blank))
                .collect(),
            heads: program.heads.clone(),
        }
    }

    pub fn state(&self) -> &str {
        &self.state
    }

    pub fn tapes(&self) -> &[Tape] {
        &self.tapes
    }

    pub fn heads(&self) -> &[i64] {
        &self.heads
    }

    pub fn num_tapes(&self) -> usize {
        self.tapes.len()
    }

    /// Returns the symbols currently under each head.
    ///
    /// | a | b | c | tape 1
    /// | d | e |   | tape 2
    ///   0   1   2   position
    ///
    /// heads [0, 2] will return ['a', '_']
    pub fn symbols(&self) -> Vec<char> {
        self.tapes
            .iter()
            .zip(&self.heads)
            .map(|(tape, &head)| tape.read(head))
            .collect()
    }

    /// Applies `rule`: on each tape write, then move, then switch state.
    ///
    /// The rule is applied unconditionally; finding a matching rule is the caller's job.
    pub fn apply(&mut self, rule: &Transition) {
        for (i, (tape, head)) in self.tapes.iter_mut().zip(&mut self.heads).enumerate() {
            tape.write(*head, rule.write[i]);
            *head = head.saturating_add(rule.directions[i].offset());
        }

        self.state.clone_from(&rule.next_state);
    }
}

/// Represents a multi-tape Turing Machine running one program.
///
/// Each machine owns all of its run state, so independent machines can run on separate
/// threads without coordination.
#[derive(Debug, Clone)]
pub struct TuringMachine {
    program: Program,
    table: TransitionTable,
    configuration: Configuration,
    detector: LoopDetector,
    trace: Vec<ExecutionStep>,
    step_count: usize,
    halted: Option<HaltReason>,
    elapsed: Duration,
}

impl TuringMachine {
    /// Creates a new `TuringMachine` from a given `Program`.
    ///
    /// The program is validated first; a structural problem is returned as an error and no
    /// machine is built.
    pub fn new(program: Program) -> Result<Self, TuringMachineError> {
        Self::validate_program(&program)?;
        let table = TransitionTable::new(&program.rules, program.num_tapes)?;

        Ok(Self {
            configuration: Configuration::initial(&program),
            table,
            program,
            detector: LoopDetector::new(),
            trace: Vec::new(),
            step_count: 0,
            halted: None,
            elapsed: Duration::ZERO,
        })
    }

    /// Checks a program for structural errors without building a machine.
    pub fn validate_program(program: &Program) -> Result<(), TuringMachineError> {
        analyze(program)
    }

    /// Executes a single step of the computation.
    ///
    /// # Returns
    ///
    /// * `Step::Continue` if a transition was applied.
    /// * `Step::Halt(_)` once the run has ended; further calls keep returning the same reason.
    pub fn step(&mut self) -> Step {
        if let Some(reason) = self.halted {
            return Step::Halt(reason);
        }

        if self.step_count >= self.program.max_steps {
            return self.halt(HaltReason::StepLimit);
        }

        let symbols = self.configuration.symbols();
        let Some(rule) = self.table.lookup(&self.configuration.state, &symbols) else {
            let reason = if self.program.is_final(&self.configuration.state) {
                HaltReason::Accepted
            } else {
                HaltReason::Rejected
            };
            return self.halt(reason);
        };

        tracing::trace!(
            step = self.step_count,
            state = %self.configuration.state,
            read = ?symbols,
            action = %rule.describe(),
        );

        self.trace.push(ExecutionStep::capture(
            self.step_count,
            &self.configuration,
            symbols,
            rule,
        ));
        self.configuration.apply(rule);
        self.step_count += 1;

        if self.program.detect_loops && self.detector.observe(&self.configuration) {
            return self.halt(HaltReason::LoopDetected);
        }

        Step::Continue
    }

    /// Runs the machine until it halts. Returns why it halted.
    pub fn run(&mut self) -> HaltReason {
        let start = Instant::now();

        let reason = loop {
            if let Step::Halt(reason) = self.step() {
                break reason;
            }
        };

        self.elapsed += start.elapsed();
        tracing::debug!(
            program = %self.program.name,
            %reason,
            steps = self.step_count,
            elapsed = ?self.elapsed,
            "run finished"
        );

        reason
    }

    /// Runs the machine to completion and hands back the trace and final configuration.
    pub fn execute(mut self) -> Execution {
        let halt = self.run();

        Execution {
            halt,
            configuration: self.configuration,
            total_steps: self.step_count,
            steps: self.trace,
            elapsed: self.elapsed,
        }
    }

    /// Resets the machine to its initial configuration, discarding the trace and loop history.
    pub fn reset(&mut self) {
        self.configuration = Configuration::initial(&self.program);
        self.detector.clear();
        self.trace.clear();
        self.step_count = 0;
        self.halted = None;
        self.elapsed = Duration::ZERO;
    }

    fn halt(&mut self, reason: HaltReason) -> Step {
        tracing::debug!(
            state = %self.configuration.state,
            steps = self.step_count,
            %reason,
            "machine halted"
        );
        self.halted = Some(reason);
        Step::Halt(reason)
    }

    /// Returns the current state of the Turing Machine.
    pub fn state(&self) -> &str {
        self.configuration.state()
    }

    /// Returns the initial state of the Turing Machine.
    pub fn initial_state(&self) -> &str {
        &self.program.initial_state
    }

    /// Returns the total number of steps executed by the Turing Machine.
    pub fn step_count(&self) -> usize {
        self.step_count
    }

    /// Checks if the run has ended.
    pub fn is_halted(&self) -> bool {
        self.halted.is_some()
    }

    /// Why the run ended, if it has.
    pub fn halt_reason(&self) -> Option<HaltReason> {
        self.halted
    }

    pub fn configuration(&self) -> &Configuration {
        &self.configuration
    }

    /// Returns a slice of the machine's tapes.
    pub fn tapes(&self) -> &[Tape] {
        self.configuration.tapes()
    }

    /// Returns the materialized content of every tape.
    pub fn tape_contents(&self) -> Vec<String> {
        self.tapes().iter().map(Tape::contents).collect()
    }

    /// Returns a slice of the machine's head positions for all tapes.
    pub fn heads(&self) -> &[i64] {
        self.configuration.heads()
    }

    /// Returns the symbols currently under each tape's head.
    pub fn symbols(&self) -> Vec<char> {
        self.configuration.symbols()
    }

    /// Finds the rule that the next step would apply, if any.
    pub fn transition(&self) -> Option<&Transition> {
        self.table
            .lookup(self.configuration.state(), &self.configuration.symbols())
    }

    /// Trace entries recorded so far.
    pub fn trace(&self) -> &[ExecutionStep] {
        &self.trace
    }

    /// Returns the blank symbol used by this Turing Machine.
    pub fn blank(&self) -> char {
        self.program.blank
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    pub fn table(&self) -> &TransitionTable {
        &self.table
    }
}

#[cfg(test)]
mod multi_tape_tests {
    use super::*;
    use crate::types::Direction;
    use std::collections::BTreeSet;

    fn transition(state: &str, read: &[char], write: &[char], dirs: &[Direction], next: &str) -> Transition {
        Transition {
            state: state.to_string(),
            read: read.to_vec(),
            write: write.to_vec(),
            directions: dirs.to_vec(),
            next_state: next.to_string(),
        }
    }

    fn create_simple_multi_tape_program() -> Program {
        // Replace ['a', 'x'] with ['b', 'y'] and move right on both tapes, then halt
        Program {
            name: "Simple Multi-Tape Test".to_string(),
            initial_state: "start".to_string(),
            final_states: BTreeSet::from(["halt".to_string()]),
            blank: '-',
            tapes: vec!["a".to_string(), "x".to_string()],
            heads: vec![0, 0],
            num_tapes: 2,
            rules: vec![transition(
                "start",
                &['a', 'x'],
                &['b', 'y'],
                &[Direction::Right, Direction::Right],
                "halt",
            )],
            max_steps: 100,
            detect_loops: true,
        }
    }

    #[test]
    fn test_multi_tape_machine_creation() {
        let machine = TuringMachine::new(create_simple_multi_tape_program()).unwrap();

        assert_eq!(machine.state(), "start");
        assert_eq!(machine.tape_contents(), vec!["a", "x"]);
        assert_eq!(machine.heads(), &[0, 0]);
        assert_eq!(machine.step_count(), 0);
        assert!(!machine.is_halted());
    }

    #[test]
    fn test_multi_tape_single_step() {
        let mut machine = TuringMachine::new(create_simple_multi_tape_program()).unwrap();

        let result = machine.step();

        assert_eq!(result, Step::Continue);
        assert_eq!(machine.state(), "halt");
        assert_eq!(machine.tape_contents(), vec!["b", "y"]);
        assert_eq!(machine.heads(), &[1, 1]);
        assert_eq!(machine.symbols(), vec!['-', '-']);
        assert_eq!(machine.step_count(), 1);
    }

    #[test]
    fn test_multi_tape_halt_state() {
        let mut machine = TuringMachine::new(create_simple_multi_tape_program()).unwrap();

        assert_eq!(machine.step(), Step::Continue);
        assert_eq!(machine.step(), Step::Halt(HaltReason::Accepted));
        // Halting is sticky.
        assert_eq!(machine.step(), Step::Halt(HaltReason::Accepted));
        assert_eq!(machine.step_count(), 1);
    }

    #[test]
    fn test_multi_tape_rejection() {
        let program = create_simple_multi_tape_program().with_tapes(["z", "z"]);
        let mut machine = TuringMachine::new(program).unwrap();

        assert_eq!(machine.step(), Step::Halt(HaltReason::Rejected));
        assert_eq!(machine.state(), "start");
        assert_eq!(machine.symbols(), vec!['z', 'z']);
        assert!(machine.trace().is_empty());
    }

    #[test]
    fn test_multi_tape_reset() {
        let mut machine = TuringMachine::new(create_simple_multi_tape_program()).unwrap();

        machine.run();
        assert_eq!(machine.state(), "halt");
        assert_eq!(machine.step_count(), 1);

        machine.reset();
        assert_eq!(machine.state(), "start");
        assert_eq!(machine.tape_contents(), vec!["a", "x"]);
        assert_eq!(machine.heads(), &[0, 0]);
        assert_eq!(machine.step_count(), 0);
        assert!(machine.trace().is_empty());
        assert_eq!(machine.halt_reason(), None);
    }

    #[test]
    fn test_multi_tape_run_to_completion() {
        let machine = TuringMachine::new(create_simple_multi_tape_program()).unwrap();

        let execution = machine.execute();
        assert_eq!(execution.halt, HaltReason::Accepted);
        assert!(execution.accepted());
        assert_eq!(execution.total_steps, 1);
        assert_eq!(execution.steps.len(), 1);
        assert_eq!(execution.final_tapes(), vec!["b", "y"]);
    }

    #[test]
    fn test_multi_tape_stay_direction() {
        let mut program = create_simple_multi_tape_program();
        program.rules[0].directions = vec![Direction::Stay, Direction::Left];

        let mut machine = TuringMachine::new(program).unwrap();
        machine.step();

        assert_eq!(machine.heads(), &[0, -1]);
        assert_eq!(machine.tape_contents(), vec!["b", "y"]);
    }

    #[test]
    fn test_transition_preview() {
        let machine = TuringMachine::new(create_simple_multi_tape_program()).unwrap();

        let rule = machine.transition().unwrap();
        assert_eq!(rule.next_state, "halt");
        assert_eq!(machine.step_count(), 0);
    }

    #[test]
    fn test_rejects_malformed_program() {
        let mut program = create_simple_multi_tape_program();
        program.rules[0].write.pop();

        let error = TuringMachine::new(program).unwrap_err();
        assert!(matches!(
            error,
            TuringMachineError::Structural(StructuralError::RuleArity { .. })
        ));
    }

    #[test]
    fn test_trace_snapshots_are_copies() {
        let mut program = create_simple_multi_tape_program();
        program.rules.push(transition(
            "halt",
            &['-', '-'],
            &['c', 'z'],
            &[Direction::Left, Direction::Left],
            "done",
        ));
        program.final_states = BTreeSet::from(["done".to_string()]);

        let execution = TuringMachine::new(program).unwrap().execute();

        assert_eq!(execution.total_steps, 2);
        assert_eq!(execution.steps[0].tape_contents, vec!["a", "x"]);
        assert_eq!(execution.steps[1].tape_contents, vec!["b", "y"]);
        assert_eq!(execution.steps[1].symbols_read, vec!['-', '-']);
        assert_eq!(execution.final_tapes(), vec!["bc", "yz"]);
    }

    #[test]
    fn test_apply_writes_then_moves() {
        let mut configuration =
            Configuration::new("q0", vec![Tape::new("0", '_')], vec![0]).unwrap();

        configuration.apply(&transition("q0", &['0'], &['1'], &[Direction::Left], "q1"));

        assert_eq!(configuration.state(), "q1");
        assert_eq!(configuration.heads(), &[-1]);
        assert_eq!(configuration.tapes()[0].read(0), '1');
        assert_eq!(configuration.symbols(), vec!['_']);
    }

    #[test]
    fn test_configuration_needs_one_head_per_tape() {
        let tapes = vec![Tape::new("a", '_'), Tape::new("b", '_')];

        assert_eq!(
            Configuration::new("q0", tapes, vec![0]),
            Err(StructuralError::HeadCount {
                expected: 2,
                actual: 1
            })
        );
    }

    #[test]
    fn test_head_moves_never_overflow() {
        let mut configuration =
            Configuration::new("q0", vec![Tape::blank('_')], vec![i64::MAX]).unwrap();

        configuration.apply(&transition("q0", &['_'], &['1'], &[Direction::Right], "q0"));

        assert_eq!(configuration.heads(), &[i64::MAX]);
        assert_eq!(configuration.tapes()[0].read(i64::MAX), '1');
    }

    #[test]
    fn test_far_start_positions_are_rejected() {
        let mut program = create_simple_multi_tape_program();
        program.heads = vec![0, i64::MAX - 10];

        assert!(matches!(
            TuringMachine::new(program),
            Err(TuringMachineError::Structural(StructuralError::HeadOutOfRange {
                tape: 1,
                ..
            }))
        ));
    }
}
