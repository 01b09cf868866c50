//! The built-in program library, embedded from `programs/*.tur` at compile time.

use crate::analyzer::{lint, Diagnostic};
use crate::types::{Program, TuringMachineError};
use serde::Serialize;

use std::sync::RwLock;

// Default embedded programs
const PROGRAM_TEXTS: [&str; 12] = [
    include_str!("../programs/binary-increment.tur"),
    include_str!("../programs/unary-addition.tur"),
    include_str!("../programs/multi-tape-copy.tur"),
    include_str!("../programs/palindrome.tur"),
    include_str!("../programs/balanced-parentheses.tur"),
    include_str!("../programs/bubble-sort.tur"),
    include_str!("../programs/busy-beaver-2.tur"),
    include_str!("../programs/ping-pong.tur"),
    include_str!("../programs/binary-multiplication.tur"),
    include_str!("../programs/prime-checker.tur"),
    include_str!("../programs/binary-reverse.tur"),
    include_str!("../programs/duplicate-string.tur"),
];

lazy_static::lazy_static! {
    /// Parsed programs paired with the text they were parsed from.
    pub static ref PROGRAMS: RwLock<Vec<(Program, &'static str)>> = RwLock::new(Vec::new());
}

pub struct ProgramManager;

impl ProgramManager {
    /// Parses the embedded programs into [`PROGRAMS`], once.
    pub fn load() -> Result<(), TuringMachineError> {
        let mut write_guard = PROGRAMS.write().map_err(|_| {
            TuringMachineError::FileError("Failed to acquire write lock".to_string())
        })?;

        if !write_guard.is_empty() {
            return Ok(());
        }

        for (index, text) in PROGRAM_TEXTS.iter().enumerate() {
            match crate::parser::parse(text) {
                Ok(program) => write_guard.push((program, *text)),
                Err(e) => tracing::warn!(index, error = %e, "failed to parse embedded program"),
            }
        }

        tracing::debug!(count = write_guard.len(), "loaded embedded programs");

        Ok(())
    }

    /// Get the number of available programs
    pub fn get_program_count() -> usize {
        let _ = Self::load();

        PROGRAMS.read().map(|programs| programs.len()).unwrap_or(0)
    }

    /// Get a program by its index
    pub fn get_program_by_index(index: usize) -> Result<Program, TuringMachineError> {
        Self::load()?;

        PROGRAMS
            .read()
            .map_err(|_| TuringMachineError::FileError("Failed to acquire read lock".to_string()))?
            .get(index)
            .map(|(program, _)| program.clone())
            .ok_or_else(|| {
                TuringMachineError::ValidationError(format!("Program index {index} out of range"))
            })
    }

    /// Get a program by its name, ignoring case.
    pub fn get_program_by_name(name: &str) -> Result<Program, TuringMachineError> {
        Self::load()?;

        PROGRAMS
            .read()
            .map_err(|_| TuringMachineError::FileError("Failed to acquire read lock".to_string()))?
            .iter()
            .map(|(program, _)| program)
            .find(|program| program.name.eq_ignore_ascii_case(name))
            .cloned()
            .ok_or_else(|| {
                TuringMachineError::ValidationError(format!("Program '{name}' not found"))
            })
    }

    /// List all program names
    pub fn list_program_names() -> Vec<String> {
        let _ = Self::load();

        PROGRAMS
            .read()
            .map(|programs| {
                programs
                    .iter()
                    .map(|(program, _)| program.name.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Get information about a program by its index
    pub fn get_program_info(index: usize) -> Result<ProgramInfo, TuringMachineError> {
        let program = Self::get_program_by_index(index)?;

        Ok(ProgramInfo {
            index,
            name: program.name.clone(),
            initial_state: program.initial_state.clone(),
            initial_tapes: program.tapes.clone(),
            num_tapes: program.num_tapes,
            state_count: program.states().len(),
            transition_count: program.rules.len(),
            diagnostics: lint(&program),
        })
    }

    /// Search for programs by name
    pub fn search_programs(query: &str) -> Vec<usize> {
        let _ = Self::load();
        let query = query.to_lowercase();

        PROGRAMS
            .read()
            .map(|programs| {
                programs
                    .iter()
                    .enumerate()
                    .filter(|(_, (program, _))| program.name.to_lowercase().contains(&query))
                    .map(|(index, _)| index)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Get the source text of the program at `index`, as numbered by the other getters.
    pub fn get_program_text_by_index(index: usize) -> Result<&'static str, TuringMachineError> {
        Self::load()?;

        PROGRAMS
            .read()
            .map_err(|_| TuringMachineError::FileError("Failed to acquire read lock".to_string()))?
            .get(index)
            .map(|(_, text)| *text)
            .ok_or_else(|| {
                TuringMachineError::ValidationError(format!(
                    "Program text index {index} out of range"
                ))
            })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ProgramInfo {
    pub index: usize,
    pub name: String,
    pub initial_state: String,
    pub initial_tapes: Vec<String>,
    pub num_tapes: usize,
    /// Every state the program mentions.
    pub state_count: usize,
    pub transition_count: usize,
    pub diagnostics: Vec<Diagnostic>,
}
