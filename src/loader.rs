//! This module provides the `ProgramLoader` struct, responsible for loading Turing Machine
//! programs from various sources, including files and strings.
//!
//! Two file formats are understood: `.tur` program text and `.json` simulation requests.

use crate::config::Limits;
use crate::parser::parse;
use crate::request::SimulationRequest;
use crate::types::{Program, TuringMachineError};
use std::fs;
use std::path::{Path, PathBuf};

/// `ProgramLoader` is a utility struct for loading Turing Machine programs.
/// It provides methods to load programs from individual files, from string content,
/// and to discover and load every program file within a specified directory.
pub struct ProgramLoader;

impl ProgramLoader {
    /// Loads a single program from the specified file path under the default [`Limits`].
    ///
    /// Files ending in `.json` are read as simulation requests, anything else as `.tur` text.
    ///
    /// # Returns
    ///
    /// * `Ok(Program)` if the file is successfully read and parsed into a `Program`.
    /// * `Err(TuringMachineError::FileError)` if the file cannot be read.
    /// * Any parse, validation or structural error of the content.
    pub fn load_program(path: &Path) -> Result<Program, TuringMachineError> {
        Self::load_program_with(path, &Limits::default())
    }

    /// Loads a single program from `path`, rejecting it if it exceeds `limits`.
    pub fn load_program_with(path: &Path, limits: &Limits) -> Result<Program, TuringMachineError> {
        let content = fs::read_to_string(path).map_err(|e| {
            TuringMachineError::FileError(format!("Failed to read file {}: {}", path.display(), e))
        })?;

        limits.check_size(content.len())?;

        if is_json(path) {
            SimulationRequest::from_json(&content)?.into_program_with(limits)
        } else {
            let program = parse(&content)?;
            limits.check(&program)?;
            Ok(program)
        }
    }

    /// Loads a single Turing Machine program from the provided `.tur` text.
    ///
    /// This is useful for parsing programs that are not stored in files, e.g., from user input.
    pub fn load_program_from_string(content: &str) -> Result<Program, TuringMachineError> {
        let limits = Limits::default();
        limits.check_size(content.len())?;

        let program = parse(content)?;
        limits.check(&program)?;

        Ok(program)
    }

    /// Loads all program files (`.tur` and `.json`) from a given directory.
    ///
    /// Directories and other files are skipped. Results are sorted by path so the order
    /// doesn't depend on the file system.
    ///
    /// # Returns
    ///
    /// One `Result` per program file: its path and program, or the error that kept it from
    /// loading.
    pub fn load_programs(directory: &Path) -> Vec<Result<(PathBuf, Program), TuringMachineError>> {
        if !directory.exists() {
            return vec![Err(TuringMachineError::FileError(format!(
                "Directory {} does not exist",
                directory.display()
            )))];
        }

        let entries = match fs::read_dir(directory) {
            Ok(entries) => entries,
            Err(e) => {
                return vec![Err(TuringMachineError::FileError(format!(
                    "Failed to read directory {}: {}",
                    directory.display(),
                    e
                )))]
            }
        };

        let mut paths = Vec::new();
        let mut results = Vec::new();

        for entry in entries {
            match entry {
                Ok(entry) => {
                    let path = entry.path();
                    if path.is_file() && (is_json(&path) || is_tur(&path)) {
                        paths.push(path);
                    }
                }
                Err(e) => results.push(Err(TuringMachineError::FileError(format!(
                    "Failed to read directory entry: {e}"
                )))),
            }
        }

        paths.sort();

        results.extend(paths.into_iter().map(|path| match Self::load_program(&path) {
            Ok(program) => Ok((path, program)),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "skipping program");
                Err(TuringMachineError::FileError(format!(
                    "Failed to load program from {}: {}",
                    path.display(),
                    e
                )))
            }
        }));

        results
    }
}

fn is_json(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "json")
}

fn is_tur(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "tur")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    const VALID: &str = "name: Test Program\ntape: a\nrules:\n  start:\n    a -> b, R, stop\n  stop:";

    fn write_file(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        let mut file = File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_load_valid_program() {
        let dir = tempdir().unwrap();
        let file_path = write_file(dir.path(), "test.tur", VALID);

        let program = ProgramLoader::load_program(&file_path).unwrap();
        assert_eq!(program.name, "Test Program");
        assert_eq!(program.initial_tape(), "a");
        assert_eq!(program.initial_state, "start");
        assert!(program.is_final("stop"));
    }

    #[test]
    fn test_load_json_request() {
        let dir = tempdir().unwrap();
        let file_path = write_file(
            dir.path(),
            "flip.json",
            r#"{
                "name": "Flip",
                "initial_tape": "0",
                "final_states": ["done"],
                "transitions": [
                    {"current_state": "q0", "read_symbol": "0", "next_state": "done", "write_symbol": "1", "move_direction": "N"}
                ]
            }"#,
        );

        let program = ProgramLoader::load_program(&file_path).unwrap();
        assert_eq!(program.name, "Flip");
        assert_eq!(program.initial_state, "q0");
        assert_eq!(program.rules.len(), 1);
    }

    #[test]
    fn test_load_invalid_program() {
        let dir = tempdir().unwrap();
        let file_path = write_file(dir.path(), "invalid.tur", "This is not a valid program");

        assert!(ProgramLoader::load_program(&file_path).is_err());
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempdir().unwrap();

        assert!(matches!(
            ProgramLoader::load_program(&dir.path().join("missing.tur")),
            Err(TuringMachineError::FileError(_))
        ));
    }

    #[test]
    fn test_load_oversized_program() {
        let dir = tempdir().unwrap();
        let file_path = write_file(dir.path(), "big.tur", VALID);
        let limits = Limits {
            max_program_size: 8,
            ..Limits::default()
        };

        assert!(matches!(
            ProgramLoader::load_program_with(&file_path, &limits),
            Err(TuringMachineError::ValidationError(_))
        ));
    }

    #[test]
    fn test_load_program_from_string() {
        let program = ProgramLoader::load_program_from_string(VALID).unwrap();
        assert_eq!(program.rules.len(), 1);
    }

    #[test]
    fn test_load_programs_from_directory() {
        let dir = tempdir().unwrap();

        write_file(dir.path(), "valid.tur", VALID);
        write_file(dir.path(), "invalid.tur", "This is not a valid program");
        write_file(dir.path(), "ignored.txt", "This file should be ignored");

        let results = ProgramLoader::load_programs(dir.path());

        // Sorted by path: invalid.tur, valid.tur
        assert_eq!(results.len(), 2);
        assert!(results[0].is_err());
        assert_eq!(results[1].as_ref().unwrap().1.name, "Test Program");
    }

    #[test]
    fn test_load_programs_missing_directory() {
        let dir = tempdir().unwrap();
        let results = ProgramLoader::load_programs(&dir.path().join("nope"));

        assert_eq!(results.len(), 1);
        assert!(results[0].is_err());
    }
}
