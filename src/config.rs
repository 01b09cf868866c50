//! Host limits applied when programs arrive from outside the process.

use serde::{Deserialize, Serialize};

use crate::types::{
    Program, TuringMachineError, MAX_EXECUTION_STEPS, MAX_PROGRAM_SIZE, MAX_TAPES,
};

/// Upper bounds a host enforces on incoming programs.
///
/// The engine itself runs any structurally valid program; these limits keep a single request
/// from monopolizing the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Limits {
    /// Largest step budget a program may ask for.
    pub max_steps: usize,
    /// Largest number of tapes.
    pub max_tapes: usize,
    /// Largest program source, in bytes.
    pub max_program_size: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_steps: MAX_EXECUTION_STEPS,
            max_tapes: MAX_TAPES,
            max_program_size: MAX_PROGRAM_SIZE,
        }
    }
}

impl Limits {
    /// Rejects programs that exceed these limits.
    pub fn check(&self, program: &Program) -> Result<(), TuringMachineError> {
        if program.max_steps > self.max_steps {
            return Err(TuringMachineError::ValidationError(format!(
                "Step budget {} exceeds the limit of {}",
                program.max_steps, self.max_steps
            )));
        }

        if program.num_tapes > self.max_tapes {
            return Err(TuringMachineError::ValidationError(format!(
                "{} tapes requested, at most {} are supported",
                program.num_tapes, self.max_tapes
            )));
        }

        Ok(())
    }

    /// Rejects program sources larger than `max_program_size`.
    pub fn check_size(&self, len: usize) -> Result<(), TuringMachineError> {
        if len > self.max_program_size {
            return Err(TuringMachineError::ValidationError(format!(
                "Program is {len} bytes, the limit is {} bytes",
                self.max_program_size
            )));
        }

        Ok(())
    }
}
