//! Infinite-loop detection by configuration repetition.
//!
//! A deterministic machine that reaches the same configuration twice will cycle forever, so a
//! repeat is proof of non-termination. Fingerprints hold the full materialized tapes; memory
//! grows with the number of distinct configurations times the tape length.

use std::collections::HashSet;

use crate::machine::Configuration;
use crate::tape::Window;

/// Exact identity of a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint {
    state: String,
    heads: Vec<i64>,
    tapes: Vec<Window>,
}

impl Fingerprint {
    pub fn of(configuration: &Configuration) -> Self {
        Self {
            state: configuration.state().to_string(),
            heads: configuration.heads().to_vec(),
            tapes: configuration.tapes().iter().map(|tape| tape.window()).collect(),
        }
    }
}

/// Remembers every configuration it has observed.
#[derive(Debug, Default, Clone)]
pub struct LoopDetector {
    seen: HashSet<Fingerprint>,
}

impl LoopDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the configuration. Returns true if it had already been recorded.
    pub fn observe(&mut self, configuration: &Configuration) -> bool {
        !self.seen.insert(Fingerprint::of(configuration))
    }

    /// Number of distinct configurations recorded.
    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }

    pub fn clear(&mut self) {
        self.seen.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tape::Tape;
    use crate::types::{Direction, Transition};

    fn configuration(state: &str, tape: &str, head: i64) -> Configuration {
        Configuration::new(state, vec![Tape::new(tape, '_')], vec![head]).unwrap()
    }

    #[test]
    fn test_repeat_is_detected() {
        let mut detector = LoopDetector::new();

        assert!(!detector.observe(&configuration("q0", "01", 0)));
        assert!(!detector.observe(&configuration("q0", "01", 1)));
        assert!(!detector.observe(&configuration("q1", "01", 0)));
        assert!(!detector.observe(&configuration("q0", "11", 0)));
        assert!(detector.observe(&configuration("q0", "01", 0)));
        assert_eq!(detector.len(), 4);
    }

    #[test]
    fn test_blank_padding_does_not_matter() {
        let mut detector = LoopDetector::new();

        assert!(!detector.observe(&configuration("q0", "1", 0)));
        assert!(detector.observe(&configuration("q0", "1__", 0)));
    }

    #[test]
    fn test_shifted_content_is_distinct() {
        let mut detector = LoopDetector::new();
        let mut shifted = configuration("q0", "", 0);
        shifted.apply(&Transition {
            state: "q0".to_string(),
            read: vec!['_'],
            write: vec!['1'],
            directions: vec![Direction::Stay],
            next_state: "q0".to_string(),
        });

        assert!(!detector.observe(&shifted));
        // Same content, one cell further right.
        let mut other = configuration("q0", "_", 0);
        other.apply(&Transition {
            state: "q0".to_string(),
            read: vec!['_'],
            write: vec!['_'],
            directions: vec![Direction::Right],
            next_state: "q0".to_string(),
        });
        other.apply(&Transition {
            state: "q0".to_string(),
            read: vec!['_'],
            write: vec!['1'],
            directions: vec![Direction::Left],
            next_state: "q0".to_string(),
        });
        assert!(!detector.observe(&other));
    }

    #[test]
    fn test_clear() {
        let mut detector = LoopDetector::new();
        detector.observe(&configuration("q0", "1", 0));
        detector.clear();

        assert!(detector.is_empty());
        assert!(!detector.observe(&configuration("q0", "1", 0)));
    }
}
