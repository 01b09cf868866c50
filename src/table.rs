//! The transition table: an index from `(state, symbols read)` to the rule that fires.

use std::collections::HashMap;

use crate::types::{StructuralError, Transition};

/// A validated, immutable index over a program's rules.
///
/// When several rules share the same `(state, read)` key, the first one in declaration order
/// wins and the rest are recorded as shadowed. Lookups never see a shadowed rule.
#[derive(Debug, Clone)]
pub struct TransitionTable {
    rules: Vec<Transition>,
    index: HashMap<String, HashMap<Vec<char>, usize>>,
    shadowed: Vec<usize>,
}

impl TransitionTable {
    /// Builds the table, rejecting any rule that doesn't address exactly `num_tapes` tapes.
    pub fn new(rules: &[Transition], num_tapes: usize) -> Result<Self, StructuralError> {
        let mut index: HashMap<String, HashMap<Vec<char>, usize>> = HashMap::new();
        let mut shadowed = Vec::new();

        for (i, rule) in rules.iter().enumerate() {
            rule.check_arity(i, num_tapes)?;

            let by_symbols = index.entry(rule.state.clone()).or_default();
            if by_symbols.contains_key(&rule.read) {
                tracing::warn!(
                    state = %rule.state,
                    read = ?rule.read,
                    rule = i,
                    "rule is shadowed by an earlier rule with the same key"
                );
                shadowed.push(i);
            } else {
                by_symbols.insert(rule.read.clone(), i);
            }
        }

        Ok(Self {
            rules: rules.to_vec(),
            index,
            shadowed,
        })
    }

    /// Returns the rule for `state` reading `symbols`, if any.
    pub fn lookup(&self, state: &str, symbols: &[char]) -> Option<&Transition> {
        self.index
            .get(state)
            .and_then(|by_symbols| by_symbols.get(symbols))
            .map(|&i| &self.rules[i])
    }

    /// Returns true if at least one rule starts in `state`.
    pub fn has_rules_for(&self, state: &str) -> bool {
        self.index.contains_key(state)
    }

    /// Declaration indices of rules that can never fire because an earlier rule has their key.
    pub fn shadowed(&self) -> &[usize] {
        &self.shadowed
    }

    /// All rules in declaration order, shadowed ones included.
    pub fn rules(&self) -> &[Transition] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
