//! This module provides the parser for Turing Machine programs, utilizing the `pest` crate.
//! It defines the grammar for `.tur` files and functions to parse the input into a `Program` struct.
//!
//! A `.tur` file looks like this:
//!
//! ```text
//! name: Binary increment
//! tape: 1011
//! final: q_halt
//! rules:
//!   q0:
//!     0 -> 0, R, q0
//!     1 -> 1, R, q0
//!     _ -> _, L, q1
//!   q1:
//!     0 -> 1, S, q_halt
//!     1 -> 0, L, q1
//!     _ -> 1, S, q_halt
//!   q_halt:
//! ```
//!
//! The first state block names the initial state. Without a `final:` section, every state
//! whose block has no actions is final.

use crate::{
    analyzer::analyze,
    types::{
        Direction, Program, Transition, TuringMachineError, DEFAULT_BLANK_SYMBOL,
        DEFAULT_MAX_STEPS, INPUT_BLANK_SYMBOL,
    },
};
use pest::{
    error::{Error, ErrorVariant},
    iterators::{Pair, Pairs},
    Parser as PestParser, Span,
};
use pest_derive::Parser as PestParser;
use std::collections::{BTreeSet, HashSet};

/// Derives a `PestParser` for the Turing Machine grammar defined in `grammar.pest`.
#[derive(PestParser)]
#[grammar = "grammar.pest"]
pub struct TuringMachineParser;

/// Parses the given input string into a `Program` struct.
///
/// This is the main entry point for parsing Turing Machine program definitions.
/// The parsed program is analyzed before being returned, so anything this returns can be
/// handed to [`TuringMachine::new`](crate::machine::TuringMachine::new).
///
/// # Returns
///
/// * `Ok(Program)` if the input is successfully parsed and validated.
/// * `Err(TuringMachineError::ParseError)` if there are any syntax errors.
/// * `Err(TuringMachineError::ValidationError)` if a required section is missing.
/// * `Err(TuringMachineError::Structural)` if the program is structurally invalid.
pub fn parse(input: &str) -> Result<Program, TuringMachineError> {
    let input = input.trim();
    let root = TuringMachineParser::parse(Rule::program, input)
        .map_err(|e| TuringMachineError::ParseError(e.into()))?
        .next()
        .ok_or_else(|| TuringMachineError::ValidationError("Empty program".to_string()))?;

    let program = parse_program(root)?;

    analyze(&program)?;

    Ok(program)
}

/// A state block: the state name and its actions in declaration order.
type StateBlock = (String, Vec<Transition>);

/// Parses the top-level structure of a Turing Machine program from a `Pair<Rule::program>`.
///
/// Sections may appear in any order but at most once; `tape`/`tapes` and `head`/`heads`
/// exclude each other.
fn parse_program(pair: Pair<Rule>) -> Result<Program, TuringMachineError> {
    let mut name: Option<String> = None;
    let mut tapes: Option<Vec<Vec<char>>> = None;
    let mut heads: Option<Vec<i64>> = None;
    let mut blank: Option<char> = None;
    let mut final_states: Option<BTreeSet<String>> = None;
    let mut max_steps: Option<usize> = None;
    let mut detect_loops: Option<bool> = None;
    let mut blocks: Option<Vec<StateBlock>> = None;
    let mut seen = HashSet::new();

    for p in pair.into_inner() {
        let span = p.as_span();
        let rule = p.as_rule();

        check_unique_rule(rule, span, &mut seen)?;

        match rule {
            Rule::name => name = Some(first_inner(p)?.as_str().trim().to_string()),
            Rule::blank => blank = Some(parse_symbol(first_inner(p)?)?),
            Rule::tape | Rule::tapes => {
                check_exclusive_rule(&tapes, &["tape", "tapes"], span)?;
                tapes = Some(parse_tapes(p)?);
            }
            Rule::head | Rule::heads => {
                check_exclusive_rule(&heads, &["head", "heads"], span)?;
                heads = Some(parse_heads(p)?);
            }
            Rule::final_states => {
                final_states = Some(p.into_inner().map(|s| s.as_str().to_string()).collect())
            }
            Rule::max_steps => max_steps = Some(parse_number(first_inner(p)?)?),
            Rule::detect_loops => detect_loops = Some(first_inner(p)?.as_str() == "true"),
            Rule::rules => blocks = Some(parse_transitions(p)?),
            _ => {} // EOI
        }
    }

    let name = check_required_rule(name, &["name"])?;
    let tapes = check_required_rule(tapes, &["tape", "tapes"])?;
    let blocks = check_required_rule(blocks, &["rules"])?;

    let initial_state = blocks
        .first()
        .map(|(state, _)| state.clone())
        .ok_or_else(|| {
            TuringMachineError::ValidationError("The 'rules' section has no states".to_string())
        })?;

    let final_states = final_states.unwrap_or_else(|| {
        blocks
            .iter()
            .filter(|(_, actions)| actions.is_empty())
            .map(|(state, _)| state.clone())
            .collect()
    });

    let blank = blank.unwrap_or(DEFAULT_BLANK_SYMBOL);
    let heads = heads.unwrap_or_else(|| vec![0; tapes.len()]);
    let rules = blocks
        .into_iter()
        .flat_map(|(_, actions)| actions)
        .map(|rule| rewrite_rule(rule, blank))
        .collect();

    Ok(Program {
        name,
        initial_state,
        final_states,
        blank,
        num_tapes: tapes.len(),
        tapes: tapes
            .into_iter()
            .map(|tape| tape.into_iter().map(|s| rewrite_symbol(s, blank)).collect())
            .collect(),
        heads,
        rules,
        max_steps: max_steps.unwrap_or(DEFAULT_MAX_STEPS),
        detect_loops: detect_loops.unwrap_or(true),
    })
}

/// Parses tape definitions from a `Pair<Rule::tape>` or `Pair<Rule::tapes>`.
fn parse_tapes(pair: Pair<Rule>) -> Result<Vec<Vec<char>>, TuringMachineError> {
    match pair.as_rule() {
        // Rule: tape > symbols? > [symbol]
        Rule::tape => Ok(vec![match pair.into_inner().next() {
            Some(symbols) => parse_symbols(symbols)?,
            None => Vec::new(),
        }]),
        // Rule: tapes > [tape_list > symbols? > [symbol]]
        _ => pair
            .into_inner()
            .map(|list| match list.into_inner().next() {
                Some(symbols) => parse_symbols(symbols),
                None => Ok(Vec::new()),
            })
            .collect(),
    }
}

/// Parses head position definitions from a `Pair<Rule::head>` or `Pair<Rule::heads>`.
fn parse_heads(pair: Pair<Rule>) -> Result<Vec<i64>, TuringMachineError> {
    pair.into_inner()
        .map(|index| {
            index.as_str().parse::<i64>().map_err(|e| {
                parse_error(&format!("Invalid head position: {e}"), index.as_span())
            })
        })
        .collect()
}

/// Parses the `rules` section into state blocks.
///
/// The first block names the initial state. A state may only have one block.
fn parse_transitions(pair: Pair<Rule>) -> Result<Vec<StateBlock>, TuringMachineError> {
    let mut blocks: Vec<StateBlock> = Vec::new();

    for transition_pair in pair.into_inner() {
        let span = transition_pair.as_span();
        let (state, actions) = parse_state_block(transition_pair)?;

        if blocks.iter().any(|(existing, _)| *existing == state) {
            return Err(parse_error(
                &format!("Duplicate transition rule: {state}"),
                span,
            ));
        }

        blocks.push((state, actions));
    }

    Ok(blocks)
}

/// Parses one state block from a `Pair<Rule::transition>`.
fn parse_state_block(pair: Pair<Rule>) -> Result<StateBlock, TuringMachineError> {
    let span = pair.as_span();
    let mut pairs = pair.into_inner();
    let state = next_pair(&mut pairs, span)?.as_str().to_string();
    let mut actions = Vec::new();

    // Rule: action > (single_tape_action | multi_tape_action)
    for action in pairs {
        let inner = first_inner(action)?;
        let transition = match inner.as_rule() {
            Rule::multi_tape_action => parse_multi_tape_action(&state, inner)?,
            _ => parse_single_tape_action(&state, inner)?,
        };
        actions.push(transition);
    }

    Ok((state, actions))
}

/// Parses a single-tape action from a `Pair<Rule::single_tape_action>`.
///
/// The write symbol defaults to the read symbol when omitted.
fn parse_single_tape_action(state: &str, pair: Pair<Rule>) -> Result<Transition, TuringMachineError> {
    let span = pair.as_span();
    let mut pairs = pair.into_inner();
    let read = parse_symbol(next_pair(&mut pairs, span)?)?;

    let write = match pairs.peek().map(|p| p.as_rule()) {
        Some(Rule::symbol) => parse_symbol(next_pair(&mut pairs, span)?)?,
        _ => read,
    };

    let direction = parse_direction(next_pair(&mut pairs, span)?)?;
    let next_state = next_pair(&mut pairs, span)?.as_str().to_string();

    Ok(Transition {
        state: state.to_string(),
        read: vec![read],
        write: vec![write],
        directions: vec![direction],
        next_state,
    })
}

/// Parses a multi-tape action from a `Pair<Rule::multi_tape_action>`.
///
/// The three lists must have the same length; whether that length matches the tape count is
/// checked by the analyzer.
fn parse_multi_tape_action(state: &str, pair: Pair<Rule>) -> Result<Transition, TuringMachineError> {
    let span = pair.as_span();
    let mut pairs = pair.into_inner();

    let read = parse_symbols(next_pair(&mut pairs, span)?)?;

    let write = match pairs.peek().map(|p| p.as_rule()) {
        Some(Rule::multi_tape_symbols) => parse_symbols(next_pair(&mut pairs, span)?)?,
        _ => read.clone(),
    };

    let directions = next_pair(&mut pairs, span)?
        .into_inner()
        .map(parse_direction)
        .collect::<Result<Vec<_>, _>>()?;

    let next_state = next_pair(&mut pairs, span)?.as_str().to_string();

    if read.len() != write.len() || read.len() != directions.len() {
        return Err(parse_error(
            &format!(
                "Inconsistent multi-tape action: read={}, write={}, directions={}",
                read.len(),
                write.len(),
                directions.len()
            ),
            span,
        ));
    }

    Ok(Transition {
        state: state.to_string(),
        read,
        write,
        directions,
        next_state,
    })
}

/// Parses every `symbol` below `pair`.
fn parse_symbols(pair: Pair<Rule>) -> Result<Vec<char>, TuringMachineError> {
    pair.into_inner().map(parse_symbol).collect()
}

/// Parses a single direction from a `Pair<Rule::direction>`.
///
/// Supports '<' or 'L' for Left, '>' or 'R' for Right, and '-', 'S' or 'N' for Stay.
fn parse_direction(pair: Pair<Rule>) -> Result<Direction, TuringMachineError> {
    match pair.as_str() {
        "<" | "L" => Ok(Direction::Left),
        ">" | "R" => Ok(Direction::Right),
        "-" | "S" | "N" => Ok(Direction::Stay),
        other => Err(parse_error(
            &format!("Unsupported direction: {other}"),
            pair.as_span(),
        )),
    }
}

/// Parses a symbol, stripping the quotes of a quoted one.
fn parse_symbol(pair: Pair<Rule>) -> Result<char, TuringMachineError> {
    let raw = pair.as_str();
    let inner = raw
        .strip_prefix('\'')
        .and_then(|s| s.strip_suffix('\''))
        .unwrap_or(raw);

    inner
        .chars()
        .next()
        .ok_or_else(|| parse_error("Empty symbol", pair.as_span()))
}

fn parse_number(pair: Pair<Rule>) -> Result<usize, TuringMachineError> {
    pair.as_str()
        .parse()
        .map_err(|e| parse_error(&format!("Invalid number: {e}"), pair.as_span()))
}

/// `_` in program text always means the blank symbol, whatever it is.
fn rewrite_symbol(symbol: char, blank: char) -> char {
    if symbol == INPUT_BLANK_SYMBOL {
        blank
    } else {
        symbol
    }
}

fn rewrite_rule(mut rule: Transition, blank: char) -> Transition {
    for symbol in rule.read.iter_mut().chain(rule.write.iter_mut()) {
        *symbol = rewrite_symbol(*symbol, blank);
    }

    rule
}

/// Creates a `TuringMachineError::ParseError` from a message and a `Span`.
fn parse_error(msg: &str, span: Span) -> TuringMachineError {
    TuringMachineError::ParseError(Box::new(Error::new_from_span(
        ErrorVariant::CustomError {
            message: msg.to_string(),
        },
        span,
    )))
}

/// Takes the next pair, which the grammar guarantees to exist.
fn next_pair<'i>(pairs: &mut Pairs<'i, Rule>, span: Span) -> Result<Pair<'i, Rule>, TuringMachineError> {
    pairs
        .next()
        .ok_or_else(|| parse_error("Unexpected end of rule", span))
}

fn first_inner(pair: Pair<Rule>) -> Result<Pair<Rule>, TuringMachineError> {
    let span = pair.as_span();
    next_pair(&mut pair.into_inner(), span)
}

/// Checks if a given rule has already been declared, ensuring uniqueness for top-level sections.
fn check_unique_rule(
    rule: Rule,
    span: Span,
    seen: &mut HashSet<Rule>,
) -> Result<(), TuringMachineError> {
    if rule == Rule::EOI {
        return Ok(());
    }

    if !seen.insert(rule) {
        return Err(parse_error(
            &format!("Duplicate \"{rule:?}:\" declaration"),
            span,
        ));
    }

    Ok(())
}

/// Checks if an exclusive rule (e.g., `tape` vs. `tapes`) has been violated.
fn check_exclusive_rule<T>(
    value: &Option<T>,
    names: &[&str],
    span: Span,
) -> Result<(), TuringMachineError> {
    if value.is_some() {
        return Err(parse_error(
            &format!("Only one of {} is allowed", format_rules(names)),
            span,
        ));
    }

    Ok(())
}

/// Checks if a required rule is present, returning an `Err` if it's missing.
fn check_required_rule<T>(value: Option<T>, names: &[&str]) -> Result<T, TuringMachineError> {
    value.ok_or_else(|| {
        TuringMachineError::ValidationError(format!("Missing {} section", format_rules(names)))
    })
}

/// Formats a list of rule names into a human-readable string for error messages.
fn format_rules(names: &[&str]) -> String {
    names
        .iter()
        .map(|s| format!("'{s}'"))
        .collect::<Vec<_>>()
        .join(" or ")
}
