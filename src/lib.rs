//! Turn a restricted DOT description of a finite-state machine into C
//! dispatch code.
//!
//! The input is a line-oriented subset of DOT where each edge carries a
//! structured label:
//!
//! ```text
//! digraph G {
//!     "IDLE" -> "RUNNING" [label="START|ready|setup();count=0"]
//!     "RUNNING" -> "IDLE" [label="STOP||"]
//! }
//! ```
//!
//! Edge lines are parsed into [`Transition`](parse::Transition)s and
//! accumulated into a [`StateMachine`]; [`emit::Emitter`] renders the
//! state/event enums and an `update_state` dispatch function, and
//! [`merge`] splices the result into the target artifacts without
//! disturbing hand-written code around it.

pub mod emit;
pub mod idents;
pub mod merge;
pub mod parse;

use std::collections::{BTreeMap, BTreeSet};

use log::warn;

use crate::idents::Symbols;
use crate::parse::Transition;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The input contained no parsable edge lines, so there is nothing
    /// to generate and no file is written.
    #[error("no state-machine edges found in input")]
    NoTransitions,
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// The transition table plus the sets of states and events seen.
///
/// States and events iterate in lexicographic order so regeneration is
/// reproducible regardless of input order; transitions out of one state
/// keep their source-file order, and the emitted code tests them in
/// that order.
#[derive(Debug, Default)]
pub struct StateMachine {
    transitions: BTreeMap<String, Vec<Transition>>,
    states: BTreeSet<String>,
    events: BTreeSet<String>,
}

impl StateMachine {
    /// Build the machine from the whole input text.
    ///
    /// If the input carries a `digraph ... {` wrapper, only lines
    /// between the opening line and the closing `}` are scanned. Lines
    /// that look like edges but fail to parse are logged and skipped;
    /// anything else (comments, braces, blank lines) is ignored.
    pub fn from_input(input: &str) -> Result<Self, Error> {
        let mut machine = Self::default();
        let has_wrapper = input.lines().any(is_graph_open);
        // Flat open/close flag, not a depth counter: the hand-authored
        // inputs this reads never nest braces.
        let mut inside = !has_wrapper;
        for line in input.lines() {
            let trimmed = line.trim();
            if has_wrapper {
                if !inside {
                    inside = is_graph_open(trimmed);
                    continue;
                }
                if trimmed == "}" {
                    inside = false;
                    continue;
                }
            }
            match parse::parse_edge(trimmed) {
                Some(transition) => machine.insert(transition),
                None if parse::looks_like_edge(trimmed) => {
                    warn!("could not parse edge line: {trimmed}");
                }
                None => {}
            }
        }
        match machine.is_empty() {
            true => Err(Error::NoTransitions),
            false => Ok(machine),
        }
    }

    /// Append a transition under its source state and record both
    /// endpoint states and the event symbol.
    pub fn insert(&mut self, transition: Transition) {
        self.states.insert(transition.source.clone());
        self.states.insert(transition.destination.clone());
        self.events.insert(transition.event_symbol.clone());
        self.transitions
            .entry(transition.source.clone())
            .or_default()
            .push(transition);
    }

    /// All distinct states, lexicographically sorted.
    pub fn states(&self) -> impl Iterator<Item = &str> + '_ {
        self.states.iter().map(String::as_str)
    }

    /// All distinct sanitized event symbols, lexicographically sorted.
    pub fn events(&self) -> impl Iterator<Item = &str> + '_ {
        self.events.iter().map(String::as_str)
    }

    /// Transitions out of `state`, in source-file order.
    pub fn transitions_from(&self, state: &str) -> &[Transition] {
        self.transitions
            .get(state)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Every transition, grouped by source state.
    pub fn iter(&self) -> impl Iterator<Item = &Transition> + '_ {
        self.transitions.values().flatten()
    }

    pub fn len(&self) -> usize {
        self.transitions.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.transitions.is_empty()
    }

    /// External variables and functions referenced by conditions and
    /// actions.
    pub fn symbols(&self) -> Symbols {
        idents::collect(self.iter())
    }
}

fn is_graph_open(line: &str) -> bool {
    let line = line.trim_start();
    line.starts_with("digraph") && line.contains('{')
}
