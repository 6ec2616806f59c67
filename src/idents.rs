//! Symbol collection for forward declarations.
//!
//! Guard conditions and action statements reference variables and
//! functions that the generator never defines; they come from the
//! hand-written collaborator code. This module scans the opaque text
//! for those names so the header can forward-declare them.

use std::collections::BTreeSet;
use std::sync::OnceLock;

use regex::Regex;

use crate::parse::Transition;

fn ident_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\b[A-Za-z_][A-Za-z0-9_]*\b").unwrap())
}

fn call_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\b([A-Za-z_][A-Za-z0-9_]*)\s*\(").unwrap())
}

/// External symbols referenced by conditions and actions, partitioned
/// by where they were seen so the header can pick a declaration shape.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Symbols {
    /// Variables read by at least one condition: `extern bool`.
    pub flags: BTreeSet<String>,
    /// Variables seen only in actions: `extern uint8_t`.
    pub scalars: BTreeSet<String>,
    /// Functions called from conditions: `bool f(void);`.
    pub predicates: BTreeSet<String>,
    /// Functions called only from actions: `void f(void);`.
    pub routines: BTreeSet<String>,
}

impl Symbols {
    /// Every variable name, regardless of classification.
    pub fn variables(&self) -> impl Iterator<Item = &str> + '_ {
        self.flags.iter().chain(&self.scalars).map(String::as_str)
    }

    /// Every function name, regardless of classification.
    pub fn functions(&self) -> impl Iterator<Item = &str> + '_ {
        self.predicates
            .iter()
            .chain(&self.routines)
            .map(String::as_str)
    }
}

/// Collect all external symbols referenced by `transitions`.
///
/// Any identifier immediately followed by `(` counts as a function and
/// is removed from the variable sets; the literals `true` and `false`
/// are excluded from both.
pub fn collect<'a>(transitions: impl IntoIterator<Item = &'a Transition>) -> Symbols {
    let mut condition_idents = BTreeSet::new();
    let mut action_idents = BTreeSet::new();
    let mut condition_calls = BTreeSet::new();
    let mut action_calls = BTreeSet::new();

    for transition in transitions {
        scan(
            &transition.condition,
            &mut condition_idents,
            &mut condition_calls,
        );
        for action in &transition.actions {
            scan(action, &mut action_idents, &mut action_calls);
        }
    }

    let functions: BTreeSet<String> = condition_calls.union(&action_calls).cloned().collect();
    let is_variable =
        |name: &&String| !functions.contains(*name) && *name != "true" && *name != "false";

    let flags: BTreeSet<String> = condition_idents.iter().filter(is_variable).cloned().collect();
    let scalars = action_idents
        .iter()
        .filter(is_variable)
        .filter(|name| !flags.contains(*name))
        .cloned()
        .collect();
    let routines = action_calls
        .difference(&condition_calls)
        .cloned()
        .collect();

    Symbols {
        flags,
        scalars,
        predicates: condition_calls,
        routines,
    }
}

fn scan(text: &str, idents: &mut BTreeSet<String>, calls: &mut BTreeSet<String>) {
    for found in ident_pattern().find_iter(text) {
        idents.insert(found.as_str().to_owned());
    }
    for caps in call_pattern().captures_iter(text) {
        calls.insert(caps[1].to_owned());
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::parse::parse_edge;

    fn symbols_of(lines: &[&str]) -> Symbols {
        let transitions: Vec<_> = lines
            .iter()
            .map(|line| parse_edge(line).expect("test line must parse"))
            .collect();
        collect(&transitions)
    }

    #[test]
    fn classifies_variables_and_functions() {
        let symbols = symbols_of(&[
            r#""A" -> "B" [label="EVT|flag|do_thing();counter=counter+1"]"#,
            r#""B" -> "A" [label="EVT2||"]"#,
        ]);
        let variables: Vec<_> = symbols.variables().collect();
        assert!(variables.contains(&"flag"));
        assert!(variables.contains(&"counter"));
        assert_eq!(symbols.functions().collect::<Vec<_>>(), vec!["do_thing"]);
        assert_eq!(symbols.flags.iter().collect::<Vec<_>>(), vec!["flag"]);
        assert_eq!(symbols.scalars.iter().collect::<Vec<_>>(), vec!["counter"]);
    }

    #[test]
    fn calls_win_over_variables() {
        // `check` appears bare in the condition and called in the
        // action; the call reclassifies it as a function everywhere.
        let symbols = symbols_of(&[r#""A" -> "B" [label="E|check|check()"]"#]);
        assert_eq!(symbols.functions().collect::<Vec<_>>(), vec!["check"]);
        assert_eq!(symbols.variables().count(), 0);
    }

    #[test]
    fn boolean_literals_are_excluded() {
        let symbols = symbols_of(&[r#""A" -> "B" [label="E|true|x=false"]"#]);
        let variables: Vec<_> = symbols.variables().collect();
        assert_eq!(variables, vec!["x"]);
    }

    #[test]
    fn condition_functions_are_predicates() {
        let symbols = symbols_of(&[
            r#""A" -> "B" [label="E|check_if_int_i()|setup(isr)"]"#,
        ]);
        assert_eq!(
            symbols.predicates.iter().collect::<Vec<_>>(),
            vec!["check_if_int_i"]
        );
        assert_eq!(symbols.routines.iter().collect::<Vec<_>>(), vec!["setup"]);
        assert_eq!(symbols.scalars.iter().collect::<Vec<_>>(), vec!["isr"]);
    }

    #[test]
    fn whitespace_before_the_paren_still_counts_as_a_call() {
        let symbols = symbols_of(&[r#""A" -> "B" [label="E||notify ()"]"#]);
        assert_eq!(symbols.functions().collect::<Vec<_>>(), vec!["notify"]);
    }
}
