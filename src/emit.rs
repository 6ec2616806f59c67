//! Renders the transition table as C code.

use itertools::Itertools as _;

use crate::parse::{sanitize_symbol, Transition};
use crate::StateMachine;

/// How transitions out of one state are tested against each other.
///
/// The two forms differ when two transitions for the same state share
/// an event with overlapping (or absent) guards: with independent `if`
/// blocks every matching transition fires in turn, with the chain only
/// the first does.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Strategy {
    /// A plain sequence of `if` blocks per transition.
    IndependentConditions,
    /// An `if` / `else if` chain: the first matching transition wins,
    /// matching the table's documented ordering semantics.
    #[default]
    FirstMatchChain,
}

/// Renders the dispatch function and the declarations header for one
/// [`StateMachine`].
#[derive(Debug)]
pub struct Emitter<'a> {
    machine: &'a StateMachine,
    strategy: Strategy,
    isr_arg: bool,
}

impl<'a> Emitter<'a> {
    pub fn new(machine: &'a StateMachine) -> Self {
        Self {
            machine,
            strategy: Strategy::default(),
            isr_arg: false,
        }
    }

    pub fn strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Move the dispatch into `update_state_isr(Event, uint8_t)` and
    /// have `update_state` delegate to it with a `0` payload.
    pub fn with_isr_arg(mut self, isr_arg: bool) -> Self {
        self.isr_arg = isr_arg;
        self
    }

    /// The generated dispatch function(s), written after the merge
    /// marker in the source artifact.
    pub fn dispatch(&self) -> String {
        let mut out = String::new();
        match self.isr_arg {
            true => out.push_str("void update_state_isr(Event event, uint8_t isr) {\n"),
            false => out.push_str("void update_state(Event event) {\n"),
        }
        out.push_str("  switch (current_state) {\n");
        for state in self.machine.states() {
            out.push_str(&format!("    case {state}:\n"));
            self.push_transitions(&mut out, self.machine.transitions_from(state));
            out.push_str("      break;\n\n");
        }
        out.push_str("  }\n}\n");
        if self.isr_arg {
            out.push_str("\nvoid update_state(Event event) {\n");
            out.push_str("  update_state_isr(event, 0);\n");
            out.push_str("}\n");
        }
        out
    }

    fn push_transitions(&self, out: &mut String, transitions: &[Transition]) {
        for (index, transition) in transitions.iter().enumerate() {
            let chained = self.strategy == Strategy::FirstMatchChain && index > 0;
            out.push_str(&format!(
                "      // {} -> {} ({})\n",
                transition.source, transition.destination, transition.label
            ));
            let test = match transition.guard() {
                None => format!("event == {}", transition.event_symbol),
                Some(guard) => format!("event == {} && {}", transition.event_symbol, guard),
            };
            match chained {
                true => out.push_str(&format!("      else if ({test}) {{\n")),
                false => out.push_str(&format!("      if ({test}) {{\n")),
            }
            out.push_str(&format!("        current_state = {};\n", transition.destination));
            for action in &transition.actions {
                out.push_str(&format!("        {action}\n"));
            }
            out.push_str("      }\n");
        }
    }

    /// The declarations artifact. `file_name` is the header's own file
    /// name; its sanitized form becomes the include guard.
    pub fn header(&self, file_name: &str) -> String {
        let guard = sanitize_symbol(file_name);
        let symbols = self.machine.symbols();
        let states = self.machine.states().join(",\n    ");
        let events = self.machine.events().join(",\n    ");

        let mut out = String::new();
        out.push_str(&format!("#ifndef {guard}\n#define {guard}\n\n"));
        out.push_str("#include <stdbool.h>\n#include <stdint.h>\n\n");
        out.push_str(&format!("typedef enum {{\n    {states}\n}} State;\n\n"));
        out.push_str(&format!("typedef enum {{\n    {events}\n}} Event;\n\n"));
        out.push_str("extern State current_state;\n");
        for flag in &symbols.flags {
            out.push_str(&format!("extern bool {flag};\n"));
        }
        for scalar in &symbols.scalars {
            out.push_str(&format!("extern uint8_t {scalar};\n"));
        }
        out.push('\n');
        for predicate in &symbols.predicates {
            out.push_str(&format!("bool {predicate}(void);\n"));
        }
        for routine in &symbols.routines {
            out.push_str(&format!("void {routine}(void);\n"));
        }
        if symbols.functions().next().is_some() {
            out.push('\n');
        }
        if self.isr_arg {
            out.push_str("void update_state_isr(Event event, uint8_t isr);\n");
        }
        out.push_str("void update_state(Event event);\n\n");
        out.push_str(&format!("#endif // {guard}\n"));
        out
    }
}

#[cfg(test)]
mod tests {
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    use super::*;

    fn machine(lines: &[&str]) -> StateMachine {
        StateMachine::from_input(&lines.join("\n")).expect("test input must parse")
    }

    #[test]
    fn dispatch_for_the_two_state_scenario() {
        let machine = machine(&[
            r#""A" -> "B" [label="EVT|flag|do_thing();counter=counter+1"]"#,
            r#""B" -> "A" [label="EVT2||"]"#,
        ]);
        let dispatch = Emitter::new(&machine).dispatch();
        assert_eq!(
            dispatch,
            indoc! {r#"
                void update_state(Event event) {
                  switch (current_state) {
                    case A:
                      // A -> B (EVT|flag|do_thing();counter=counter+1)
                      if (event == EVT && flag) {
                        current_state = B;
                        do_thing();
                        counter=counter+1;
                      }
                      break;

                    case B:
                      // B -> A (EVT2||)
                      if (event == EVT2) {
                        current_state = A;
                      }
                      break;

                  }
                }
            "#}
        );
    }

    #[test]
    fn first_match_chain_makes_branches_exclusive() {
        let machine = machine(&[
            r#""S" -> "A" [label="GO|ready|arm()"]"#,
            r#""S" -> "B" [label="GO||"]"#,
        ]);
        let dispatch = Emitter::new(&machine)
            .strategy(Strategy::FirstMatchChain)
            .dispatch();
        assert!(dispatch.contains("else if (event == GO)"));
        // Only the first test opens with a bare `if`.
        assert_eq!(dispatch.matches("      if (").count(), 1);
    }

    #[test]
    fn independent_conditions_emit_separate_if_blocks() {
        let machine = machine(&[
            r#""S" -> "A" [label="GO|ready|arm()"]"#,
            r#""S" -> "B" [label="GO||"]"#,
        ]);
        let dispatch = Emitter::new(&machine)
            .strategy(Strategy::IndependentConditions)
            .dispatch();
        assert!(!dispatch.contains("else if"));
        assert_eq!(dispatch.matches("      if (").count(), 2);
    }

    #[test]
    fn unconditional_transitions_omit_the_guard_clause() {
        let machine = machine(&[
            r#""A" -> "B" [label="X|true|"]"#,
            r#""B" -> "C" [label="Y|TRUE|"]"#,
            r#""C" -> "A" [label="Z||"]"#,
        ]);
        let dispatch = Emitter::new(&machine).dispatch();
        assert!(dispatch.contains("if (event == X) {"));
        assert!(dispatch.contains("if (event == Y) {"));
        assert!(dispatch.contains("if (event == Z) {"));
        assert!(!dispatch.contains("&&"));
    }

    #[test]
    fn destination_only_states_still_get_a_case() {
        let machine = machine(&[r#""A" -> "B" [label="X||"]"#]);
        let dispatch = Emitter::new(&machine).dispatch();
        assert!(dispatch.contains("    case B:\n      break;"));
    }

    #[test]
    fn isr_variant_delegates_from_update_state() {
        let machine = machine(&[r#""A" -> "B" [label="X||"]"#]);
        let dispatch = Emitter::new(&machine).with_isr_arg(true).dispatch();
        assert!(dispatch.starts_with("void update_state_isr(Event event, uint8_t isr) {"));
        assert!(dispatch.ends_with(
            "void update_state(Event event) {\n  update_state_isr(event, 0);\n}\n"
        ));
    }

    #[test]
    fn header_for_the_two_state_scenario() {
        let machine = machine(&[
            r#""A" -> "B" [label="EVT|flag|do_thing();counter=counter+1"]"#,
            r#""B" -> "A" [label="EVT2||"]"#,
        ]);
        let header = Emitter::new(&machine).header("scenario.h");
        assert_eq!(
            header,
            indoc! {r#"
                #ifndef SCENARIO_H
                #define SCENARIO_H

                #include <stdbool.h>
                #include <stdint.h>

                typedef enum {
                    A,
                    B
                } State;

                typedef enum {
                    EVT,
                    EVT2
                } Event;

                extern State current_state;
                extern bool flag;
                extern uint8_t counter;

                void do_thing(void);

                void update_state(Event event);

                #endif // SCENARIO_H
            "#}
        );
    }

    #[test]
    fn enum_members_never_dangle_a_comma() {
        let machine = machine(&[r#""A" -> "B" [label="X||"]"#]);
        let header = Emitter::new(&machine).header("m.h");
        assert!(header.contains("    B\n} State;"));
        assert!(header.contains("    X\n} Event;"));
    }

    #[test]
    fn header_declares_the_isr_entry_point_when_enabled() {
        let machine = machine(&[r#""A" -> "B" [label="X||"]"#]);
        let header = Emitter::new(&machine).with_isr_arg(true).header("m.h");
        assert!(header.contains("void update_state_isr(Event event, uint8_t isr);\n"));
        assert!(header.contains("void update_state(Event event);\n"));
    }
}
