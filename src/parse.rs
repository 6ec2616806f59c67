use std::sync::OnceLock;

use regex::Regex;

/// One parsed graph edge: a single state transition.
///
/// `condition` and the `actions` statements are opaque C text, copied
/// into the generated code verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub source: String,
    pub destination: String,
    /// Event text as written in the label.
    pub event_raw: String,
    /// Uppercased identifier derived from `event_raw`, used as the
    /// `Event` enum member.
    pub event_symbol: String,
    pub condition: String,
    /// Each statement re-terminated with `;`, in label order.
    pub actions: Vec<String>,
    /// The unsplit label, kept for the trace comment.
    pub label: String,
}

impl Transition {
    /// The guard expression, or [`None`] when the transition is
    /// unconditional (empty or literal `true` condition).
    pub fn guard(&self) -> Option<&str> {
        let condition = self.condition.trim();
        match condition.is_empty() || condition.eq_ignore_ascii_case("true") {
            true => None,
            false => Some(condition),
        }
    }
}

fn edge_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#""([^"]+)"\s*->\s*"([^"]+)"\s*\[label="(.+?)"\]"#).unwrap()
    })
}

/// Parse one line of the description file.
///
/// Returns [`None`] for anything that is not an edge line. The label's
/// `|`-separated segments are positional and optional from the right:
/// event (default `UNKNOWN_EVENT`), condition (default `true`), and a
/// `;`-separated action list.
pub fn parse_edge(line: &str) -> Option<Transition> {
    let caps = edge_pattern().captures(line.trim())?;
    let label = caps[3].to_owned();

    let mut segments = label.split('|').map(str::trim);
    let event_raw = match segments.next() {
        Some("") | None => String::from("UNKNOWN_EVENT"),
        Some(event) => event.to_owned(),
    };
    let condition = segments.next().unwrap_or("true").to_owned();
    let actions = segments
        .next()
        .unwrap_or("")
        .split(';')
        .map(str::trim)
        .filter(|action| !action.is_empty())
        .map(|action| format!("{action};"))
        .collect();

    Some(Transition {
        source: caps[1].to_owned(),
        destination: caps[2].to_owned(),
        event_symbol: sanitize_symbol(&event_raw),
        event_raw,
        condition,
        actions,
        label,
    })
}

/// Whether a line that failed to parse was at least trying to be an
/// edge, and so deserves a warning rather than silence.
pub fn looks_like_edge(line: &str) -> bool {
    line.contains("->") && line.contains("label=")
}

/// Uppercase `raw` and collapse every run of characters outside
/// `[A-Za-z0-9_]` into a single `_`.
///
/// Used for `Event` enum members and include guards. Idempotent.
pub fn sanitize_symbol(raw: &str) -> String {
    static INVALID: OnceLock<Regex> = OnceLock::new();
    let invalid = INVALID.get_or_init(|| Regex::new(r"[^A-Za-z0-9_]+").unwrap());
    invalid
        .replace_all(&raw.trim().to_uppercase(), "_")
        .into_owned()
}
