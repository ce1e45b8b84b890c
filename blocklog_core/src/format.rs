//! Line formatting: prefix fragments, payload serialization and indentation.
//!
//! Everything here is a pure function of its arguments. The wall clock is
//! read by the caller and passed in, so rendering is deterministic in tests.

use crate::{Payload, Payloads, Severity};
use chrono::{DateTime, Local};

const SHORT_TIME_FORMAT: &str = "%H:%M:%S";
const FULL_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Render the timestamp fragment, empty when time display is off
pub fn format_timestamp(now: &DateTime<Local>, show_time: bool, short_time: bool) -> String {
    if !show_time {
        return String::new();
    }
    let pattern = if short_time {
        SHORT_TIME_FORMAT
    } else {
        FULL_TIME_FORMAT
    };
    now.format(pattern).to_string()
}

pub fn format_channel_tag(severity: Severity, show_channel: bool) -> &'static str {
    if show_channel {
        severity.symbol()
    } else {
        ""
    }
}

/// Join the non-empty prefix fragments with spaces and close with `|`.
pub fn compose_prefix_line(tag: &str, time: &str, user_prefix: &str) -> String {
    let mut line = [tag, time, user_prefix]
        .into_iter()
        .filter(|fragment| !fragment.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    line.push('|');
    line
}

/// Serialize one payload for inclusion in the composed line.
///
/// Returns `None` for non-text payloads on `error`/`trace`: those are handed
/// to the console's native rendering unchanged instead.
pub fn serialize_payload(severity: Severity, payload: &Payload) -> Option<String> {
    match payload {
        Payload::Text(text) => Some(text.clone()),
        _ if defers_to_native(severity) => None,
        other => Some(other.inspect()),
    }
}

/// Whether non-text payloads on this severity bypass pre-serialization
pub fn defers_to_native(severity: Severity) -> bool {
    matches!(severity, Severity::Error | Severity::Trace)
}

/// Serialize and space-join the payloads that belong in the line.
///
/// Deferred payloads (see [`serialize_payload`]) are skipped, so on `error`
/// and `trace` the line holds only the text arguments, in order.
pub fn join_payloads(severity: Severity, payloads: &Payloads) -> String {
    payloads
        .iter()
        .filter_map(|payload| serialize_payload(severity, payload))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Indent every line of `text` by `width` spaces.
pub fn apply_indent(text: &str, width: usize) -> String {
    let pad = " ".repeat(width);
    if !text.contains('\n') {
        return format!("{}{}", pad, text);
    }

    let separator = format!("\n{}", pad);
    let lines: Vec<&str> = text
        .split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .collect();
    format!("{}{}", pad, lines.join(&separator))
}

pub fn compose_label(label: Option<&str>) -> String {
    match label {
        Some(label) if !label.is_empty() => format!("<{}> ", label),
        _ => String::new(),
    }
}
