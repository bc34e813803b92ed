//! Line classifier.
//!
//! Classification never fails. Lines that look like directives but do not
//! fit the grammar (unknown domain, missing operation, unknown `OUTPUT`
//! marker) degrade to [`ProtocolEvent::Text`] carrying the untouched line.

use tracing::debug;

use crate::models::event::{Detail, ProgressDomain, ProtocolEvent};

const FIELD_SEPARATOR: char = ';';
const PROGRESS_TAG: &str = "PROGRESS";
const OUTPUT_TAG: &str = "OUTPUT";

/// Classify a single worker output line.
///
/// Total over all inputs: every line maps to exactly one event. Use
/// [`classify_line`] to drop blank lines first.
#[must_use]
pub fn classify(line: &str) -> ProtocolEvent {
    let fields: Vec<&str> = line.split(FIELD_SEPARATOR).collect();

    let event = match fields.first().copied() {
        Some(PROGRESS_TAG) => parse_progress(&fields),
        Some(OUTPUT_TAG) => parse_output_marker(&fields),
        _ => None,
    };

    event.unwrap_or_else(|| ProtocolEvent::Text {
        content: line.to_owned(),
    })
}

/// Classify a line, returning `None` for empty or whitespace-only input.
#[must_use]
pub fn classify_line(line: &str) -> Option<ProtocolEvent> {
    if line.trim().is_empty() {
        return None;
    }
    Some(classify(line))
}

fn parse_progress(fields: &[&str]) -> Option<ProtocolEvent> {
    let Some(domain) = fields.get(1).and_then(|tag| ProgressDomain::from_tag(tag)) else {
        debug!(line_fields = fields.len(), "progress line with unknown domain");
        return None;
    };

    let operation = fields.get(2).copied().filter(|op| !op.is_empty())?;

    let detail = match domain {
        ProgressDomain::Jpm if fields.len() > 3 => fields.last().and_then(|raw| parse_detail(raw)),
        ProgressDomain::Jpm | ProgressDomain::Gpt => None,
    };

    Some(ProtocolEvent::Progress {
        domain,
        operation: operation.to_owned(),
        detail,
    })
}

fn parse_detail(raw: &str) -> Option<Detail> {
    raw.split_once(':')
        .map(|(label, value)| Detail::new(label, value))
}

fn parse_output_marker(fields: &[&str]) -> Option<ProtocolEvent> {
    match fields.get(1).copied() {
        Some("START") => Some(ProtocolEvent::OutputStart),
        Some("END") => Some(ProtocolEvent::OutputEnd),
        _ => None,
    }
}
