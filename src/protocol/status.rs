//! Human-readable status lines for progress markers.

use crate::models::event::{Detail, ProgressDomain, ProtocolEvent};

/// Render the status indicator text for a progress event.
///
/// Returns `None` for non-progress events and for operations this table does
/// not know; unknown operations are a no-op rather than an error so newer
/// workers can add markers without breaking older clients.
#[must_use]
pub fn status_label(event: &ProtocolEvent) -> Option<String> {
    let ProtocolEvent::Progress {
        domain,
        operation,
        detail,
    } = event
    else {
        return None;
    };

    match domain {
        ProgressDomain::Jpm => jpm_label(operation, detail.as_ref()),
        ProgressDomain::Gpt => match operation.as_str() {
            "generate" => Some("Generating response".to_owned()),
            _ => None,
        },
    }
}

fn jpm_label(operation: &str, detail: Option<&Detail>) -> Option<String> {
    let fixed = match operation {
        "init" => "Initializing jpm project",
        "list" => "Listing packages",
        "build" => "Building project",
        "test" => "Testing project",
        "run" => "Running project",
        "clean" => "Cleaning build output",
        "version" => "Reading project version",
        "set" => "Setting main class",
        "getMetadata" => "Reading project metadata",
        "refresh" => "Applying project settings",
        "install" => return Some(with_target("Installing", detail)),
        "update" => return Some(with_target("Updating", detail)),
        "delete" => return Some(with_target("Deleting", detail)),
        _ => return None,
    };
    Some(fixed.to_owned())
}

fn with_target(verb: &str, detail: Option<&Detail>) -> String {
    match detail.map(|d| d.value.trim()).filter(|v| !v.is_empty()) {
        Some(target) => format!("{verb}: {target}"),
        None => verb.to_owned(),
    }
}
