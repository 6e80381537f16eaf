//! Eligibility check for metrics parsing.

const HTTP_VERBS: [&str; 4] = ["GET", "POST", "PUT", "DELETE"];
/// Startup and setup traffic is not representative load.
const EXCLUDED_MARKERS: [&str; 2] = ["\"initializing\"", "/api/setup"];

/// Returns true when `message` looks like an access-log line worth parsing.
///
/// The verb may appear anywhere in the message, matching how colourised
/// lines are emitted.
#[must_use]
pub fn should_parse(message: &str) -> bool {
    HTTP_VERBS.iter().any(|verb| message.contains(verb))
        && !EXCLUDED_MARKERS
            .iter()
            .any(|marker| message.contains(marker))
}
