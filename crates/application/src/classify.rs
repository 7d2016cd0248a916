//! Error classifier
//!
//! Maps a transport failure into the `(header, message)` pair shown to the
//! user. The backend emits no structured error codes, so transport failures
//! are matched by substring against the rendered error text; keeping the
//! table behind this function lets it be unit-tested without a network.

use tally_domain::{ApiError, FieldIssue, Notification};

/// Backend phrase emitted when profile deletion is rejected.
const DELETION_BLOCKED_PHRASE: &str = "Cannot delete user profile with undelivered parcels";

/// How many field issues a validation notification shows at most.
const MAX_SUMMARY_LINES: usize = 3;

/// Renders a failure into the notification shown to the user.
#[must_use]
pub fn classify(error: &ApiError) -> Notification {
    match error {
        ApiError::Validation { issues } => summarize_issues(issues),
        other => classify_text(&other.to_string()),
    }
}

/// Ordered substring table for non-validation failures.
fn classify_text(message: &str) -> Notification {
    if (message.contains("409") || message.contains("500"))
        && message.contains(DELETION_BLOCKED_PHRASE)
    {
        return Notification::new(
            "Account Deletion Blocked",
            "Your profile still has undelivered parcels and cannot be deleted yet.",
        );
    }
    if message.contains("401") {
        return Notification::new(
            "Session Expired",
            "Your session has expired. Please sign in again.",
        );
    }
    if message.contains("403") {
        return Notification::new("Access Denied", "You do not have permission to do that.");
    }
    if message.contains("404") {
        return Notification::new("Not Found", "The requested resource could not be found.");
    }
    if message.contains("409") {
        return Notification::new(
            "Conflict",
            "The change conflicts with the current state. Refresh and try again.",
        );
    }
    if message.contains("500") {
        return Notification::new(
            "Server Error",
            "Something went wrong on our side. Please try again later.",
        );
    }
    if message.contains("network error") {
        return Notification::new(
            "Connection Problem",
            "Could not reach the server. Check your connection and try again.",
        );
    }
    Notification::new("Error", message)
}

/// Summarizes validation issues: flatten nested alternatives, de-duplicate
/// by `message:field`, keep the first three.
fn summarize_issues(issues: &[FieldIssue]) -> Notification {
    let mut flat = Vec::new();
    flatten(issues, &mut flat);

    let mut seen = Vec::new();
    let mut lines = Vec::new();
    for issue in flat {
        let key = format!("{}:{}", issue.message, issue.field);
        if seen.contains(&key) {
            continue;
        }
        seen.push(key);
        lines.push(format!("{}: {}", issue.field, issue.message));
        if lines.len() == MAX_SUMMARY_LINES {
            break;
        }
    }

    Notification::new("Validation Failed", lines.join("\n"))
}

fn flatten<'a>(issues: &'a [FieldIssue], out: &mut Vec<&'a FieldIssue>) {
    for issue in issues {
        if issue.alternatives.is_empty() {
            out.push(issue);
        } else {
            flatten(&issue.alternatives, out);
        }
    }
}
