//! Error normalizer
//!
//! Turns pipeline failures into exactly one message. Local contract
//! violations and HTTP 422 details are formatted as bullet lists; every
//! other failure passes through unchanged.

use spatialbias_common::validation::{render_path, PathSegment, ValidationError};
use spatialbias_domain::{LocSegment, RemoteIssue};

use crate::errors::{AnalysisError, PipelineFailure};
use crate::ports::TransportError;

const CLIENT_HEADER: &str = "Client-side validation failed:";
const REMOTE_HEADER: &str = "Request validation failed:";
const EMPTY_REMOTE: &str = "Invalid request.";
const FIELD_REQUIRED: &str = "Field required";

/// Leading `loc` segment FastAPI adds for body fields
const BODY_SEGMENT: &str = "body";

/// Convert a pipeline failure into the caller-facing error
#[must_use]
pub fn normalize(failure: PipelineFailure) -> AnalysisError {
    match failure {
        PipelineFailure::Input(message) => AnalysisError::Input(message),
        PipelineFailure::Schema(err) => AnalysisError::Invalid(format_client_error(&err)),
        PipelineFailure::Transport(TransportError::RemoteValidation(issues)) => {
            AnalysisError::Invalid(format_remote_issues(&issues))
        }
        PipelineFailure::Transport(other) => AnalysisError::Transport(other),
    }
}

/// `Client-side validation failed:` followed by one `- path: message` line
/// per violation
#[must_use]
pub fn format_client_error(err: &ValidationError) -> String {
    let lines = err.errors.iter().map(|e| {
        let message = if e.is_missing() { FIELD_REQUIRED } else { e.message.as_str() };
        format!("{}: {}", e.field, message)
    });
    bullet_list(CLIENT_HEADER, lines)
}

/// `Request validation failed:` followed by one `- path: msg` line per
/// remote issue, or `Invalid request.` when there are none
#[must_use]
pub fn format_remote_issues(issues: &[RemoteIssue]) -> String {
    if issues.is_empty() {
        return EMPTY_REMOTE.to_string();
    }
    let lines = issues.iter().map(|issue| format!("{}: {}", remote_path(&issue.loc), issue.msg));
    bullet_list(REMOTE_HEADER, lines)
}

fn remote_path(loc: &[LocSegment]) -> String {
    let loc = match loc.first() {
        Some(LocSegment::Key(first)) if first == BODY_SEGMENT => &loc[1..],
        _ => loc,
    };
    let segments: Vec<PathSegment> = loc
        .iter()
        .map(|segment| match segment {
            LocSegment::Index(i) => {
                usize::try_from(*i).map_or_else(|_| PathSegment::Key(i.to_string()), PathSegment::Index)
            }
            LocSegment::Key(key) => PathSegment::Key(key.clone()),
        })
        .collect();
    render_path(&segments)
}

fn bullet_list(header: &str, lines: impl Iterator<Item = String>) -> String {
    let mut out = header.to_string();
    for line in lines {
        out.push_str("\n- ");
        out.push_str(&line);
    }
    out
}
