//! API error taxonomy

/// One field-level problem reported by response validation.
///
/// `alternatives` carries the nested issues produced when a response could
/// match several shapes and matched none; the classifier flattens them
/// before summarizing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldIssue {
    /// Dotted path of the offending field, or the operation name when the
    /// failure is not attributable to a single field.
    pub field: String,
    /// What was wrong with it.
    pub message: String,
    /// Nested issues for multi-shape mismatches.
    pub alternatives: Vec<FieldIssue>,
}

impl FieldIssue {
    /// Creates a leaf issue with no nested alternatives.
    #[must_use]
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            alternatives: Vec::new(),
        }
    }
}

/// Failures raised by the transport layer.
///
/// Validation and status classification are mutually exclusive outcomes for
/// a single request: a response is either rejected by the server (`Status`),
/// unreachable (`Network`), or reached us and failed to conform
/// (`Validation` / `Parse`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// The response body failed schema conformance.
    Validation {
        /// Field-level problems, possibly nested.
        issues: Vec<FieldIssue>,
    },
    /// The server answered with a non-success status.
    Status {
        /// HTTP status code.
        status: u16,
        /// Fixed label for the code, e.g. "Not Found".
        label: &'static str,
        /// Structured detail extracted from the error body, when present
        /// and textually distinct from the label.
        detail: Option<String>,
    },
    /// The request never produced a response (unreachable host, TLS
    /// failure, timeout).
    Network(String),
    /// The body was malformed beyond what the raw-text fallback accepts.
    Parse(String),
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation { issues } => {
                write!(f, "response validation failed ({} issue(s))", issues.len())
            }
            Self::Status {
                status,
                label,
                detail: Some(detail),
            } => write!(f, "request failed: {status} {label}: {detail}"),
            Self::Status {
                status,
                label,
                detail: None,
            } => write!(f, "request failed: {status} {label}"),
            Self::Network(message) => write!(f, "network error: {message}"),
            Self::Parse(message) => write!(f, "unexpected response body: {message}"),
        }
    }
}

impl std::error::Error for ApiError {}

/// Result type alias for transport operations.
pub type ApiResult<T> = Result<T, ApiError>;

/// Fixed status-to-text table used when the server gives no better detail.
#[must_use]
pub const fn status_label(status: u16) -> &'static str {
    match status {
        400 => "Bad Request",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not Found",
        409 => "Conflict",
        413 => "Payload Too Large",
        422 => "Unprocessable Entity",
        429 => "Too Many Requests",
        500 => "Internal Server Error",
        502 => "Bad Gateway",
        503 => "Service Unavailable",
        _ => "Unknown Error",
    }
}
