// src/error.rs

use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

use crate::validation::FieldError;

// --- Error Taxonomy ---

#[derive(Error, Debug)]
pub enum HrError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Authentication failed: {message}")]
    Auth { message: String },

    #[error("Validation failed: {message}")]
    Validation {
        message: String,
        fields: Vec<FieldError>,
    },

    #[error("Not authorized: {message}")]
    Authorization { message: String },

    // Client-side role check, raised before any request is sent
    #[error("Your role ({role}) may not {action}")]
    Forbidden { role: String, action: String },

    #[error("Not found: {message}")]
    NotFound { message: String },

    #[error("Rate limit exceeded (Status 429)")]
    RateLimited,

    #[error("HR API error: Status={status}, Message='{message}'")]
    Api { status: StatusCode, message: String },

    #[error("JSON processing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("File I/O error: {context}")]
    Io {
        #[source]
        source: std::io::Error,
        context: String,
    },

    #[error("URL parsing error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Not logged in. Run `hrportal login` first")]
    NotAuthenticated,

    // The claim exists on the backend; only the attachment is missing
    #[error(
        "Expense request {request_id} was created but its receipt upload failed ({source}). \
         Retry with `hrportal expense upload-receipt {request_id} <file>`"
    )]
    ReceiptUpload {
        request_id: String,
        #[source]
        source: Box<HrError>,
    },
}

/// Coarse classification used when deciding how to present a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Network,
    Auth,
    Validation,
    Authorization,
    Other,
}

// Helper to create context-aware IO errors
pub(crate) fn io_context<E: Into<std::io::Error>, S: Into<String>>(source: E, context: S) -> HrError {
    HrError::Io {
        source: source.into(),
        context: context.into(),
    }
}

impl HrError {
    pub fn validation(fields: Vec<FieldError>) -> Self {
        let message = fields
            .iter()
            .map(|f| f.to_string())
            .collect::<Vec<_>>()
            .join("; ");
        HrError::Validation { message, fields }
    }

    /// Maps a non-success HTTP status plus the extracted backend message onto the taxonomy.
    pub fn from_status(status: StatusCode, message: String) -> Self {
        match status {
            StatusCode::UNAUTHORIZED => HrError::Auth { message },
            StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => HrError::Validation {
                message,
                fields: Vec::new(),
            },
            StatusCode::FORBIDDEN => HrError::Authorization { message },
            StatusCode::NOT_FOUND => HrError::NotFound { message },
            StatusCode::TOO_MANY_REQUESTS => HrError::RateLimited,
            _ => HrError::Api { status, message },
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            HrError::Network(_) => ErrorKind::Network,
            HrError::Auth { .. } | HrError::NotAuthenticated => ErrorKind::Auth,
            HrError::Validation { .. } => ErrorKind::Validation,
            HrError::ReceiptUpload { source, .. } => source.kind(),
            HrError::Authorization { .. } | HrError::Forbidden { .. } => ErrorKind::Authorization,
            _ => ErrorKind::Other,
        }
    }

    /// The message shown to the user: the backend's own wording when there is one,
    /// otherwise `fallback`.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            HrError::Auth { message }
            | HrError::Validation { message, .. }
            | HrError::Authorization { message }
            | HrError::NotFound { message }
            | HrError::Api { message, .. }
                if !message.trim().is_empty() =>
            {
                message.clone()
            }
            HrError::Forbidden { .. }
            | HrError::NotAuthenticated
            | HrError::ReceiptUpload { .. } => self.to_string(),
            _ => fallback.to_string(),
        }
    }
}

// --- Backend error body parsing ---

#[derive(Debug, Deserialize)]
struct ErrorPayload {
    detail: Option<ErrorDetail>,
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ErrorDetail {
    Text(String),
    Items(Vec<ErrorDetailItem>),
}

#[derive(Debug, Deserialize)]
struct ErrorDetailItem {
    msg: Option<String>,
    loc: Option<Vec<serde_json::Value>>,
}

/// Pulls a human-readable message out of an error response body.
///
/// Understands `{"detail": "..."}`, list-style details (`[{"loc": [..], "msg": ".."}]`) and
/// `{"message": "..."}`. Anything else is returned as-is.
pub fn extract_error_message(body: &str) -> String {
    let Ok(payload) = serde_json::from_str::<ErrorPayload>(body) else {
        return body.trim().to_string();
    };

    match payload.detail {
        Some(ErrorDetail::Text(text)) => text,
        Some(ErrorDetail::Items(items)) => items
            .iter()
            .filter_map(|item| {
                let msg = item.msg.as_deref()?;
                let field = item
                    .loc
                    .as_ref()
                    .and_then(|loc| loc.last())
                    .and_then(|v| v.as_str());
                Some(match field {
                    Some(field) => format!("{}: {}", field, msg),
                    None => msg.to_string(),
                })
            })
            .collect::<Vec<_>>()
            .join("; "),
        None => payload.message.unwrap_or_else(|| body.trim().to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detail_string_is_extracted() {
        let body = r#"{"detail":"Incorrect email or password"}"#;
        assert_eq!(extract_error_message(body), "Incorrect email or password");
    }

    #[test]
    fn detail_list_is_joined_with_field_names() {
        let body = r#"{"detail":[{"loc":["body","email"],"msg":"value is not a valid email address","type":"value_error"},{"loc":["body","password"],"msg":"field required"}]}"#;
        assert_eq!(
            extract_error_message(body),
            "email: value is not a valid email address; password: field required"
        );
    }

    #[test]
    fn non_json_body_is_passed_through() {
        assert_eq!(extract_error_message("  Bad Gateway \n"), "Bad Gateway");
    }

    #[test]
    fn status_mapping_follows_taxonomy() {
        let m = || "x".to_string();
        assert_eq!(HrError::from_status(StatusCode::UNAUTHORIZED, m()).kind(), ErrorKind::Auth);
        assert_eq!(HrError::from_status(StatusCode::BAD_REQUEST, m()).kind(), ErrorKind::Validation);
        assert_eq!(
            HrError::from_status(StatusCode::UNPROCESSABLE_ENTITY, m()).kind(),
            ErrorKind::Validation
        );
        assert_eq!(
            HrError::from_status(StatusCode::FORBIDDEN, m()).kind(),
            ErrorKind::Authorization
        );
        assert!(matches!(
            HrError::from_status(StatusCode::TOO_MANY_REQUESTS, m()),
            HrError::RateLimited
        ));
        assert!(matches!(
            HrError::from_status(StatusCode::INTERNAL_SERVER_ERROR, m()),
            HrError::Api { .. }
        ));
    }

    #[test]
    fn user_message_prefers_backend_text() {
        let err = HrError::Auth {
            message: "Incorrect email or password".into(),
        };
        assert_eq!(err.user_message("Login failed"), "Incorrect email or password");

        let empty = HrError::Auth { message: "  ".into() };
        assert_eq!(empty.user_message("Login failed"), "Login failed");

        assert_eq!(HrError::RateLimited.user_message("Login failed"), "Login failed");
    }
}
