use actix_web::HttpResponse;
use actix_web::http::{StatusCode, header};
use thiserror::Error;
use uuid::Uuid;

use crate::http::{Envelope, PublicError};

pub type Res<T> = std::result::Result<T, AppError>;

/// Broad failure classes, each with a fixed HTTP rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed or rejected input.
    Validation,
    /// The caller is known but may not do this.
    Forbidden,
    /// The target row or remote object does not exist.
    NotFound,
    /// A call to the billing or identity provider failed.
    Upstream,
    Internal,
    /// Not a failure of the request itself: the caller has to be sent to
    /// the carried location to recover a session. Renders as a 302, never
    /// as a JSON error body.
    AuthRedirect(String),
}

/// Application error carrying everything the logs need and nothing the
/// client should not see. `kind` picks the status code, `cause` stays
/// server-side, `metadata` is sanitized on the way in and `trace_id` ties
/// the response body to the log line.
#[derive(Error, Debug)]
#[error("{message}")]
pub struct AppError {
    pub kind: ErrorKind,
    pub message: String,
    pub cause: Option<String>,
    pub metadata: Option<serde_json::Value>,
    pub tag: &'static str,
    pub trace_id: String,
}

impl AppError {
    fn new(kind: ErrorKind, message: impl Into<String>, tag: &'static str) -> Self {
        AppError {
            kind,
            message: message.into(),
            cause: None,
            metadata: None,
            tag,
            trace_id: Uuid::new_v4().to_string(),
        }
    }

    pub fn validation(message: impl Into<String>, tag: &'static str) -> Self {
        Self::new(ErrorKind::Validation, message, tag)
    }

    pub fn forbidden(message: impl Into<String>, tag: &'static str) -> Self {
        Self::new(ErrorKind::Forbidden, message, tag)
    }

    pub fn not_found(message: impl Into<String>, tag: &'static str) -> Self {
        Self::new(ErrorKind::NotFound, message, tag)
    }

    pub fn upstream(message: impl Into<String>, tag: &'static str) -> Self {
        Self::new(ErrorKind::Upstream, message, tag)
    }

    pub fn internal(message: impl Into<String>, tag: &'static str) -> Self {
        Self::new(ErrorKind::Internal, message, tag)
    }

    pub fn auth_redirect(to: impl Into<String>, tag: &'static str) -> Self {
        Self::new(ErrorKind::AuthRedirect(to.into()), "Authentication required", tag)
    }

    pub fn with_cause(mut self, cause: impl std::fmt::Display) -> Self {
        self.cause = Some(cause.to_string());
        self
    }

    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = Some(sanitize_metadata(metadata));
        self
    }

    /// Replaces the generated trace id with an external correlation id
    /// (webhook handlers pin errors to the provider event id).
    pub fn with_trace_id(mut self, trace_id: impl Into<String>) -> Self {
        self.trace_id = trace_id.into();
        self
    }

    pub fn status(&self) -> StatusCode {
        match &self.kind {
            ErrorKind::Validation => StatusCode::BAD_REQUEST,
            ErrorKind::Forbidden => StatusCode::FORBIDDEN,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Upstream | ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
            ErrorKind::AuthRedirect(_) => StatusCode::FOUND,
        }
    }

    pub fn to_http_response(&self) -> HttpResponse {
        if let ErrorKind::AuthRedirect(to) = &self.kind {
            log::debug!("[{}] redirecting to {} (trace {})", self.tag, to, self.trace_id);
            return HttpResponse::Found()
                .insert_header((header::LOCATION, to.as_str()))
                .finish();
        }

        log::error!(
            "[{}] {} (trace {}){}{}",
            self.tag,
            self.message,
            self.trace_id,
            self.cause
                .as_deref()
                .map(|cause| format!(", cause: {cause}"))
                .unwrap_or_default(),
            self.metadata
                .as_ref()
                .map(|metadata| format!(", metadata: {metadata}"))
                .unwrap_or_default(),
        );

        let body = Envelope::<serde_json::Value>::failure(PublicError {
            message: self.message.clone(),
            metadata: self.metadata.clone(),
            trace_id: self.trace_id.clone(),
        });

        HttpResponse::build(self.status()).json(body)
    }
}

impl actix_web::ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        self.status()
    }

    fn error_response(&self) -> HttpResponse {
        self.to_http_response()
    }
}

impl From<sqlx::Error> for AppError {
    fn from(error: sqlx::Error) -> Self {
        if matches!(error, sqlx::Error::RowNotFound) {
            AppError::not_found("Resource not found", "db").with_cause(error)
        } else {
            AppError::internal("Database error", "db").with_cause(error)
        }
    }
}

impl From<stripe::StripeError> for AppError {
    fn from(error: stripe::StripeError) -> Self {
        AppError::upstream("Billing provider request failed", "stripe").with_cause(error)
    }
}

impl From<reqwest::Error> for AppError {
    fn from(error: reqwest::Error) -> Self {
        AppError::upstream("Identity provider request failed", "auth").with_cause(error)
    }
}

/// Form payloads end up in validation metadata, so any key that looks like
/// a credential is blanked before the value is stored or logged.
fn sanitize_metadata(value: serde_json::Value) -> serde_json::Value {
    match value {
        serde_json::Value::Object(map) => serde_json::Value::Object(
            map.into_iter()
                .map(|(key, value)| {
                    if key.to_lowercase().contains("password") {
                        (key, serde_json::Value::String("[redacted]".to_string()))
                    } else {
                        (key, sanitize_metadata(value))
                    }
                })
                .collect(),
        ),
        serde_json::Value::Array(items) => {
            serde_json::Value::Array(items.into_iter().map(sanitize_metadata).collect())
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_follow_error_kind() {
        assert_eq!(
            AppError::validation("bad", "test").status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::forbidden("no", "test").status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AppError::not_found("gone", "test").status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::upstream("down", "test").status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            AppError::internal("boom", "test").status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            AppError::auth_redirect("/login", "test").status(),
            StatusCode::FOUND
        );
    }

    #[test]
    fn metadata_passwords_are_redacted() {
        let err = AppError::validation("Invalid payload", "test").with_metadata(serde_json::json!({
            "email": "jody@example.com",
            "password": "hunter2",
            "nested": { "confirmPassword": "hunter2" },
        }));

        let metadata = err.metadata.unwrap();
        assert_eq!(metadata["password"], "[redacted]");
        assert_eq!(metadata["nested"]["confirmPassword"], "[redacted]");
        assert_eq!(metadata["email"], "jody@example.com");
    }

    #[test]
    fn row_not_found_maps_to_not_found() {
        let err = AppError::from(sqlx::Error::RowNotFound);
        assert!(matches!(err.kind, ErrorKind::NotFound));
        assert!(err.cause.is_some());
    }

    #[test]
    fn trace_id_can_be_pinned_to_an_event() {
        let err = AppError::internal("boom", "webhook").with_trace_id("evt_123");
        assert_eq!(err.trace_id, "evt_123");
    }
}
