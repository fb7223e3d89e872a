use actix_web::{HttpResponse, Responder, http::header};
use serde::Serialize;

use crate::error::Res;

/// Response envelope shared by every JSON endpoint: exactly one of `data`
/// and `error` is non-null.
#[derive(Debug, Serialize)]
pub struct Envelope<T: Serialize> {
    pub data: Option<T>,
    pub error: Option<PublicError>,
}

/// Client-facing slice of an application error. The cause never leaves
/// the server; `trace_id` lets a support request be matched to a log line.
#[derive(Debug, Clone, Serialize)]
pub struct PublicError {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
    #[serde(rename = "traceId")]
    pub trace_id: String,
}

impl<T: Serialize> Envelope<T> {
    pub fn data(data: T) -> Self {
        Envelope {
            data: Some(data),
            error: None,
        }
    }

    pub fn failure(error: PublicError) -> Self {
        Envelope {
            data: None,
            error: Some(error),
        }
    }
}

pub struct Success;

impl Success {
    pub fn ok<T: Serialize>(body: T) -> Res<impl Responder> {
        Ok(HttpResponse::Ok().json(Envelope::data(body)))
    }

    pub fn created<T: Serialize>(body: T) -> Res<impl Responder> {
        Ok(HttpResponse::Created().json(Envelope::data(body)))
    }
}

/// 302 with a Location header. Browser clients follow it, fetch clients
/// read the status and header themselves.
pub fn redirect(location: &str) -> HttpResponse {
    HttpResponse::Found()
        .insert_header((header::LOCATION, location))
        .finish()
}

/// Open-redirect guard: only app-internal targets pass through, anything
/// else falls back to `default_redirect`.
pub fn safe_redirect(to: Option<&str>, default_redirect: &str) -> String {
    match to {
        Some(to) if to.starts_with('/') && !to.starts_with("//") => to.to_string(),
        _ => default_redirect.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn safe_redirect_keeps_internal_paths() {
        assert_eq!(safe_redirect(Some("/app/notes"), "/"), "/app/notes");
    }

    #[test]
    fn safe_redirect_rejects_external_targets() {
        assert_eq!(safe_redirect(Some("https://evil.example"), "/"), "/");
        assert_eq!(safe_redirect(Some("//evil.example"), "/"), "/");
        assert_eq!(safe_redirect(Some(""), "/"), "/");
        assert_eq!(safe_redirect(None, "/login"), "/login");
    }

    #[test]
    fn envelope_success_has_null_error() {
        let json = serde_json::to_value(Envelope::data(serde_json::json!({ "id": 1 }))).unwrap();
        assert_eq!(json["data"]["id"], 1);
        assert!(json["error"].is_null());
    }

    #[test]
    fn envelope_failure_skips_empty_metadata() {
        let envelope = Envelope::<serde_json::Value>::failure(PublicError {
            message: "nope".to_string(),
            metadata: None,
            trace_id: "t-1".to_string(),
        });

        let json = serde_json::to_value(envelope).unwrap();
        assert!(json["data"].is_null());
        assert_eq!(json["error"]["message"], "nope");
        assert_eq!(json["error"]["traceId"], "t-1");
        assert!(json["error"].get("metadata").is_none());
    }
}
