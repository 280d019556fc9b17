//! HTTP response building module
//!
//! Provides builders for the response shapes the record dispatcher produces,
//! decoupled from the dispatch logic itself.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Response, StatusCode};
use serde::Serialize;

/// Header carrying the store-wide last-modified value on wrapped components
pub const ETAG_TYPE_HEADER: &str = "ETag-Type";

/// Build a JSON response with the given status
pub fn json_response<T: Serialize>(status: StatusCode, body: &T) -> Response<Full<Bytes>> {
    let json = match serde_json::to_string(body) {
        Ok(j) => j,
        Err(e) => {
            log_build_error("JSON", &format!("serialization failed: {e}"));
            return Response::builder()
                .status(StatusCode::INTERNAL_SERVER_ERROR)
                .header("Content-Type", "application/json")
                .body(Full::new(Bytes::from(
                    r#"{"error":"Internal server error"}"#,
                )))
                .unwrap_or_else(|_| Response::new(Full::new(Bytes::from("Error"))));
        }
    };

    Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .body(Full::new(Bytes::from(json)))
        .unwrap_or_else(|e| {
            log_build_error("JSON", &e.to_string());
            Response::new(Full::new(Bytes::from("Error")))
        })
}

/// Build a plain-text response with the given status
pub fn text_response(status: StatusCode, body: &str) -> Response<Full<Bytes>> {
    Response::builder()
        .status(status)
        .header("Content-Type", "text/plain")
        .body(Full::new(Bytes::from(body.to_string())))
        .unwrap_or_else(|e| {
            log_build_error("text", &e.to_string());
            Response::new(Full::new(Bytes::from("Error")))
        })
}

/// Build a 200 response carrying raw record content
pub fn raw_response(content: String, content_type: &str) -> Response<Full<Bytes>> {
    let content_length = content.len();
    Response::builder()
        .status(200)
        .header("Content-Type", content_type)
        .header("Content-Length", content_length)
        .body(Full::new(Bytes::from(content)))
        .unwrap_or_else(|e| {
            log_build_error("raw", &e.to_string());
            Response::new(Full::new(Bytes::new()))
        })
}

/// Build an HTML response, optionally stamped with the last-modified value
pub fn html_response(content: String, last_modified: Option<&str>) -> Response<Full<Bytes>> {
    let mut builder = Response::builder()
        .status(200)
        .header("Content-Type", "text/html");
    if let Some(stamp) = last_modified {
        builder = builder.header(ETAG_TYPE_HEADER, stamp);
    }
    builder
        .body(Full::new(Bytes::from(content)))
        .unwrap_or_else(|e| {
            log_build_error("HTML", &e.to_string());
            Response::new(Full::new(Bytes::new()))
        })
}

/// Build an empty 200 response (successful DELETE)
pub fn empty_response() -> Response<Full<Bytes>> {
    Response::new(Full::new(Bytes::new()))
}

/// Build 404 Not Found plain-text response
pub fn build_404_response(message: &str) -> Response<Full<Bytes>> {
    text_response(StatusCode::NOT_FOUND, message)
}

/// Build 405 Method Not Allowed response
pub fn build_405_response() -> Response<Full<Bytes>> {
    Response::builder()
        .status(405)
        .header("Content-Type", "text/plain")
        .header("Allow", "GET, POST, DELETE, OPTIONS")
        .body(Full::new(Bytes::from("Method not allowed")))
        .unwrap_or_else(|e| {
            log_build_error("405", &e.to_string());
            Response::new(Full::new(Bytes::from("Method not allowed")))
        })
}

/// Build 413 Payload Too Large response
pub fn build_413_response() -> Response<Full<Bytes>> {
    text_response(StatusCode::PAYLOAD_TOO_LARGE, "413 Payload Too Large")
}

/// Build OPTIONS response (preflight request)
pub fn build_options_response(enable_cors: bool) -> Response<Full<Bytes>> {
    let mut builder = Response::builder()
        .status(204)
        .header("Allow", "GET, POST, DELETE, OPTIONS");

    if enable_cors {
        builder = builder
            .header("Access-Control-Allow-Origin", "*")
            .header("Access-Control-Allow-Methods", "GET, POST, DELETE, OPTIONS")
            .header("Access-Control-Allow-Headers", "Content-Type, Accept")
            .header("Access-Control-Max-Age", "86400");
    }

    builder.body(Full::new(Bytes::new())).unwrap_or_else(|e| {
        log_build_error("OPTIONS", &e.to_string());
        Response::new(Full::new(Bytes::new()))
    })
}

/// Build health check response
pub fn build_health_response(status: &str) -> Response<Full<Bytes>> {
    json_response(StatusCode::OK, &serde_json::json!({ "status": status }))
}

/// Log response build error
fn log_build_error(kind: &str, error: &str) {
    crate::logger::log_error(&format!("Failed to build {kind} response: {error}"));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_response() {
        let resp = json_response(StatusCode::OK, &serde_json::json!({"path": "/foo"}));
        assert_eq!(resp.status(), 200);
        assert_eq!(
            resp.headers().get("Content-Type").and_then(|v| v.to_str().ok()),
            Some("application/json")
        );
    }

    #[test]
    fn test_html_response_carries_etag_type() {
        let resp = html_response("<html></html>".to_string(), Some("2026-01-01T00:00:00"));
        assert_eq!(
            resp.headers()
                .get(ETAG_TYPE_HEADER)
                .and_then(|v| v.to_str().ok()),
            Some("2026-01-01T00:00:00")
        );

        let bare = html_response("<html></html>".to_string(), None);
        assert!(bare.headers().get(ETAG_TYPE_HEADER).is_none());
    }

    #[test]
    fn test_405_lists_allowed_methods() {
        let resp = build_405_response();
        assert_eq!(resp.status(), 405);
        let allow = resp.headers().get("Allow").and_then(|v| v.to_str().ok());
        assert_eq!(allow, Some("GET, POST, DELETE, OPTIONS"));
    }

    #[test]
    fn test_options_cors_headers() {
        let with_cors = build_options_response(true);
        assert!(with_cors.headers().get("Access-Control-Allow-Origin").is_some());

        let without = build_options_response(false);
        assert!(without.headers().get("Access-Control-Allow-Origin").is_none());
    }
}
