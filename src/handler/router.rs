//! Request routing dispatch module
//!
//! Entry point for HTTP request processing: access logging, body-size checks,
//! and routing between health endpoints, the reset entry point, and the
//! record dispatcher mount.

use std::collections::HashMap;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::{Body, Bytes};
use hyper::{Method, Request, Response, StatusCode};

use super::records::{self, RecordContext};
use crate::config::AppState;
use crate::http;
use crate::logger::{self, AccessLogEntry};

/// Main entry point for HTTP request handling
pub async fn handle_request(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
    peer_addr: SocketAddr,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let started = std::time::Instant::now();
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let query = req.uri().query().map(ToString::to_string);

    let access_log = state
        .cached_access_log
        .load(std::sync::atomic::Ordering::Relaxed);

    let response = route_request(req, &state).await;

    if access_log {
        let mut entry =
            AccessLogEntry::new(peer_addr.ip().to_string(), method.to_string(), path);
        entry.query = query;
        entry.status = response.status().as_u16();
        entry.body_bytes = response
            .body()
            .size_hint()
            .exact()
            .and_then(|n| usize::try_from(n).ok())
            .unwrap_or(0);
        entry.request_time_us =
            u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
        logger::log_access(&entry, &state.config.logging.format);
    }

    Ok(response)
}

/// Route a request based on path and configuration
async fn route_request<B>(req: Request<B>, state: &AppState) -> Response<Full<Bytes>>
where
    B: Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    // Preflight is answered here; the dispatcher only ever sees real verbs
    if method == Method::OPTIONS {
        return http::build_options_response(state.config.http.enable_cors);
    }

    if let Some(resp) = check_body_size(&req, state.config.http.max_body_size) {
        return resp;
    }

    let routes = &state.config.routes;

    if routes.health.enabled
        && (path == routes.health.liveness_path || path == routes.health.readiness_path)
    {
        return http::build_health_response("ok");
    }

    if path == routes.reset_path {
        if method == Method::POST {
            return handle_reset(state).await;
        }
        return http::build_405_response();
    }

    if let Some(rest) = strip_mount(&path, &routes.mount) {
        let accept = req
            .headers()
            .get(hyper::header::ACCEPT)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        let params = parse_query(req.uri().query().unwrap_or_default());
        let segments: Vec<String> = rest
            .split('/')
            .filter(|s| !s.is_empty())
            .map(ToString::to_string)
            .collect();

        let body = if method == Method::POST {
            // A declared Content-Length was already checked; the cap here
            // also catches chunked bodies that never advertise a length.
            let limit = usize::try_from(state.config.http.max_body_size).unwrap_or(usize::MAX);
            match Limited::new(req.into_body(), limit).collect().await {
                Ok(collected) => collected.to_bytes(),
                Err(e) if e.is::<LengthLimitError>() => {
                    logger::log_error(&format!(
                        "Request body exceeded {limit} bytes without a declared length"
                    ));
                    return http::build_413_response();
                }
                Err(e) => {
                    logger::log_warning(&format!("Failed to read request body: {e}"));
                    return http::json_response(
                        StatusCode::BAD_REQUEST,
                        &serde_json::json!({ "error": "failed to read request body" }),
                    );
                }
            }
        } else {
            Bytes::new()
        };

        let ctx = RecordContext {
            method,
            segments,
            accept,
            raw: params.contains_key("raw"),
            content: params.get("content").cloned(),
            body,
        };
        return records::dispatch(state, &ctx).await;
    }

    http::build_404_response("404 Not Found")
}

/// Maintenance entry point: clear all records and rebuild the catalog indexes
async fn handle_reset(state: &AppState) -> Response<Full<Bytes>> {
    let mut soup = state.soup.write().await;
    let cleared = soup.len();
    soup.clear();
    if let Err(e) = soup.flush() {
        logger::log_warning(&format!("Failed to persist cleared record store: {e}"));
    }
    logger::log_store_reset(cleared);
    http::json_response(
        StatusCode::OK,
        &serde_json::json!({ "status": "reset", "cleared": cleared }),
    )
}

/// Validate Content-Length header and return 413 if exceeded
fn check_body_size<B>(req: &Request<B>, max_body_size: u64) -> Option<Response<Full<Bytes>>> {
    let content_length = req.headers().get("content-length")?;
    let size_str = content_length.to_str().ok()?;
    match size_str.parse::<u64>() {
        Ok(size) if size > max_body_size => {
            logger::log_error(&format!(
                "Request body too large: {size} bytes (max: {max_body_size})"
            ));
            Some(http::build_413_response())
        }
        Ok(_) => None,
        Err(_) => {
            logger::log_warning(&format!(
                "Invalid Content-Length value: '{size_str}', skipping size check"
            ));
            None
        }
    }
}

/// Return the request path below the mount prefix, if it is under it
fn strip_mount<'a>(path: &'a str, mount: &str) -> Option<&'a str> {
    if path == mount {
        return Some("");
    }
    path.strip_prefix(mount).filter(|rest| rest.starts_with('/'))
}

/// Parse a query string into decoded key/value pairs.
///
/// Bare keys (like a lone `raw` marker) map to an empty value.
fn parse_query(query: &str) -> HashMap<String, String> {
    query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            (percent_decode(key), percent_decode(value))
        })
        .collect()
}

/// Decode %XX escapes and `+` in a query component
fn percent_decode(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'+' => {
                out.push(b' ');
                i += 1;
            }
            b'%' if i + 2 < bytes.len() => {
                if let (Some(hi), Some(lo)) = (hex_value(bytes[i + 1]), hex_value(bytes[i + 2])) {
                    out.push(hi << 4 | lo);
                    i += 3;
                } else {
                    out.push(b'%');
                    i += 1;
                }
            }
            byte => {
                out.push(byte);
                i += 1;
            }
        }
    }
    String::from_utf8_lossy(&out).into_owned()
}

fn hex_value(byte: u8) -> Option<u8> {
    (byte as char).to_digit(16).and_then(|v| u8::try_from(v).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::store::Record;
    use serde_json::{json, Value};

    fn test_state() -> AppState {
        let config = Config::load_from("test-config-that-does-not-exist").expect("defaults");
        AppState::new(config)
    }

    fn request(method: Method, uri: &str) -> Request<Full<Bytes>> {
        Request::builder()
            .method(method)
            .uri(uri)
            .body(Full::new(Bytes::new()))
            .expect("request")
    }

    async fn body_json(resp: Response<Full<Bytes>>) -> Value {
        let bytes = resp.into_body().collect().await.expect("body").to_bytes();
        serde_json::from_slice(&bytes).expect("json body")
    }

    #[tokio::test]
    async fn test_reset_clears_store_and_acknowledges() {
        let state = test_state();
        state
            .soup
            .write()
            .await
            .upsert(Record::with_path("/foo"))
            .expect("upsert");

        let resp = route_request(request(Method::POST, "/abfab-reset"), &state).await;
        assert_eq!(resp.status(), 200);
        assert_eq!(
            body_json(resp).await,
            json!({"status": "reset", "cleared": 1})
        );
        assert!(state.soup.read().await.is_empty());
    }

    #[tokio::test]
    async fn test_reset_rejects_non_post() {
        let state = test_state();
        state
            .soup
            .write()
            .await
            .upsert(Record::with_path("/foo"))
            .expect("upsert");

        let resp = route_request(request(Method::GET, "/abfab-reset"), &state).await;
        assert_eq!(resp.status(), 405);
        assert_eq!(state.soup.read().await.len(), 1);
    }

    #[tokio::test]
    async fn test_health_endpoints() {
        let state = test_state();
        for path in ["/healthz", "/readyz"] {
            let resp = route_request(request(Method::GET, path), &state).await;
            assert_eq!(resp.status(), 200);
            assert_eq!(body_json(resp).await, json!({"status": "ok"}));
        }
    }

    #[tokio::test]
    async fn test_declared_oversized_body_is_413() {
        let state = test_state();
        let req = Request::builder()
            .method(Method::POST)
            .uri("/abfab")
            .header("content-length", "99999999999")
            .body(Full::new(Bytes::new()))
            .expect("request");

        let resp = route_request(req, &state).await;
        assert_eq!(resp.status(), 413);
    }

    #[tokio::test]
    async fn test_undeclared_oversized_body_is_413() {
        let mut config = Config::load_from("test-config-that-does-not-exist").expect("defaults");
        config.http.max_body_size = 8;
        let state = AppState::new(config);

        let req = Request::builder()
            .method(Method::POST)
            .uri("/abfab")
            .body(Full::new(Bytes::from_static(
                br#"{"id": "foo", "file": "far too long for the cap"}"#,
            )))
            .expect("request");

        let resp = route_request(req, &state).await;
        assert_eq!(resp.status(), 413);
        assert!(state.soup.read().await.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_path_is_404() {
        let state = test_state();
        let resp = route_request(request(Method::GET, "/elsewhere"), &state).await;
        assert_eq!(resp.status(), 404);
    }

    #[test]
    fn test_strip_mount() {
        assert_eq!(strip_mount("/abfab", "/abfab"), Some(""));
        assert_eq!(strip_mount("/abfab/foo", "/abfab"), Some("/foo"));
        assert_eq!(strip_mount("/abfab/a/b", "/abfab"), Some("/a/b"));
        assert_eq!(strip_mount("/abfabulous", "/abfab"), None);
        assert_eq!(strip_mount("/other", "/abfab"), None);
    }

    #[test]
    fn test_parse_query() {
        let params = parse_query("raw&content=%7B%22a%22%3A1%7D&x=1+2");
        assert_eq!(params.get("raw").map(String::as_str), Some(""));
        assert_eq!(params.get("content").map(String::as_str), Some(r#"{"a":1}"#));
        assert_eq!(params.get("x").map(String::as_str), Some("1 2"));
        assert!(parse_query("").is_empty());
    }

    #[test]
    fn test_percent_decode_handles_malformed_escapes() {
        assert_eq!(percent_decode("100%"), "100%");
        assert_eq!(percent_decode("a%zzb"), "a%zzb");
        assert_eq!(percent_decode("%41"), "A");
    }
}
