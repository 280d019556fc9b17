//! Record dispatcher module
//!
//! The request-handling core: maps HTTP verbs onto record store operations
//! and formats records as raw content, JSON, or an HTML component wrapper.

use chrono::Local;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Method, Response, StatusCode};
use serde_json::{json, Map, Value};

use super::wrap::{self, ContentKind};
use crate::config::AppState;
use crate::http::{self, mime};
use crate::logger;
use crate::store::{Record, PATH_ATTR};

/// Component-source suffix that redirects to the compiled artifact
const COMPONENT_SUFFIX: &str = ".svelte";

/// Suffix of the compiled artifact stored next to a component source
const COMPILED_SUFFIX: &str = ".js";

/// Everything the dispatcher needs from one request.
///
/// `segments` are the URI path segments below the mount prefix; the body is
/// only populated for writes.
pub struct RecordContext {
    pub method: Method,
    pub segments: Vec<String>,
    /// Accept header value, empty when absent
    pub accept: String,
    /// True when the request carries a `raw` query marker
    pub raw: bool,
    /// Inline content value from the `content` query parameter
    pub content: Option<String>,
    pub body: Bytes,
}

/// Select a handler by HTTP method and run it.
///
/// An explicit verb table: anything unlisted is 405.
pub async fn dispatch(state: &AppState, ctx: &RecordContext) -> Response<Full<Bytes>> {
    match ctx.method {
        Method::GET => handle_get(state, ctx).await,
        Method::POST => handle_post(state, ctx).await,
        Method::DELETE => handle_delete(state, ctx).await,
        _ => http::build_405_response(),
    }
}

/// Compute the effective record path from the request segments.
///
/// A trailing segment equal to the HTTP method name is an artifact of how
/// some clients build these URLs and is stripped.
pub fn effective_path(segments: &[String], method: &Method) -> String {
    let mut segments = segments;
    if segments
        .last()
        .is_some_and(|last| last.as_str() == method.as_str())
    {
        segments = &segments[..segments.len() - 1];
    }
    format!("/{}", segments.join("/"))
}

/// Target path for a write: the request segments plus the submitted id
fn record_path(segments: &[String], id: &str) -> String {
    let mut parts: Vec<&str> = segments.iter().map(String::as_str).collect();
    parts.push(id);
    format!("/{}", parts.join("/"))
}

async fn handle_get(state: &AppState, ctx: &RecordContext) -> Response<Full<Bytes>> {
    let path = effective_path(&ctx.segments, &ctx.method);
    let soup = state.soup.read().await;

    // Component sources resolve to their compiled artifact unless the
    // request explicitly asks for the raw source.
    if path.ends_with(COMPONENT_SUFFIX) && !ctx.raw {
        let compiled = format!("{path}{COMPILED_SUFFIX}");
        let component = soup.find(&compiled);
        if ctx.accept.contains("text/html") {
            let last_modified = soup.last_modified();
            return wrap::wrap_component(
                component.as_ref(),
                None,
                ContentKind::Json,
                ctx.content.as_deref(),
                last_modified.as_deref(),
            );
        }
        return view_source(component.as_ref(), None);
    }

    match soup.find(&path) {
        Some(record) if ctx.accept.contains("application/json") => view_json(Some(&record)),
        Some(record) => view_source(Some(&record), None),
        None if ctx.accept.contains("application/json") => view_json(None),
        None => http::build_404_response("Record not found"),
    }
}

async fn handle_post(state: &AppState, ctx: &RecordContext) -> Response<Full<Bytes>> {
    let mut data: Map<String, Value> = match serde_json::from_slice(&ctx.body) {
        Ok(data) => data,
        Err(e) => {
            return http::json_response(
                StatusCode::BAD_REQUEST,
                &json!({ "error": format!("invalid JSON body: {e}") }),
            );
        }
    };

    let id = match data
        .get("id")
        .and_then(Value::as_str)
        .filter(|id| !id.is_empty())
    {
        Some(id) => id.to_string(),
        None => {
            return http::json_response(
                StatusCode::BAD_REQUEST,
                &json!({ "error": "id is missing" }),
            );
        }
    };

    // The id addresses the record; it is not part of its attributes.
    data.remove("id");
    let path = record_path(&ctx.segments, &id);

    let mut soup = state.soup.write().await;
    let mut record = soup.find(&path).unwrap_or_default();
    record.merge(&data);
    record.set(PATH_ATTR, Value::String(path.clone()));

    if let Err(e) = soup.upsert(record) {
        logger::log_error(&format!("Failed to store record at {path}: {e}"));
        return http::json_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            &json!({ "error": "store failure" }),
        );
    }
    soup.touch(Local::now().to_rfc3339());
    if let Err(e) = soup.flush() {
        logger::log_warning(&format!("Failed to persist record store: {e}"));
    }

    http::json_response(StatusCode::OK, &json!({ "path": path }))
}

async fn handle_delete(state: &AppState, ctx: &RecordContext) -> Response<Full<Bytes>> {
    let path = effective_path(&ctx.segments, &ctx.method);
    let mut soup = state.soup.write().await;
    if soup.delete(&path) > 0 {
        if let Err(e) = soup.flush() {
            logger::log_warning(&format!("Failed to persist record store: {e}"));
        }
    }
    http::empty_response()
}

/// Render a record's raw `file` content.
///
/// The content type is either given explicitly or guessed from the record's
/// path extension.
pub fn view_source(record: Option<&Record>, content_type: Option<&str>) -> Response<Full<Bytes>> {
    let Some(record) = record else {
        return http::build_404_response("Not found");
    };
    let guessed;
    let content_type = match content_type {
        Some(explicit) => explicit,
        None => {
            guessed = mime::guess_from_path(record.path().unwrap_or_default());
            guessed
        }
    };
    http::raw_response(record.file().unwrap_or_default().to_string(), content_type)
}

/// Render a record's attributes as a JSON object
pub fn view_json(record: Option<&Record>) -> Response<Full<Bytes>> {
    match record {
        Some(record) => http::json_response(StatusCode::OK, record.attrs()),
        None => http::json_response(StatusCode::NOT_FOUND, &json!({ "error": "Not found" })),
    }
}
