//! HTML component wrapper module
//!
//! Renders a resolved component record as an HTML bootstrap page whose module
//! script loads the client-side runtime, resolves the content value, and
//! mounts the component. Every interpolated value is JSON-encoded before it
//! lands in the script block; nothing client-supplied is spliced in verbatim.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::Response;
use serde_json::Value;

use crate::http;
use crate::store::Record;

/// How a fetched content response is decoded client-side
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    Json,
    Text,
}

impl ContentKind {
    const fn fetch_method(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Text => "text",
        }
    }
}

/// Render the HTML wrapper around a resolved component record.
///
/// With `path_to_content` set, the script fetches the content asynchronously
/// and falls back to the login flow on failure; otherwise the inline content
/// value (or an empty object) is embedded directly.
pub fn wrap_component(
    component: Option<&Record>,
    path_to_content: Option<&str>,
    kind: ContentKind,
    inline_content: Option<&str>,
    last_modified: Option<&str>,
) -> Response<Full<Bytes>> {
    let Some(component) = component else {
        return http::build_404_response("Not found");
    };

    let module = js_string(&format!("/~{}", component.path().unwrap_or_default()));
    let get_content = match path_to_content {
        Some(target) => fetch_block(target, kind),
        None => {
            let value = match inline_content {
                // Content that parses as JSON is embedded as-is; anything
                // else is embedded as a string value.
                Some(raw) => serde_json::from_str::<Value>(raw)
                    .unwrap_or_else(|_| Value::String(raw.to_string())),
                None => Value::Object(serde_json::Map::new()),
            };
            format!("let content = {};", js_value(&value))
        }
    };

    let body = format!(
        r#"<!DOCTYPE html>
<html lang="en">
<script type="module">
    import Component from {module};
    import Main from '/~/abfab/main.svelte.js';
    {get_content}
    const component = new Main({{
        target: document.body,
        props: {{content, component: Component}},
    }});
    export default component;
</script>
</html>
"#
    );

    http::html_response(body, last_modified)
}

/// Script fragment that fetches the content path through the client API
fn fetch_block(path_to_content: &str, kind: ContentKind) -> String {
    let target = if path_to_content.starts_with('/') {
        format!("/~{path_to_content}")
    } else {
        path_to_content.to_string()
    };
    format!(
        r#"import {{API, redirectToLogin}} from '/~/abfab/core.js';
    let content;
    try {{
        let response = await API.fetch({target});
        content = await response.{method}();
    }} catch (e) {{
        redirectToLogin();
    }}"#,
        target = js_string(&target),
        method = kind.fetch_method(),
    )
}

/// JSON-encode a value for embedding inside a `<script>` block.
///
/// Neither `</` nor `<!--` may appear literally, or a crafted value could
/// terminate the script element early or open an escaped text span in it.
fn js_value(value: &Value) -> String {
    value
        .to_string()
        .replace("</", "<\\/")
        .replace("<!--", "<\\!--")
}

fn js_string(value: &str) -> String {
    js_value(&Value::String(value.to_string()))
}
