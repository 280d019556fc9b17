//! MIME type guessing module
//!
//! Guesses a Content-Type from a record path's file extension.

use std::path::Path;

/// Get MIME Content-Type based on file extension
///
/// # Examples
/// ```
/// use abfab_server::http::mime::get_content_type;
/// assert_eq!(get_content_type(Some("html")), "text/html; charset=utf-8");
/// assert_eq!(get_content_type(Some("js")), "application/javascript");
/// assert_eq!(get_content_type(None), "application/octet-stream");
/// ```
pub fn get_content_type(extension: Option<&str>) -> &'static str {
    match extension {
        // Text
        Some("html" | "htm") => "text/html; charset=utf-8",
        Some("css") => "text/css",
        Some("txt" | "md") => "text/plain; charset=utf-8",
        Some("xml") => "application/xml",

        // JavaScript/WASM
        Some("js" | "mjs") => "application/javascript",
        Some("json") => "application/json",
        Some("wasm") => "application/wasm",

        // Component sources are plain text to anything that is not the
        // client-side compiler
        Some("svelte") => "text/plain; charset=utf-8",

        // Images
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("svg") => "image/svg+xml",
        Some("ico") => "image/x-icon",
        Some("webp") => "image/webp",

        // Fonts
        Some("woff") => "font/woff",
        Some("woff2") => "font/woff2",
        Some("ttf") => "font/ttf",
        Some("otf") => "font/otf",

        // Default
        _ => "application/octet-stream",
    }
}

/// Guess a Content-Type from a full record path
pub fn guess_from_path(path: &str) -> &'static str {
    get_content_type(Path::new(path).extension().and_then(|e| e.to_str()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_common_types() {
        assert_eq!(get_content_type(Some("html")), "text/html; charset=utf-8");
        assert_eq!(get_content_type(Some("css")), "text/css");
        assert_eq!(get_content_type(Some("js")), "application/javascript");
        assert_eq!(get_content_type(Some("json")), "application/json");
        assert_eq!(get_content_type(Some("png")), "image/png");
    }

    #[test]
    fn test_unknown_extension() {
        assert_eq!(get_content_type(Some("xyz")), "application/octet-stream");
        assert_eq!(get_content_type(None), "application/octet-stream");
    }

    #[test]
    fn test_guess_from_path() {
        assert_eq!(guess_from_path("/abfab/demo/index.html"), "text/html; charset=utf-8");
        assert_eq!(guess_from_path("/demo/app.svelte.js"), "application/javascript");
        assert_eq!(guess_from_path("/demo/app.svelte"), "text/plain; charset=utf-8");
        assert_eq!(guess_from_path("/no-extension"), "application/octet-stream");
    }
}
