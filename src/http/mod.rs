//! HTTP protocol layer module
//!
//! Protocol-level building blocks shared by the record dispatcher and the
//! maintenance routes, decoupled from any business logic.

pub mod mime;
pub mod response;

// Re-export commonly used builders
pub use response::{
    build_404_response, build_405_response, build_413_response, build_health_response,
    build_options_response, empty_response, html_response, json_response, raw_response,
    text_response, ETAG_TYPE_HEADER,
};
