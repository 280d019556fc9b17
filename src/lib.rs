//! AbFab record server
//!
//! A small HTTP content server over a generic key/value "soup" record store.
//! Records are arbitrary JSON attribute sets addressed by URL path and are
//! served back as raw source, as JSON, or wrapped in an HTML bootstrap page
//! that loads a client-side component runtime.

pub mod config;
pub mod handler;
pub mod http;
pub mod logger;
pub mod server;
pub mod store;
