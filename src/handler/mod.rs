//! Request handler module
//!
//! Routing and the record dispatcher: the business logic between the HTTP
//! server loop and the record store.

pub mod records;
pub mod router;
pub mod wrap;

// Re-export main entry point
pub use router::handle_request;
