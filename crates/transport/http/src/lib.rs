//! HTTP implementation of the Behave [`Transport`](behave_transport::Transport).
//!
//! [`HttpTransport`] sends resolved requests to the configured API root with
//! the API token header and JSON content type, and decodes the JSON body.

pub mod client;

pub use client::{DEFAULT_API_ROOT, HttpTransport, TOKEN_HEADER};
