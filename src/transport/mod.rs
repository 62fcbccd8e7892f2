//! Remote-task boundary adapters.
//!
//! The orchestrator only requires that a remote task surface failures with
//! a numeric status and a human-readable message (`Error::Remote`);
//! [`HttpTask`] is the bundled adapter that satisfies that contract for
//! JSON-over-HTTP providers.

mod http;

pub use http::HttpTask;
