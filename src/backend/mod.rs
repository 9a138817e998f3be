//! Telemetry backend contract.
//!
//! # Responsibilities
//! - Define the operations the middleware consumes from a telemetry backend
//! - Define the request/response metadata attached to each transaction
//!
//! # Design Decisions
//! - Backends are trait objects so the layer is not generic over them
//! - Applications are shared across all requests and must be `Send + Sync`
//! - Transactions are handed out as `Arc` so handlers can annotate the same
//!   transaction the middleware finalizes

pub mod memory;
pub mod tracing_span;

use std::sync::Arc;

use axum::http::{Method, StatusCode};
use url::Url;

use crate::config::TransportKind;
use crate::error::ApmError;

pub use memory::InMemoryBackend;
pub use tracing_span::TracingBackend;

/// Shared handle to an in-flight transaction.
pub type TransactionHandle = Arc<dyn Transaction>;

/// Request metadata captured once when the transaction starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebRequest {
    pub url: Url,
    pub method: Method,
    pub transport: TransportKind,
    pub host: String,
}

/// Response metadata attached right before the transaction ends.
///
/// `status` is `None` when the downstream service failed without producing
/// a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WebResponse {
    pub status: Option<StatusCode>,
}

/// Factory for long-lived backend applications.
pub trait Backend {
    fn new_application(
        &self,
        app_name: &str,
        credential: &str,
        enabled: bool,
    ) -> Result<Arc<dyn Application>, ApmError>;
}

/// A backend client shared by every request.
pub trait Application: Send + Sync {
    fn start_transaction(&self, name: &str) -> TransactionHandle;
}

/// One instrumented request.
pub trait Transaction: Send + Sync {
    fn set_web_request(&self, request: WebRequest);

    fn set_web_response(&self, response: WebResponse);

    fn notice_error(&self, message: &str);

    fn add_attribute(&self, key: &str, value: &str);

    fn start_segment(&self, name: &str) -> Box<dyn Segment>;

    /// Finish the transaction. Called exactly once by the middleware.
    fn end(&self);

    /// Span the downstream handlers run in, if the backend reports through `tracing`.
    fn span(&self) -> Option<tracing::Span> {
        None
    }
}

/// A timed sub-interval of a transaction.
pub trait Segment: Send {
    fn end(self: Box<Self>);
}
