//! Backend that reports transactions through `tracing`.
//!
//! Each transaction is an `apm.transaction` span and each segment an
//! `apm.segment` child span, so any subscriber (fmt, JSON, OpenTelemetry
//! bridge) receives the request telemetry. Durations also feed the metrics
//! in `observability::metrics`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

use tracing::{field, Span};
use uuid::Uuid;

use crate::backend::{
    Application, Backend, Segment, Transaction, TransactionHandle, WebRequest, WebResponse,
};
use crate::error::ApmError;
use crate::observability::metrics;

#[derive(Debug, Clone, Copy, Default)]
pub struct TracingBackend;

impl Backend for TracingBackend {
    fn new_application(
        &self,
        app_name: &str,
        _credential: &str,
        enabled: bool,
    ) -> Result<Arc<dyn Application>, ApmError> {
        tracing::info!(app = %app_name, enabled, "APM application created");

        Ok(Arc::new(TracingApplication {
            app_name: Arc::from(app_name),
            enabled,
        }))
    }
}

struct TracingApplication {
    app_name: Arc<str>,
    enabled: bool,
}

impl Application for TracingApplication {
    fn start_transaction(&self, name: &str) -> TransactionHandle {
        if !self.enabled {
            return Arc::new(InertTransaction);
        }

        let id = Uuid::new_v4();
        let span = tracing::info_span!(
            "apm.transaction",
            app = %self.app_name,
            txn_id = %id,
            name = %name,
            method = field::Empty,
            url = field::Empty,
            host = field::Empty,
            transport = field::Empty,
            status = field::Empty,
        );

        Arc::new(TracingTransaction {
            app_name: self.app_name.clone(),
            span,
            started: Instant::now(),
            status: Mutex::new(None),
            ended: AtomicBool::new(false),
        })
    }
}

struct TracingTransaction {
    app_name: Arc<str>,
    span: Span,
    started: Instant,
    status: Mutex<Option<u16>>,
    ended: AtomicBool,
}

impl Transaction for TracingTransaction {
    fn set_web_request(&self, request: WebRequest) {
        self.span.record("method", field::display(&request.method));
        self.span.record("url", field::display(&request.url));
        self.span.record("host", request.host.as_str());
        self.span.record("transport", request.transport.as_str());
    }

    fn set_web_response(&self, response: WebResponse) {
        let status = response.status.map(|s| s.as_u16());
        if let Some(code) = status {
            self.span.record("status", code);
        }
        *self.status.lock().unwrap_or_else(PoisonError::into_inner) = status;
    }

    fn notice_error(&self, message: &str) {
        tracing::warn!(parent: &self.span, error = %message, "Transaction error noticed");
        metrics::record_error(&self.app_name);
    }

    fn add_attribute(&self, key: &str, value: &str) {
        tracing::debug!(parent: &self.span, key = %key, value = %value, "Attribute added");
    }

    fn start_segment(&self, name: &str) -> Box<dyn Segment> {
        let span = tracing::debug_span!(parent: &self.span, "apm.segment", name = %name);
        Box::new(TracingSegment {
            name: name.to_string(),
            span,
            started: Instant::now(),
        })
    }

    fn span(&self) -> Option<Span> {
        Some(self.span.clone())
    }

    fn end(&self) {
        if self.ended.swap(true, Ordering::AcqRel) {
            return;
        }

        let elapsed = self.started.elapsed();
        let status = *self.status.lock().unwrap_or_else(PoisonError::into_inner);
        metrics::record_transaction(&self.app_name, status, elapsed);
        tracing::info!(
            parent: &self.span,
            elapsed_ms = elapsed.as_millis() as u64,
            status = ?status,
            "Transaction finished"
        );
    }
}

struct TracingSegment {
    name: String,
    span: Span,
    started: Instant,
}

impl Segment for TracingSegment {
    fn end(self: Box<Self>) {
        let elapsed = self.started.elapsed();
        metrics::record_segment(&self.name, elapsed);
        tracing::debug!(
            parent: &self.span,
            elapsed_us = elapsed.as_micros() as u64,
            "Segment finished"
        );
    }
}

/// Transaction handed out when the application is configured as disabled.
struct InertTransaction;

impl Transaction for InertTransaction {
    fn set_web_request(&self, _request: WebRequest) {}

    fn set_web_response(&self, _response: WebResponse) {}

    fn notice_error(&self, _message: &str) {}

    fn add_attribute(&self, _key: &str, _value: &str) {}

    fn start_segment(&self, _name: &str) -> Box<dyn Segment> {
        Box::new(InertSegment)
    }

    fn end(&self) {}
}

struct InertSegment;

impl Segment for InertSegment {
    fn end(self: Box<Self>) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{Method, StatusCode};

    #[test]
    fn test_accepts_any_credential() {
        assert!(TracingBackend.new_application("svc", "ab c", true).is_ok());
    }

    #[test]
    fn test_span_only_for_enabled_transactions() {
        let enabled = TracingBackend.new_application("svc", "abc", true).unwrap();
        assert!(enabled.start_transaction("GET /").span().is_some());

        let disabled = TracingBackend.new_application("svc", "abc", false).unwrap();
        assert!(disabled.start_transaction("GET /").span().is_none());
    }

    #[test]
    fn test_transaction_without_subscriber() {
        let app = TracingBackend.new_application("svc", "abc", true).unwrap();
        let txn = app.start_transaction("GET /health");
        txn.set_web_request(WebRequest {
            url: "https://example.com/health".parse().unwrap(),
            method: Method::GET,
            transport: crate::config::TransportKind::Https,
            host: "example.com".into(),
        });
        txn.add_attribute("labels.k", "v");
        txn.start_segment("db").end();
        txn.notice_error("boom");
        txn.set_web_response(WebResponse { status: Some(StatusCode::OK) });
        txn.end();
        txn.end();
    }

    #[test]
    fn test_disabled_application_is_inert() {
        let app = TracingBackend.new_application("svc", "abc", false).unwrap();
        let txn = app.start_transaction("GET /");
        txn.add_attribute("labels.k", "v");
        txn.start_segment("db").end();
        txn.end();
    }
}
