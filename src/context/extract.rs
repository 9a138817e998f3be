//! Axum extractor for the request's APM context.
//!
//! Never rejects: a request that was not instrumented yields an inactive
//! context whose annotation methods are no-ops.

use std::convert::Infallible;
use std::fmt;

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::annotate::{self, SpanHandle};
use crate::context::RequestContext;

/// Handler-side access to the active transaction.
#[derive(Clone, Debug, Default)]
pub struct Apm(pub RequestContext);

impl<S: Send + Sync> FromRequestParts<S> for Apm {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Apm(parts
            .extensions
            .get::<RequestContext>()
            .cloned()
            .unwrap_or_default()))
    }
}

impl Apm {
    pub fn is_active(&self) -> bool {
        self.0.is_active()
    }

    pub fn set_label(&self, key: &str, value: &str) {
        if let Some(txn) = self.0.transaction() {
            annotate::label(txn.as_ref(), key, value);
        }
    }

    pub fn start_span(&self, name: &str) -> Option<SpanHandle> {
        self.0
            .transaction()
            .map(|txn| SpanHandle::new(txn.start_segment(name)))
    }

    pub fn notice_error<E: fmt::Display + ?Sized>(&self, error: &E) {
        if let Some(txn) = self.0.transaction() {
            txn.notice_error(&error.to_string());
        }
    }
}
