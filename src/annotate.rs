//! Annotation helpers for downstream handlers.
//!
//! Every function resolves the active transaction from the request
//! extensions first and does nothing when there is none, so handlers can
//! call them unconditionally.

use std::fmt;

use axum::http::Extensions;

use crate::backend::{Segment, Transaction};
use crate::context;

/// Namespace for custom attributes set through [`set_label`].
pub const LABEL_PREFIX: &str = "labels.";

/// Attach a custom attribute as `labels.<key>`.
pub fn set_label(extensions: &Extensions, key: &str, value: &str) {
    if let Some(txn) = context::get(extensions) {
        label(txn.as_ref(), key, value);
    }
}

/// Start a named segment on the active transaction.
///
/// The caller owns the returned span and should end it; `None` when no
/// transaction is active.
pub fn start_span(extensions: &Extensions, name: &str) -> Option<SpanHandle> {
    context::get(extensions).map(|txn| SpanHandle::new(txn.start_segment(name)))
}

/// Record an error against the active transaction without affecting control flow.
pub fn notice_error<E: fmt::Display + ?Sized>(extensions: &Extensions, error: &E) {
    if let Some(txn) = context::get(extensions) {
        txn.notice_error(&error.to_string());
    }
}

/// End a span returned by [`start_span`], tolerating `None`.
pub fn end_span(span: Option<SpanHandle>) {
    if let Some(span) = span {
        span.end();
    }
}

pub(crate) fn label(txn: &dyn Transaction, key: &str, value: &str) {
    txn.add_attribute(&format!("{}{}", LABEL_PREFIX, key), value);
}

/// Caller-owned segment. Ends on [`SpanHandle::end`] or when dropped.
pub struct SpanHandle {
    segment: Option<Box<dyn Segment>>,
}

impl SpanHandle {
    pub(crate) fn new(segment: Box<dyn Segment>) -> Self {
        Self {
            segment: Some(segment),
        }
    }

    pub fn end(mut self) {
        self.finish();
    }

    fn finish(&mut self) {
        if let Some(segment) = self.segment.take() {
            segment.end();
        }
    }
}

impl Drop for SpanHandle {
    fn drop(&mut self) {
        self.finish();
    }
}

impl fmt::Debug for SpanHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpanHandle")
            .field("open", &self.segment.is_some())
            .finish()
    }
}
