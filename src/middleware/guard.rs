//! Transaction finalization guard.
//!
//! Attaches the response metadata and ends the transaction when dropped, so
//! finalization happens exactly once on every exit path: normal completion,
//! downstream error, panic, or the response future being cancelled.

use axum::http::StatusCode;
use tracing::Span;

use crate::backend::{TransactionHandle, WebResponse};

pub(crate) struct FinalizeGuard {
    transaction: TransactionHandle,
    status: Option<StatusCode>,
}

impl FinalizeGuard {
    pub(crate) fn new(transaction: TransactionHandle) -> Self {
        Self {
            transaction,
            status: None,
        }
    }

    pub(crate) fn record_status(&mut self, status: StatusCode) {
        self.status = Some(status);
    }

    /// Span downstream work should run in; disabled when the backend has none.
    pub(crate) fn span(&self) -> Span {
        self.transaction.span().unwrap_or_else(Span::none)
    }

    pub(crate) fn notice_error(&self, message: &str) {
        self.transaction.notice_error(message);
    }
}

impl Drop for FinalizeGuard {
    fn drop(&mut self) {
        self.transaction.set_web_response(WebResponse {
            status: self.status,
        });
        self.transaction.end();
    }
}
