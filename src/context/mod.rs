//! Request-scoped transaction storage.
//!
//! # Data Flow
//! ```text
//! ApmService (transaction started)
//!     → put() inserts RequestContext into the request extensions
//!     → handlers read it via get() or the `Apm` extractor
//!     → dropped together with the request
//! ```
//!
//! # Design Decisions
//! - One typed slot instead of a keyed map: no type checks on read
//! - A missing slot reads as "no transaction", never as an error

pub mod extract;

use axum::http::Extensions;

use crate::backend::TransactionHandle;

pub use extract::Apm;

/// Per-request instrumentation state.
#[derive(Clone, Default)]
pub struct RequestContext {
    transaction: Option<TransactionHandle>,
}

impl RequestContext {
    pub fn new(transaction: TransactionHandle) -> Self {
        Self {
            transaction: Some(transaction),
        }
    }

    pub fn transaction(&self) -> Option<&TransactionHandle> {
        self.transaction.as_ref()
    }

    pub fn is_active(&self) -> bool {
        self.transaction.is_some()
    }
}

impl std::fmt::Debug for RequestContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestContext")
            .field("active", &self.is_active())
            .finish()
    }
}

/// Store the transaction for this request, replacing any previous one.
pub fn put(extensions: &mut Extensions, transaction: TransactionHandle) {
    extensions.insert(RequestContext::new(transaction));
}

/// The active transaction for this request, if any.
pub fn get(extensions: &Extensions) -> Option<TransactionHandle> {
    extensions
        .get::<RequestContext>()
        .and_then(|ctx| ctx.transaction.clone())
}
