//! Tower layer that wraps each request in a backend transaction.
//!
//! # Request States
//! ```text
//! NotStarted → Active:   URL parsed, transaction started, stored in
//!                        extensions, request metadata attached
//! Active → Finalized:    response metadata attached, transaction ended
//!                        (FinalizeGuard drop, runs on every exit path)
//! ```
//!
//! # Design Decisions
//! - Active vs pass-through is decided once when the layer is built
//! - The URL is validated before the transaction starts, so a malformed
//!   request never leaves an unfinished transaction behind
//! - Downstream work runs inside the transaction's span when the backend
//!   provides one
//! - The downstream result is returned untouched

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use axum::http::{Request, Response};
use tower::{Layer, Service};
use tracing::Instrument;

use crate::backend::Backend;
use crate::config::ApmConfig;
use crate::context;
use crate::factory::{ApmState, EnabledApm};
use crate::middleware::guard::FinalizeGuard;
use crate::middleware::request;

/// Layer applying APM instrumentation to a service.
#[derive(Clone, Debug)]
pub struct ApmLayer {
    state: ApmState,
}

impl ApmLayer {
    /// Create the backend application and the layer around it.
    ///
    /// Setup problems are logged and produce a pass-through layer.
    pub fn new(config: ApmConfig, backend: &dyn Backend) -> Self {
        Self {
            state: ApmState::new(config, backend),
        }
    }

    pub fn from_state(state: ApmState) -> Self {
        Self { state }
    }

    pub fn is_enabled(&self) -> bool {
        self.state.is_enabled()
    }
}

impl<S> Layer<S> for ApmLayer {
    type Service = ApmService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        match &self.state {
            ApmState::Enabled(apm) => ApmService::Active {
                inner,
                apm: apm.clone(),
            },
            ApmState::Disabled => ApmService::PassThrough { inner },
        }
    }
}

/// Service produced by [`ApmLayer`].
#[derive(Clone)]
pub enum ApmService<S> {
    Active { inner: S, apm: EnabledApm },
    PassThrough { inner: S },
}

impl<S> ApmService<S> {
    pub fn is_active(&self) -> bool {
        matches!(self, ApmService::Active { .. })
    }
}

impl<S, ReqBody, ResBody> Service<Request<ReqBody>> for ApmService<S>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>>,
    S::Future: Send + 'static,
    S::Error: fmt::Display + Send + 'static,
    ResBody: Send + 'static,
{
    type Response = Response<ResBody>;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        match self {
            ApmService::Active { inner, .. } | ApmService::PassThrough { inner } => inner.poll_ready(cx),
        }
    }

    fn call(&mut self, mut req: Request<ReqBody>) -> Self::Future {
        let (inner, apm) = match self {
            ApmService::PassThrough { inner } => return Box::pin(inner.call(req)),
            ApmService::Active { inner, apm } => (inner, apm),
        };

        let Some(guard) = begin(apm, &mut req) else {
            return Box::pin(inner.call(req));
        };

        let span = guard.span();
        let fut = span.in_scope(|| inner.call(req));
        Box::pin(
            async move {
                let mut guard = guard;
                match fut.await {
                    Ok(response) => {
                        guard.record_status(response.status());
                        Ok(response)
                    }
                    Err(err) => {
                        guard.notice_error(&err.to_string());
                        Err(err)
                    }
                }
            }
            .instrument(span),
        )
    }
}

/// Start the transaction for `req`, or `None` if its path and query do not parse.
fn begin<B>(apm: &EnabledApm, req: &mut Request<B>) -> Option<FinalizeGuard> {
    let web_request = match request::web_request(req, apm.transport) {
        Ok(meta) => meta,
        Err(e) => {
            tracing::debug!(
                uri = %req.uri(),
                error = %e,
                "Unparseable request URL, skipping instrumentation"
            );
            return None;
        }
    };

    let name = request::transaction_name(req, apm.route_names);
    let transaction = apm.application.start_transaction(&name);
    context::put(req.extensions_mut(), transaction.clone());
    transaction.set_web_request(web_request);

    tracing::trace!(transaction = %name, "Transaction started");
    Some(FinalizeGuard::new(transaction))
}
