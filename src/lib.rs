//! Per-request APM instrumentation for axum and tower services.
//!
//! ```text
//!   ApmLayer::new(config, &backend)
//!        │  factory: validate config, create backend application once
//!        ▼
//!   ApmService ──── Disabled ───▶ pass-through
//!        │ Active
//!        ▼
//!   start "<METHOD> <PATH>" transaction ─▶ request extensions (context)
//!        │                                        │
//!        ▼                                        ▼
//!   downstream handlers ◀──── annotate: set_label / start_span / notice_error
//!        │
//!        ▼
//!   response status attached, transaction ended (always)
//! ```

pub mod annotate;
pub mod backend;
pub mod config;
pub mod context;
pub mod error;
pub mod factory;
pub mod middleware;
pub mod observability;
pub mod server;

pub use annotate::{end_span, notice_error, set_label, start_span, SpanHandle};
pub use backend::{Backend, InMemoryBackend, TracingBackend};
pub use config::{ApmConfig, TransportKind};
pub use context::{Apm, RequestContext};
pub use error::ApmError;
pub use factory::ApmState;
pub use middleware::{ApmLayer, ApmService};
