//! Request lifecycle instrumentation.
//!
//! # Data Flow
//! ```text
//! inbound request
//!     → layer.rs (ApmService: pass-through, or start transaction)
//!     → request.rs (URL, host, method, transaction name)
//!     → downstream handlers (annotate via crate::annotate / Apm extractor)
//!     → guard.rs (response status attached, transaction ended)
//!     → response returned unchanged
//! ```

mod guard;
pub mod layer;
pub mod request;

pub use layer::{ApmLayer, ApmService};
