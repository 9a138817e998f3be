//! Errors raised while setting up instrumentation.
//!
//! None of these reach request handling: the middleware logs them and falls
//! back to pass-through mode.

use thiserror::Error;

use crate::config::ValidationError;

#[derive(Debug, Error)]
pub enum ApmError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ValidationError),

    #[error("backend rejected application: {0}")]
    Backend(String),
}
