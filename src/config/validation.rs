//! APM configuration validation.
//!
//! # Responsibilities
//! - Substitute defaults for recoverable mistakes (empty app name, unknown transport)
//! - Reject configs that cannot produce a backend application (missing credential)
//!
//! # Design Decisions
//! - Pure function: ApmConfig → Result<ApmConfig, ValidationError>
//! - Defaults are substituted before the credential check so the normalized
//!   config is always well formed

use thiserror::Error;

use crate::config::schema::{ApmConfig, TransportKind, DEFAULT_APP_NAME};

/// A configuration problem that prevents instrumentation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("credential can not be empty")]
    MissingCredential,
}

/// Normalize an APM config, substituting defaults where possible.
pub fn normalize(mut config: ApmConfig) -> Result<ApmConfig, ValidationError> {
    if TransportKind::parse(&config.transport).is_none() {
        tracing::warn!(
            transport = %config.transport,
            fallback = %TransportKind::default(),
            "Unrecognized APM transport, using default"
        );
        config.transport = TransportKind::default().as_str().to_string();
    }

    if config.app_name.is_empty() {
        config.app_name = DEFAULT_APP_NAME.to_string();
    }

    if config.credential.trim().is_empty() {
        return Err(ValidationError::MissingCredential);
    }

    Ok(config)
}
