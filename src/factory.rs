//! Backend application construction.
//!
//! # Responsibilities
//! - Normalize the APM config
//! - Create the long-lived backend application once
//! - Decide, once, whether the middleware instruments or passes through
//!
//! # Design Decisions
//! - Setup failures are logged and yield `ApmState::Disabled`; they never
//!   propagate to the caller building the router

use std::sync::Arc;

use crate::backend::{Application, Backend};
use crate::config::{normalize, ApmConfig, TransportKind};
use crate::error::ApmError;

/// Outcome of middleware setup.
#[derive(Clone)]
pub enum ApmState {
    Enabled(EnabledApm),
    Disabled,
}

/// Shared, immutable state used by every instrumented request.
#[derive(Clone)]
pub struct EnabledApm {
    pub(crate) application: Arc<dyn Application>,
    pub(crate) transport: TransportKind,
    pub(crate) route_names: bool,
}

impl EnabledApm {
    pub fn transport(&self) -> TransportKind {
        self.transport
    }
}

/// Normalize `config` and create the backend application.
pub fn build_application(config: ApmConfig, backend: &dyn Backend) -> Result<EnabledApm, ApmError> {
    let config = normalize(config)?;
    let application = backend.new_application(&config.app_name, &config.credential, config.enabled)?;

    Ok(EnabledApm {
        application,
        transport: config.transport_kind(),
        route_names: config.route_names,
    })
}

impl ApmState {
    /// Build the middleware state, degrading to `Disabled` on any setup error.
    pub fn new(config: ApmConfig, backend: &dyn Backend) -> Self {
        let app_name = config.app_name.clone();
        match build_application(config, backend) {
            Ok(enabled) => {
                tracing::info!(
                    app = %app_name,
                    transport = %enabled.transport,
                    "APM instrumentation active"
                );
                ApmState::Enabled(enabled)
            }
            Err(e) => {
                tracing::error!(error = %e, "Unable to create APM application, instrumentation disabled");
                ApmState::Disabled
            }
        }
    }

    pub fn is_enabled(&self) -> bool {
        matches!(self, ApmState::Enabled(_))
    }
}

impl std::fmt::Debug for ApmState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApmState::Enabled(apm) => f
                .debug_struct("Enabled")
                .field("transport", &apm.transport)
                .finish_non_exhaustive(),
            ApmState::Disabled => f.write_str("Disabled"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::memory::Event;
    use crate::backend::InMemoryBackend;
    use crate::config::ValidationError;

    #[test]
    fn test_missing_credential_makes_no_backend_calls() {
        let backend = InMemoryBackend::new();
        let state = ApmState::new(ApmConfig::new("", "x"), &backend);

        assert!(!state.is_enabled());
        assert!(backend.is_empty());
    }

    #[test]
    fn test_missing_credential_error() {
        let err = build_application(ApmConfig::new("", "x"), &InMemoryBackend::new()).err().unwrap();
        assert!(matches!(err, ApmError::Config(ValidationError::MissingCredential)));
    }

    #[test]
    fn test_backend_failure_disables() {
        let state = ApmState::new(ApmConfig::new("abc", "svc"), &InMemoryBackend::failing("nope"));
        assert!(!state.is_enabled());
    }

    #[test]
    fn test_application_receives_normalized_config() {
        let backend = InMemoryBackend::new();
        let config = ApmConfig::new("abc", "").with_enabled(true).with_transport("ftp");
        let enabled = build_application(config, &backend).unwrap();

        assert_eq!(enabled.transport(), TransportKind::Http);
        assert_eq!(
            backend.events(),
            vec![Event::ApplicationCreated {
                app_name: "axum-api".to_string(),
                credential: "abc".to_string(),
                enabled: true,
            }]
        );
    }
}
