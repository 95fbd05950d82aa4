//! Immutable snapshot of every security filter, swapped atomically on reload.

use std::sync::Arc;

use arc_swap::ArcSwap;

use crate::config::loader::ConfigError;
use crate::config::validation::ValidationError;
use crate::config::GatewayConfig;
use crate::security::coep::CoepFilter;
use crate::security::coop::{CoopFilter, CoopMode};
use crate::security::csp::CspFilter;
use crate::security::fetch_metadata::FetchMetadataFilter;

/// Filters built from one configuration. `None` means switched off.
#[derive(Debug, Clone)]
pub struct SecurityState {
    pub fetch_metadata: Option<FetchMetadataFilter>,
    pub coop: Option<CoopFilter>,
    pub coep: CoepFilter,
    pub csp: Option<CspFilter>,
}

/// Handle shared by all middleware. Each request loads one snapshot.
pub type SharedSecurity = Arc<ArcSwap<SecurityState>>;

impl SecurityState {
    pub fn from_config(config: &GatewayConfig) -> Result<Self, ConfigError> {
        let fetch_metadata = config
            .fetch_metadata
            .enabled
            .then(|| FetchMetadataFilter::new(config.fetch_metadata.exempted_paths.clone()));

        let coop = if config.coop.enabled {
            let mode: CoopMode = config
                .coop
                .mode
                .parse()
                .map_err(|e| ConfigError::Validation(vec![ValidationError::CoopMode(e)]))?;
            Some(CoopFilter::new(mode, config.coop.exempted_paths.clone()))
        } else {
            None
        };

        let coep = CoepFilter::new(
            config.coep.enforcing_mode,
            config.coep.disabled,
            &config.coep.report_uri,
            config.coep.exempted_paths.clone(),
        )
        .map_err(|e| ConfigError::Validation(vec![ValidationError::ReportUri { field: "coep.report_uri", source: e }]))?;

        let csp = config
            .csp
            .enabled
            .then(|| CspFilter::new(config.csp.report_only, config.csp.report_uri.clone()));

        Ok(Self {
            fetch_metadata,
            coop,
            coep,
            csp,
        })
    }

    pub fn shared(self) -> SharedSecurity {
        Arc::new(ArcSwap::from_pointee(self))
    }
}
