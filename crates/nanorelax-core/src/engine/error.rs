use thiserror::Error;

use super::config::ConfigError;
use crate::core::dynamics::error::DynamicsError;
use crate::core::selection::SelectionError;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Invalid configuration: {source}")]
    Config {
        #[from]
        source: ConfigError,
    },

    #[error("Invalid filter '{filter}': {source}")]
    Filter {
        filter: String,
        source: SelectionError,
    },

    #[error("Dynamics error: {source}")]
    Dynamics {
        #[from]
        source: DynamicsError,
    },

    #[error("Clustering produced no clusters; nothing to simulate")]
    NoClusters,
}
