use super::config::ConfigError;
use super::workspace::WorkspaceError;
use crate::core::models::parameters::ParametersError;
use crate::results::error::ResultError;
use crate::workflows::annotate::AnnotationError;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Invalid run options: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid parameters: {0}")]
    Parameters(#[from] ParametersError),

    #[error("Simulator executable not found: {}", path.display())]
    ExecutableNotFound { path: PathBuf },

    #[error("Protocol file not found: {}", path.display())]
    ProtocolNotFound { path: PathBuf },

    #[error(transparent)]
    Workspace(#[from] WorkspaceError),

    #[error("Failed to launch simulator {}: {source}", executable.display())]
    Spawn {
        executable: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed while waiting for the simulator: {0}")]
    Wait(std::io::Error),

    #[error("Simulator did not finish within {limit:?}")]
    TimedOut { limit: Duration },

    #[error("Simulation output is inconsistent: {0}")]
    Results(#[from] ResultError),

    #[error("Annotation failed: {0}")]
    Annotation(#[from] AnnotationError),
}

impl EngineError {
    /// True for failures detected before any side effect of the run.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            EngineError::Config(_)
                | EngineError::Parameters(_)
                | EngineError::ExecutableNotFound { .. }
                | EngineError::ProtocolNotFound { .. }
        )
    }
}
