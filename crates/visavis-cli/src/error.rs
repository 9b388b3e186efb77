use std::path::PathBuf;
use thiserror::Error;
use visavis::core::models::parameters::ParametersError;
use visavis::engine::error::EngineError;
use visavis::results::ResultError;

pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Results(#[from] ResultError),

    #[error(transparent)]
    Parameters(#[from] ParametersError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to parse file '{path}': {source}", path = path.display())]
    FileParsing {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    #[error("Simulation '{0}' exited with a failure status")]
    SimulationFailed(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to render report: {0}")]
    Format(#[from] std::fmt::Error),

    #[error("Invalid argument: {0}")]
    Argument(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
