use crate::core::models::parameters::{Parameters, ParametersError};
use rand::Rng;
use rand::distributions::Uniform;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

pub const PARAMETERS_FILE_NAME: &str = "parameters.json";

const GENERATED_NAME_PREFIX: &str = "sim_";
const GENERATED_NAME_LEN: usize = 16;
const MAX_NAME_ATTEMPTS: usize = 8;

#[derive(Debug, Error)]
pub enum WorkspaceError {
    #[error("Workspace directory already exists: {}", path.display())]
    AlreadyExists { path: PathBuf },

    #[error("Protocol source file not found: {}", path.display())]
    SourceNotFound { path: PathBuf },

    #[error("Protocol source has no file name: {}", path.display())]
    InvalidSource { path: PathBuf },

    #[error("Failed to write parameters: {0}")]
    Parameters(#[from] ParametersError),

    #[error("Workspace I/O error at '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> WorkspaceError + '_ {
    move |source| WorkspaceError::Io {
        path: path.to_path_buf(),
        source,
    }
}

fn random_name(rng: &mut impl Rng) -> String {
    let letters = Uniform::from(b'A'..=b'Z');
    let suffix: String = (0..GENERATED_NAME_LEN)
        .map(|_| rng.sample(letters) as char)
        .collect();
    format!("{}{}", GENERATED_NAME_PREFIX, suffix)
}

/// An isolated directory holding the inputs and outputs of one simulation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workspace {
    name: String,
    path: PathBuf,
}

impl Workspace {
    /// Creates a fresh workspace directory under `root`.
    ///
    /// Without a name, a random `sim_XXXXXXXXXXXXXXXX` name is generated and
    /// regenerated on collision a bounded number of times. An explicit name is
    /// used as-is and fails if the directory already exists.
    pub fn create(root: &Path, name: Option<&str>) -> Result<Self, WorkspaceError> {
        std::fs::create_dir_all(root).map_err(io_error(root))?;

        if let Some(name) = name {
            return Self::create_named(root, name);
        }

        let mut rng = rand::thread_rng();
        let mut last_collision = None;
        for _ in 0..MAX_NAME_ATTEMPTS {
            match Self::create_named(root, &random_name(&mut rng)) {
                Err(WorkspaceError::AlreadyExists { path }) => {
                    warn!("Generated workspace name collided: {:?}", path);
                    last_collision = Some(path);
                }
                other => return other,
            }
        }
        Err(WorkspaceError::AlreadyExists {
            path: last_collision.unwrap_or_else(|| root.to_path_buf()),
        })
    }

    fn create_named(root: &Path, name: &str) -> Result<Self, WorkspaceError> {
        let path = root.join(name);
        match std::fs::create_dir(&path) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                return Err(WorkspaceError::AlreadyExists { path });
            }
            Err(e) => return Err(io_error(&path)(e)),
        }
        let path = std::fs::canonicalize(&path).map_err(io_error(&path))?;
        debug!("Created workspace {:?}", path);
        Ok(Self {
            name: name.to_string(),
            path,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Absolute path of the workspace directory.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn write_config(&self, parameters: &Parameters) -> Result<PathBuf, WorkspaceError> {
        let target = self.path.join(PARAMETERS_FILE_NAME);
        parameters.write_json(&target)?;
        debug!("Wrote parameters to {:?}", target);
        Ok(target)
    }

    /// Copies the protocol file into the workspace under its original file name.
    pub fn stage_protocol(&self, source: &Path) -> Result<PathBuf, WorkspaceError> {
        if !source.is_file() {
            return Err(WorkspaceError::SourceNotFound {
                path: source.to_path_buf(),
            });
        }
        let file_name = source
            .file_name()
            .ok_or_else(|| WorkspaceError::InvalidSource {
                path: source.to_path_buf(),
            })?;
        let target = self.path.join(file_name);
        std::fs::copy(source, &target).map_err(io_error(source))?;
        debug!("Staged protocol {:?} as {:?}", source, target);
        Ok(target)
    }

    /// Recursively removes the workspace. Removing an absent workspace is a no-op.
    pub fn destroy(&self) -> Result<(), WorkspaceError> {
        match std::fs::remove_dir_all(&self.path) {
            Ok(()) => {
                debug!("Removed workspace {:?}", self.path);
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(io_error(&self.path)(e)),
        }
    }
}
