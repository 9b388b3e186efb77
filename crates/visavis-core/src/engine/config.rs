use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ConfigError {
    #[error("Annotating images requires image generation to be enabled")]
    AnnotateWithoutImages,

    #[error("Invalid workspace name: '{0}'")]
    InvalidName(String),

    #[error("Timeout must be greater than zero")]
    ZeroTimeout,
}

/// How a single simulation run is driven and what happens to its workspace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOptions {
    /// Ask the simulator to write one image per output timepoint.
    pub images: bool,
    /// Hand every image to the annotation collaborator after a successful run.
    pub annotate: bool,
    /// Remove the workspace once the run is over, whatever its outcome.
    pub clean_up: bool,
    /// Directory under which the workspace is created.
    pub root: PathBuf,
    /// Workspace directory name; generated when absent.
    pub name: Option<String>,
    /// Report run milestones through the progress reporter.
    pub verbose: bool,
    /// Upper bound on the simulator's wall-clock time.
    pub timeout: Option<Duration>,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            images: false,
            annotate: false,
            clean_up: true,
            root: PathBuf::from("."),
            name: None,
            verbose: true,
            timeout: None,
        }
    }
}

impl RunOptions {
    pub fn builder() -> RunOptionsBuilder {
        RunOptionsBuilder::new()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.annotate && !self.images {
            return Err(ConfigError::AnnotateWithoutImages);
        }
        if let Some(name) = &self.name {
            let is_plain = !name.is_empty()
                && name != "."
                && name != ".."
                && !name.contains(['/', '\\']);
            if !is_plain {
                return Err(ConfigError::InvalidName(name.clone()));
            }
        }
        if self.timeout == Some(Duration::ZERO) {
            return Err(ConfigError::ZeroTimeout);
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct RunOptionsBuilder {
    images: Option<bool>,
    annotate: Option<bool>,
    clean_up: Option<bool>,
    root: Option<PathBuf>,
    name: Option<String>,
    verbose: Option<bool>,
    timeout: Option<Duration>,
}

impl RunOptionsBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn images(mut self, images: bool) -> Self {
        self.images = Some(images);
        self
    }
    pub fn annotate(mut self, annotate: bool) -> Self {
        self.annotate = Some(annotate);
        self
    }
    pub fn clean_up(mut self, clean_up: bool) -> Self {
        self.clean_up = Some(clean_up);
        self
    }
    pub fn root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = Some(root.into());
        self
    }
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = Some(verbose);
        self
    }
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn build(self) -> Result<RunOptions, ConfigError> {
        let defaults = RunOptions::default();
        let options = RunOptions {
            images: self.images.unwrap_or(defaults.images),
            annotate: self.annotate.unwrap_or(defaults.annotate),
            clean_up: self.clean_up.unwrap_or(defaults.clean_up),
            root: self.root.unwrap_or(defaults.root),
            name: self.name.or(defaults.name),
            verbose: self.verbose.unwrap_or(defaults.verbose),
            timeout: self.timeout.or(defaults.timeout),
        };
        options.validate()?;
        Ok(options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_clean_up_and_report() {
        let options = RunOptions::builder().build().unwrap();
        assert!(options.clean_up);
        assert!(options.verbose);
        assert!(!options.images);
        assert!(!options.annotate);
        assert_eq!(options.timeout, None);
        assert_eq!(options.root, PathBuf::from("."));
    }

    #[test]
    fn annotate_requires_images() {
        let result = RunOptions::builder().annotate(true).build();
        assert_eq!(result, Err(ConfigError::AnnotateWithoutImages));

        let options = RunOptions::builder()
            .images(true)
            .annotate(true)
            .build()
            .unwrap();
        assert!(options.annotate);
    }

    #[test]
    fn rejects_names_that_escape_the_root() {
        for bad in ["", "..", "a/b", "a\\b"] {
            let result = RunOptions::builder().name(bad).build();
            assert!(matches!(result, Err(ConfigError::InvalidName(_))), "{}", bad);
        }
        assert!(RunOptions::builder().name("sim_custom").build().is_ok());
    }

    #[test]
    fn rejects_zero_timeout() {
        let result = RunOptions::builder().timeout(Duration::ZERO).build();
        assert_eq!(result, Err(ConfigError::ZeroTimeout));
    }
}
