use super::error::EngineError;
use std::path::Path;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Flag asking the simulator to write per-timepoint images.
pub const IMAGES_FLAG: &str = "--images";

const POLL_INTERVAL: Duration = Duration::from_millis(25);

/// One invocation of the simulator binary.
#[derive(Debug)]
pub struct Invocation<'a> {
    pub executable: &'a Path,
    pub parameters: &'a Path,
    pub protocol: &'a Path,
    pub images: bool,
    pub working_dir: &'a Path,
    pub timeout: Option<Duration>,
}

impl Invocation<'_> {
    fn command(&self) -> Command {
        let mut cmd = Command::new(self.executable);
        cmd.arg(self.parameters).arg(self.protocol);
        if self.images {
            cmd.arg(IMAGES_FLAG);
        }
        cmd.current_dir(self.working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::inherit());
        cmd
    }

    /// Runs the simulator to completion, blocking the calling thread.
    pub fn run(&self) -> Result<ExitStatus, EngineError> {
        debug!(
            "Invoking {:?} {:?} {:?} (images: {})",
            self.executable, self.parameters, self.protocol, self.images
        );
        let mut child = self.command().spawn().map_err(|e| EngineError::Spawn {
            executable: self.executable.to_path_buf(),
            source: e,
        })?;

        match self.timeout {
            None => child.wait().map_err(EngineError::Wait),
            Some(limit) => wait_with_deadline(&mut child, limit),
        }
    }
}

fn wait_with_deadline(child: &mut Child, limit: Duration) -> Result<ExitStatus, EngineError> {
    let deadline = Instant::now() + limit;
    loop {
        if let Some(status) = child.try_wait().map_err(EngineError::Wait)? {
            return Ok(status);
        }
        let now = Instant::now();
        if now >= deadline {
            warn!("Simulator exceeded {:?}; terminating pid {}", limit, child.id());
            if let Err(e) = child.kill() {
                warn!("Failed to kill simulator: {}", e);
            }
            child.wait().map_err(EngineError::Wait)?;
            return Err(EngineError::TimedOut { limit });
        }
        std::thread::sleep(POLL_INTERVAL.min(deadline - now));
    }
}
