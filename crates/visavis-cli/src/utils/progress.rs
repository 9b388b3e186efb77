use indicatif::{ProgressBar, ProgressDrawTarget, ProgressState, ProgressStyle};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::warn;
use visavis::engine::progress::{Progress, ProgressCallback};

const SPINNER_TICK_MS: u64 = 80;

/// Phase during which the external simulator runs; its length is unknown.
const SIMULATION_PHASE: &str = "Simulation";
/// Phase with one task step per annotated timepoint.
const ANNOTATION_PHASE: &str = "Annotation";

fn step_unit(phase: Option<&str>) -> &'static str {
    match phase {
        Some(ANNOTATION_PHASE) => "timepoints",
        _ => "steps",
    }
}

struct RunDisplay {
    bar: ProgressBar,
    phase: Option<&'static str>,
}

impl RunDisplay {
    fn start_phase(&mut self, name: &'static str) {
        self.phase = Some(name);
        self.bar.reset();
        self.bar.set_length(0);
        self.bar.set_prefix("");
        let style = if name == SIMULATION_PHASE {
            CliProgressHandler::waiting_style()
        } else {
            CliProgressHandler::spinner_style()
        };
        self.bar.set_style(style);
        self.bar
            .enable_steady_tick(Duration::from_millis(SPINNER_TICK_MS));
        self.bar.set_message(name);
    }

    fn finish_phase(&mut self) {
        self.bar.disable_steady_tick();
        let summary = match self.phase.take() {
            Some(name) => format!("✓ {} ({:.1}s)", name, self.bar.elapsed().as_secs_f64()),
            None => "✓ Done".to_string(),
        };
        self.bar.finish_with_message(summary);
    }

    fn start_task(&mut self, total_steps: u64) {
        self.bar.disable_steady_tick();
        self.bar.set_length(total_steps);
        self.bar.set_position(0);
        self.bar.set_prefix(step_unit(self.phase));
        self.bar.set_style(CliProgressHandler::bar_style());
    }

    fn finish_task(&mut self) {
        let length = self.bar.length().unwrap_or(0);
        if self.bar.position() < length {
            self.bar.set_position(length);
        }
    }
}

/// Shows the preparation, simulation and annotation phases of a run on
/// stderr, one line at a time.
#[derive(Clone)]
pub struct CliProgressHandler {
    display: Arc<Mutex<RunDisplay>>,
}

impl CliProgressHandler {
    pub fn new() -> Self {
        let bar = ProgressBar::new(0)
            .with_style(Self::spinner_style())
            .with_message("Waiting for run...");
        bar.set_draw_target(ProgressDrawTarget::stderr());
        bar.finish_and_clear();

        Self {
            display: Arc::new(Mutex::new(RunDisplay { bar, phase: None })),
        }
    }

    pub fn get_callback(&self) -> ProgressCallback<'static> {
        let display = self.display.clone();

        Box::new(move |progress: Progress| {
            let Ok(mut display) = display.lock() else {
                warn!("Progress display mutex was poisoned. Cannot update progress.");
                return;
            };

            match progress {
                Progress::PhaseStart { name } => display.start_phase(name),
                Progress::PhaseFinish => display.finish_phase(),
                Progress::TaskStart { total_steps } => display.start_task(total_steps),
                Progress::TaskIncrement => display.bar.inc(1),
                Progress::TaskFinish => display.finish_task(),
                Progress::Message(msg) => display.bar.println(format!("  · {}", msg)),
            }
        })
    }

    fn spinner_style() -> ProgressStyle {
        ProgressStyle::with_template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
    }

    /// Spinner with a running clock, for the blocking simulator call.
    fn waiting_style() -> ProgressStyle {
        ProgressStyle::with_template("{spinner:.yellow} {msg} running for {elapsed}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
    }

    fn bar_style() -> ProgressStyle {
        ProgressStyle::with_template(
            "{msg:<11} [{bar:36.cyan/blue}] {pos}/{len} {prefix} ({eta})",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .with_key("eta", |state: &ProgressState, w: &mut dyn std::fmt::Write| {
            write!(w, "{:.1}s", state.eta().as_secs_f64()).ok();
        })
        .progress_chars("=>-")
    }
}

impl Default for CliProgressHandler {
    fn default() -> Self {
        Self::new()
    }
}
