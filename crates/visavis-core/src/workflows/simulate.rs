use crate::core::models::parameters::Parameters;
use crate::engine::config::RunOptions;
use crate::engine::error::EngineError;
use crate::engine::process::Invocation;
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::workspace::Workspace;
use crate::results::store::ResultStore;
use crate::workflows::annotate::{self, Annotator};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tracing::{info, instrument, warn};

const WINDOWS_EXECUTABLE_SUFFIX: &str = ".exe";

/// Finds the simulator binary, trying `<path>.exe` when `path` itself is not a file.
pub fn resolve_executable(path: &Path) -> Result<PathBuf, EngineError> {
    let mut with_suffix = OsString::from(path.as_os_str());
    with_suffix.push(WINDOWS_EXECUTABLE_SUFFIX);

    [path.to_path_buf(), PathBuf::from(with_suffix)]
        .into_iter()
        .find(|candidate| candidate.is_file())
        .and_then(|found| std::fs::canonicalize(found).ok())
        .ok_or_else(|| EngineError::ExecutableNotFound {
            path: path.to_path_buf(),
        })
}

fn resolve_protocol(path: &Path) -> Result<PathBuf, EngineError> {
    if !path.is_file() {
        return Err(EngineError::ProtocolNotFound {
            path: path.to_path_buf(),
        });
    }
    std::fs::canonicalize(path).map_err(|_| EngineError::ProtocolNotFound {
        path: path.to_path_buf(),
    })
}

/// Best-effort removal on a path that is already failing.
fn abandon(workspace: &Workspace, options: &RunOptions) {
    if options.clean_up {
        if let Err(e) = workspace.destroy() {
            warn!("Could not remove workspace {:?}: {}", workspace.path(), e);
        }
    }
}

/// Drives one simulation from a fresh workspace to a loaded [`ResultStore`].
///
/// Returns `Ok(None)` when the simulator exits with a nonzero status. Invalid
/// options, parameters, or missing input files are reported before anything
/// is written to disk.
#[instrument(skip_all, name = "simulation_workflow")]
pub fn run(
    executable: &Path,
    parameters: &Parameters,
    protocol: &Path,
    options: &RunOptions,
    annotator: &dyn Annotator,
    reporter: &ProgressReporter,
) -> Result<Option<ResultStore>, EngineError> {
    options.validate()?;
    parameters.validate()?;
    let executable = resolve_executable(executable)?;
    let protocol = resolve_protocol(protocol)?;

    let say = |text: String| {
        if options.verbose {
            reporter.message(text);
        }
    };

    // === Phase 1: Workspace ===
    reporter.report(Progress::PhaseStart { name: "Preparation" });
    let workspace = Workspace::create(&options.root, options.name.as_deref())?;
    let inputs = workspace
        .write_config(parameters)
        .and_then(|config| Ok((config, workspace.stage_protocol(&protocol)?)));
    let (config_path, protocol_path) = match inputs {
        Ok(paths) => paths,
        Err(e) => {
            abandon(&workspace, options);
            return Err(e.into());
        }
    };
    reporter.report(Progress::PhaseFinish);

    // === Phase 2: Simulator ===
    info!("Starting simulation {} in {:?}", workspace.name(), workspace.path());
    say(format!("Starting simulation {}", workspace.name()));
    reporter.report(Progress::PhaseStart { name: "Simulation" });
    let invocation = Invocation {
        executable: &executable,
        parameters: &config_path,
        protocol: &protocol_path,
        images: options.images,
        working_dir: workspace.path(),
        timeout: options.timeout,
    };
    let status = invocation.run();
    reporter.report(Progress::PhaseFinish);
    let status = match status {
        Ok(status) => status,
        Err(e) => {
            abandon(&workspace, options);
            return Err(e);
        }
    };

    if !status.success() {
        warn!("Simulation {} failed: {}", workspace.name(), status);
        say(format!("Simulation {} failed ({})", workspace.name(), status));
        if options.clean_up {
            workspace.destroy()?;
        }
        return Ok(None);
    }
    say(format!("Finished simulation {}", workspace.name()));

    // === Phase 3: Results ===
    let store = match ResultStore::load(workspace.path()) {
        Ok(store) => store,
        Err(e) => {
            abandon(&workspace, options);
            return Err(e.into());
        }
    };

    if options.clean_up {
        workspace.destroy()?;
    } else if options.annotate {
        say(format!("Annotating images of {}", workspace.name()));
        annotate::annotate_all(&store, annotator, reporter)?;
        say(format!("Finished annotating images of {}", workspace.name()));
    }

    info!(
        "Simulation {} complete with {} timepoint(s).",
        workspace.name(),
        store.timepoints().len()
    );
    Ok(Some(store))
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::core::models::timepoint::Timepoint;
    use crate::engine::config::ConfigError;
    use crate::results::error::ResultError;
    use crate::workflows::annotate::ReportAnnotator;
    use serial_test::serial;
    use std::fs;
    use std::os::unix::fs::PermissionsExt;
    use std::sync::Mutex;
    use std::time::Duration;
    use tempfile::{TempDir, tempdir};

    const WELL_FORMED_OUTPUT: &str = r#"
test -f "$1" || exit 9
test -f "$2" || exit 9
printf 'left,right\n0,1\n' > neighbors.csv
printf 'id,alive,Vinf,VRNA\n0,1,0,0\n1,1,1,3\n' > t_0000m.csv
printf 'id,alive,Vinf,VRNA\n0,1,0,0\n1,1,0,0\n' > t_0-300m.csv
printf 'id,alive,Vinf,VRNA\n0,1,1,3\n1,0,1,3\n' > t_0490m.csv
if [ "$3" = "--images" ]; then
  for f in t_*.csv; do : > "${f%.csv}.png"; done
fi
"#;

    struct Fixture {
        dir: TempDir,
        protocol: PathBuf,
    }

    impl Fixture {
        fn new() -> Self {
            let dir = tempdir().unwrap();
            let protocol = dir.path().join("protocol.txt");
            fs::write(&protocol, "infect 0h\n").unwrap();
            Self { dir, protocol }
        }

        fn stub(&self, file_name: &str, body: &str) -> PathBuf {
            let path = self.dir.path().join(file_name);
            fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
            fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
            path
        }

        fn root(&self) -> PathBuf {
            self.dir.path().join("runs")
        }

        fn options(&self) -> crate::engine::config::RunOptionsBuilder {
            RunOptions::builder().root(self.root())
        }

        fn run(
            &self,
            executable: &Path,
            options: &RunOptions,
        ) -> Result<Option<ResultStore>, EngineError> {
            run(
                executable,
                &Parameters::default(),
                &self.protocol,
                options,
                &ReportAnnotator,
                &ProgressReporter::new(),
            )
        }

        fn workspaces(&self) -> usize {
            fs::read_dir(self.root()).map_or(0, |entries| entries.count())
        }
    }

    #[test]
    #[serial]
    fn success_yields_observed_hours() {
        let fx = Fixture::new();
        let exe = fx.stub("sim", WELL_FORMED_OUTPUT);
        let options = fx.options().build().unwrap();

        let store = fx.run(&exe, &options).unwrap().unwrap();
        let late = Timepoint::from_minutes(490).hours();
        assert_eq!(store.hours(), vec![-5.0, 0.0, late]);
        assert_eq!(store.at(0.0).flags("VRNA_act").unwrap(), vec![false, true]);
        for hour in store.hours() {
            assert_eq!(store.at(hour).len(), 2);
            assert_eq!(store.neighbors_at(hour).len(), 2);
            assert_eq!(store.summary(hour).unwrap().fields, 2);
        }
        assert_eq!(store.summary(late).unwrap().alive, 1);
        assert_eq!(fx.workspaces(), 0);
    }

    #[test]
    #[serial]
    fn nonzero_exit_yields_none_and_removes_workspace() {
        let fx = Fixture::new();
        let exe = fx.stub("sim", "exit 1");
        let options = fx.options().name("failing").build().unwrap();

        assert!(fx.run(&exe, &options).unwrap().is_none());
        assert!(!fx.root().join("failing").exists());
    }

    #[test]
    #[serial]
    fn nonzero_exit_keeps_workspace_without_clean_up() {
        let fx = Fixture::new();
        let exe = fx.stub("sim", "exit 2");
        let options = fx.options().name("kept").clean_up(false).build().unwrap();

        assert!(fx.run(&exe, &options).unwrap().is_none());
        let workspace = fx.root().join("kept");
        assert!(workspace.join("parameters.json").is_file());
        assert!(workspace.join("protocol.txt").is_file());
    }

    #[test]
    #[serial]
    fn annotate_without_images_fails_before_any_side_effect() {
        let fx = Fixture::new();
        let exe = fx.stub("sim", WELL_FORMED_OUTPUT);
        let options = RunOptions {
            annotate: true,
            images: false,
            root: fx.root(),
            ..RunOptions::default()
        };

        let result = fx.run(&exe, &options);
        assert!(matches!(
            result,
            Err(EngineError::Config(ConfigError::AnnotateWithoutImages))
        ));
        assert!(!fx.root().exists());
    }

    #[test]
    #[serial]
    fn missing_inputs_are_preconditions() {
        let fx = Fixture::new();
        let exe = fx.stub("sim", WELL_FORMED_OUTPUT);
        let options = fx.options().build().unwrap();

        let missing_exe = fx.run(&fx.dir.path().join("nope"), &options).unwrap_err();
        assert!(matches!(missing_exe, EngineError::ExecutableNotFound { .. }));
        assert!(missing_exe.is_precondition());

        let missing_protocol = run(
            &exe,
            &Parameters::default(),
            &fx.dir.path().join("absent.txt"),
            &options,
            &ReportAnnotator,
            &ProgressReporter::new(),
        )
        .unwrap_err();
        assert!(matches!(missing_protocol, EngineError::ProtocolNotFound { .. }));
        assert!(!fx.root().exists());
    }

    #[test]
    #[serial]
    fn invalid_parameters_are_preconditions() {
        let fx = Fixture::new();
        let exe = fx.stub("sim", WELL_FORMED_OUTPUT);
        let options = fx.options().build().unwrap();
        let mut parameters = Parameters::default();
        parameters.set("die", -1.0).unwrap();

        let result = run(
            &exe,
            &parameters,
            &fx.protocol,
            &options,
            &ReportAnnotator,
            &ProgressReporter::new(),
        );
        assert!(matches!(result, Err(EngineError::Parameters(_))));
        assert!(!fx.root().exists());
    }

    #[test]
    #[serial]
    fn falls_back_to_exe_suffix() {
        let fx = Fixture::new();
        fx.stub("sim.exe", WELL_FORMED_OUTPUT);
        let options = fx.options().build().unwrap();

        let store = fx.run(&fx.dir.path().join("sim"), &options).unwrap();
        assert!(store.is_some());
    }

    #[test]
    #[serial]
    fn annotates_images_when_workspace_is_kept() {
        let fx = Fixture::new();
        let exe = fx.stub("sim", WELL_FORMED_OUTPUT);
        let options = fx
            .options()
            .name("annotated")
            .images(true)
            .annotate(true)
            .clean_up(false)
            .build()
            .unwrap();

        let store = fx.run(&exe, &options).unwrap().unwrap();
        for stem in ["t_0000m", "t_0-300m", "t_0490m"] {
            assert!(store.directory().join(format!("{stem}.toml")).is_file());
        }
    }

    #[test]
    #[serial]
    fn images_without_annotation_are_left_untouched() {
        let fx = Fixture::new();
        let exe = fx.stub("sim", WELL_FORMED_OUTPUT);
        let options = fx
            .options()
            .name("plain")
            .images(true)
            .clean_up(false)
            .build()
            .unwrap();

        fx.run(&exe, &options).unwrap().unwrap();
        let workspace = fx.root().join("plain");
        assert!(workspace.join("t_0000m.png").is_file());
        assert!(!workspace.join("t_0000m.toml").exists());
    }

    #[test]
    #[serial]
    fn timeout_kills_simulator_and_cleans_up() {
        let fx = Fixture::new();
        let exe = fx.stub("sim", "exec sleep 10");
        let options = fx
            .options()
            .name("slow")
            .timeout(Duration::from_millis(200))
            .build()
            .unwrap();

        let result = fx.run(&exe, &options);
        assert!(matches!(result, Err(EngineError::TimedOut { .. })));
        assert!(!fx.root().join("slow").exists());
    }

    #[test]
    #[serial]
    fn inconsistent_output_is_a_result_error() {
        let fx = Fixture::new();
        let exe = fx.stub("sim", "printf 'id,Vinf\\n0,1\\n' > t_0000m.csv");
        let options = fx.options().name("broken").build().unwrap();

        let result = fx.run(&exe, &options);
        assert!(matches!(
            result,
            Err(EngineError::Results(ResultError::MissingNeighbors { .. }))
        ));
        assert!(!fx.root().join("broken").exists());
    }

    #[test]
    #[serial]
    fn verbose_runs_report_milestones() {
        let fx = Fixture::new();
        let exe = fx.stub("sim", WELL_FORMED_OUTPUT);
        let messages = Mutex::new(Vec::new());
        let reporter = ProgressReporter::with_callback(Box::new(|event| {
            if let Progress::Message(text) = event {
                messages.lock().unwrap().push(text);
            }
        }));

        let verbose = fx.options().name("loud").build().unwrap();
        run(
            &exe,
            &Parameters::default(),
            &fx.protocol,
            &verbose,
            &ReportAnnotator,
            &reporter,
        )
        .unwrap();
        let quiet = fx.options().name("silent").verbose(false).build().unwrap();
        run(
            &exe,
            &Parameters::default(),
            &fx.protocol,
            &quiet,
            &ReportAnnotator,
            &reporter,
        )
        .unwrap();
        drop(reporter);

        let messages = messages.into_inner().unwrap();
        assert_eq!(
            messages,
            vec!["Starting simulation loud", "Finished simulation loud"]
        );
    }
}
