use crate::cli::RunArgs;
use crate::error::{CliError, Result};
use crate::utils::parser;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;
use visavis::core::models::parameters::Parameters;
use visavis::engine::config::{RunOptions, RunOptionsBuilder};

const PARAMETERS_PREFIX: &str = "parameters.";

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
struct PartialRunSection {
    images: Option<bool>,
    annotate: Option<bool>,
    keep: Option<bool>,
    name: Option<String>,
    root: Option<PathBuf>,
    #[serde(rename = "timeout-secs")]
    timeout_secs: Option<f64>,
}

/// A parameter file as written by the user: `[parameters]` and `[run]` tables
/// in TOML, or a flat `parameters.json`-style object in JSON.
#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
pub struct PartialRunConfig {
    parameters: Option<BTreeMap<String, f64>>,
    run: Option<PartialRunSection>,
}

/// Everything `visavis run` needs besides the executable and protocol paths.
#[derive(Debug)]
pub struct RunConfig {
    pub parameters: Parameters,
    pub options: RunOptions,
}

fn parse_error(path: &Path, source: impl Into<anyhow::Error>) -> CliError {
    CliError::FileParsing {
        path: path.to_path_buf(),
        source: source.into(),
    }
}

fn parse_seconds(key: &str, value: f64) -> Result<Duration> {
    Duration::try_from_secs_f64(value)
        .map_err(|e| CliError::Config(format!("Invalid duration for {}: {} ({})", key, value, e)))
}

impl PartialRunConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading run configuration from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        let is_json = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("json"));

        if is_json {
            let parameters: BTreeMap<String, f64> =
                serde_json::from_str(&content).map_err(|e| parse_error(path, e))?;
            Ok(Self {
                parameters: Some(parameters),
                run: None,
            })
        } else {
            toml::from_str(&content).map_err(|e| parse_error(path, e))
        }
    }

    pub fn merge_with_cli(mut self, args: &RunArgs) -> Result<RunConfig> {
        self.apply_set_values(&args.set_values)?;

        let mut parameters = Parameters::default();
        for (key, value) in self.parameters.take().unwrap_or_default() {
            parameters
                .set(&key, value)
                .map_err(|e| CliError::Config(e.to_string()))?;
        }
        parameters.validate()?;

        let run = self.run.take().unwrap_or_default();
        let mut builder = RunOptionsBuilder::new()
            .images(args.images || run.images.unwrap_or(false))
            .annotate(args.annotate || run.annotate.unwrap_or(false))
            .clean_up(!(args.keep || run.keep.unwrap_or(false)));

        if let Some(name) = args.name.clone().or(run.name) {
            builder = builder.name(name);
        }
        if let Some(root) = args.root.clone().or(run.root) {
            builder = builder.root(root);
        }
        if let Some(secs) = args.timeout.or(run.timeout_secs) {
            builder = builder.timeout(parse_seconds("timeout", secs)?);
        }

        let options = builder
            .build()
            .map_err(|e| CliError::Config(e.to_string()))?;
        if options.annotate && options.clean_up {
            return Err(CliError::Config(
                "Annotation needs the workspace to be kept (--keep).".to_string(),
            ));
        }

        Ok(RunConfig {
            parameters,
            options,
        })
    }

    fn apply_set_values(&mut self, set_values: &[String]) -> Result<()> {
        for kv_pair in set_values {
            let (key, value_str) =
                parser::parse_assignment(kv_pair).map_err(|e| CliError::Config(e.to_string()))?;

            let parse_float = || {
                value_str.parse::<f64>().map_err(|_| {
                    CliError::Config(format!("Invalid float value for {}: {}", key, value_str))
                })
            };
            let parse_bool = || {
                value_str.parse::<bool>().map_err(|_| {
                    CliError::Config(format!("Invalid boolean value for {}: {}", key, value_str))
                })
            };

            match key {
                "run.images" => {
                    self.run.get_or_insert_with(Default::default).images = Some(parse_bool()?);
                }
                "run.annotate" => {
                    self.run.get_or_insert_with(Default::default).annotate = Some(parse_bool()?);
                }
                "run.keep" => {
                    self.run.get_or_insert_with(Default::default).keep = Some(parse_bool()?);
                }
                "run.name" => {
                    self.run.get_or_insert_with(Default::default).name =
                        Some(value_str.to_string());
                }
                "run.root" => {
                    self.run.get_or_insert_with(Default::default).root =
                        Some(PathBuf::from(value_str));
                }
                "run.timeout-secs" => {
                    self.run.get_or_insert_with(Default::default).timeout_secs =
                        Some(parse_float()?);
                }
                _ => {
                    let name = key.strip_prefix(PARAMETERS_PREFIX).unwrap_or(key);
                    if Parameters::default().get(name).is_none() {
                        return Err(CliError::Config(format!(
                            "Unsupported configuration key for --set: '{}'",
                            key
                        )));
                    }
                    self.parameters
                        .get_or_insert_with(Default::default)
                        .insert(name.to_string(), parse_float()?);
                }
            }
        }
        Ok(())
    }
}
