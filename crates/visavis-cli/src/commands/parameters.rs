use crate::cli::ParametersArgs;
use crate::error::{CliError, Result};
use std::path::Path;
use tracing::info;
use visavis::core::models::parameters::Parameters;

pub async fn run(args: ParametersArgs) -> Result<()> {
    let parameters = Parameters::default();
    match &args.output {
        Some(path) => {
            write_defaults(&parameters, path, args.force)?;
            println!("✓ Default parameters written to: {}", path.display());
        }
        None => {
            let value = serde_json::to_value(&parameters).map_err(|e| CliError::Other(e.into()))?;
            let pretty =
                serde_json::to_string_pretty(&value).map_err(|e| CliError::Other(e.into()))?;
            println!("{}", pretty);
        }
    }
    Ok(())
}

fn write_defaults(parameters: &Parameters, path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        return Err(CliError::Argument(format!(
            "'{}' already exists. Use --force to overwrite it.",
            path.display()
        )));
    }
    info!("Writing default parameters to {:?}", path);
    parameters.write_json(path)?;
    Ok(())
}
