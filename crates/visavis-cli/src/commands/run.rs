use crate::cli::RunArgs;
use crate::config::PartialRunConfig;
use crate::error::{CliError, Result};
use crate::utils::progress::CliProgressHandler;
use tracing::{info, warn};
use visavis::{
    engine::progress::ProgressReporter,
    workflows::{self, annotate::ReportAnnotator},
};

pub async fn run(args: RunArgs) -> Result<()> {
    let partial_config = match &args.parameters {
        Some(path) => PartialRunConfig::from_file(path)?,
        None => PartialRunConfig::default(),
    };
    info!("Merging parameters from file and CLI arguments...");
    let config = partial_config.merge_with_cli(&args)?;

    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    println!("Starting simulation...");
    info!("Invoking the simulation workflow...");

    let outcome = tokio::task::block_in_place(|| {
        workflows::simulate::run(
            &args.executable,
            &config.parameters,
            &args.protocol,
            &config.options,
            &ReportAnnotator,
            &reporter,
        )
    })?;

    let Some(store) = outcome else {
        warn!("Simulator exited with a failure status.");
        let name = config
            .options
            .name
            .clone()
            .unwrap_or_else(|| "<generated>".to_string());
        return Err(CliError::SimulationFailed(name));
    };

    let hours: Vec<String> = store.hours().iter().map(|h| format!("{}", h)).collect();
    println!(
        "✓ Simulation finished: {} cell record(s) over {} timepoint(s).",
        store.len(),
        hours.len()
    );
    println!("Hours: {}", hours.join(", "));
    if !config.options.clean_up {
        println!("Workspace kept at: {}", store.directory().display());
    }

    Ok(())
}
