use crate::cli::AnalyzeArgs;
use crate::error::{CliError, Result};
use crate::utils::parser;
use std::fmt::{self, Write};
use tracing::info;
use visavis::results::{ActivationMatrix, HourSummary, ResultStore};

const STATE_COMBINATIONS: [(bool, bool); 4] =
    [(true, true), (true, false), (false, true), (false, false)];

pub async fn run(args: AnalyzeArgs) -> Result<()> {
    let ks_pairs = parse_pairs(&args.ks)?;
    let neighbor_pairs = parse_pairs(&args.neighbor_ks)?;

    info!("Loading results from {:?}", &args.directory);
    let store = tokio::task::block_in_place(|| ResultStore::load(&args.directory))?;

    let hours = match args.hour {
        Some(hour) => vec![hour],
        None => store.hours(),
    };
    if hours.is_empty() {
        println!("No timepoints observed in {}", args.directory.display());
        return Ok(());
    }

    let report = render_report(
        &store,
        &hours,
        &ks_pairs,
        &neighbor_pairs,
        args.pairwise,
        args.summary,
    )?;
    print!("{}", report);
    Ok(())
}

fn parse_pairs(texts: &[String]) -> Result<Vec<(String, String)>> {
    texts
        .iter()
        .map(|text| {
            parser::parse_attribute_pair(text)
                .map(|(a, b)| (a.to_string(), b.to_string()))
                .map_err(|e| CliError::Argument(e.to_string()))
        })
        .collect()
}

fn format_statistic(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else {
        format!("{:+.4}", value)
    }
}

fn render_report(
    store: &ResultStore,
    hours: &[f64],
    ks_pairs: &[(String, String)],
    neighbor_pairs: &[(String, String)],
    pairwise: bool,
    summary: bool,
) -> Result<String> {
    let mut out = String::new();
    let bare = ks_pairs.is_empty() && neighbor_pairs.is_empty() && !pairwise && !summary;

    for &hour in hours {
        writeln!(out, "t = {}h", hour)?;
        if bare {
            writeln!(
                out,
                "  {} cell(s), {} directed neighbor pair(s)",
                store.at(hour).len(),
                store.neighbors_at(hour).len()
            )?;
        }
        for (a, b) in ks_pairs {
            let value = store.ks_at_hour(a, b, hour)?;
            writeln!(out, "  ks({}, {}) = {}", a, b, format_statistic(value))?;
        }
        for (a, b) in neighbor_pairs {
            let value = store.neighbor_ks_at_hour(a, b, hour)?;
            writeln!(
                out,
                "  neighbor_ks({}, {}) = {}",
                a,
                b,
                format_statistic(value)
            )?;
        }
        if summary {
            render_summary(&mut out, &store.summary(hour)?)?;
        }
        if pairwise {
            for (active_x, active_y) in STATE_COMBINATIONS {
                let matrix = store.pairwise_activation_matrix(hour, active_x, active_y)?;
                render_matrix(&mut out, &matrix)?;
            }
        }
    }
    Ok(out)
}

fn render_summary(out: &mut String, summary: &HourSummary) -> fmt::Result {
    let permille = |count: u64| {
        if summary.fields == 0 {
            f64::NAN
        } else {
            1000.0 * count as f64 / summary.fields as f64
        }
    };

    for levels in &summary.levels {
        for (level, &count) in levels.counts.iter().enumerate() {
            let marker = if level as f64 >= levels.threshold { "*" } else { " " };
            writeln!(
                out,
                "  {}{:<6} {}: {:>5.0} ({})",
                marker,
                levels.molecule,
                level,
                permille(count),
                count
            )?;
        }
    }
    writeln!(out, "   fields: {}", summary.fields)?;
    writeln!(out, "   dead: {:.0} ({})", permille(summary.dead), summary.dead)?;
    if let Some(mean) = summary.mean_ifne_upper {
        writeln!(out, "   IFNeU/node: {:.0}", mean)?;
    }
    if let Some(mean) = summary.mean_ifne_lower {
        writeln!(out, "   IFNeL/node: {:.0}", mean)?;
    }
    Ok(())
}

fn render_matrix(out: &mut String, matrix: &ActivationMatrix) -> fmt::Result {
    let state = |active: bool| if active { "active" } else { "inactive" };
    writeln!(
        out,
        "  y {} / x {} (permille of {} field(s))",
        state(matrix.active_y()),
        state(matrix.active_x()),
        matrix.fields()
    )?;
    for cell in matrix.lower_triangle() {
        writeln!(out, "    {:<6} {:<6} {:>6.1}", cell.y, cell.x, cell.value)?;
    }
    Ok(())
}
