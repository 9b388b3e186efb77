use crate::core::models::timepoint::Timepoint;
use crate::engine::progress::{Progress, ProgressReporter};
use crate::results::error::ResultError;
use crate::results::store::ResultStore;
use crate::results::summary::HourSummary;
#[cfg(feature = "parallel")]
use rayon::prelude::*;
use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

/// Extension of the report written next to each annotated image.
pub const REPORT_EXTENSION: &str = "toml";

#[derive(Debug, Error)]
pub enum AnnotationError {
    #[error(transparent)]
    Results(#[from] ResultError),

    #[error("Failed to encode annotation for {timepoint}: {source}")]
    Encode {
        timepoint: Timepoint,
        source: toml::ser::Error,
    },

    #[error("Failed to write annotation '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Decorates the image the simulator wrote for one timepoint.
///
/// Called concurrently for distinct timepoints; each call must only touch
/// files belonging to its own timepoint.
pub trait Annotator: Sync {
    fn annotate(
        &self,
        store: &ResultStore,
        timepoint: Timepoint,
        image: &Path,
    ) -> Result<(), AnnotationError>;
}

fn annotate_one(
    store: &ResultStore,
    annotator: &dyn Annotator,
    timepoint: Timepoint,
    reporter: &ProgressReporter,
) -> Result<(), AnnotationError> {
    let image = store.image_path(timepoint)?;
    debug!("Annotating {:?} ({})", image, timepoint);
    annotator.annotate(store, timepoint, &image)?;
    reporter.report(Progress::TaskIncrement);
    Ok(())
}

/// Annotates the image of every observed timepoint, one task per timepoint,
/// on the rayon pool (one worker per logical core unless configured
/// otherwise). Returns the number of timepoints handled.
#[instrument(skip_all, name = "annotation_workflow")]
pub fn annotate_all(
    store: &ResultStore,
    annotator: &dyn Annotator,
    reporter: &ProgressReporter,
) -> Result<usize, AnnotationError> {
    let timepoints = store.timepoints();
    reporter.report(Progress::PhaseStart { name: "Annotation" });
    reporter.report(Progress::TaskStart {
        total_steps: timepoints.len() as u64,
    });

    #[cfg(not(feature = "parallel"))]
    let results: Vec<Result<(), AnnotationError>> = timepoints
        .iter()
        .map(|&t| annotate_one(store, annotator, t, reporter))
        .collect();

    #[cfg(feature = "parallel")]
    let results: Vec<Result<(), AnnotationError>> = {
        debug!("Annotating with {} worker(s)", rayon::current_num_threads());
        timepoints
            .par_iter()
            .map(|&t| annotate_one(store, annotator, t, reporter))
            .collect()
    };

    reporter.report(Progress::TaskFinish);
    reporter.report(Progress::PhaseFinish);

    results.into_iter().collect::<Result<Vec<()>, _>>()?;
    info!("Annotated {} timepoint(s).", timepoints.len());
    Ok(timepoints.len())
}

#[derive(Debug, Serialize)]
struct TriangleEntry {
    y: String,
    x: String,
    permille: f64,
}

#[derive(Debug, Serialize)]
struct PairwiseReport {
    active_x: bool,
    active_y: bool,
    cells: Vec<TriangleEntry>,
}

#[derive(Debug, Serialize)]
struct AnnotationReport {
    image: String,
    neighbor_pairs: u64,
    summary: HourSummary,
    pairwise: Vec<PairwiseReport>,
}

/// Writes a `<image-stem>.toml` report beside each image: the hour summary
/// and the lower-triangular pairwise tables for all four activation states.
/// Images that already have a report are left alone.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReportAnnotator;

impl ReportAnnotator {
    pub fn report_path(image: &Path) -> PathBuf {
        image.with_extension(REPORT_EXTENSION)
    }

    fn build(
        store: &ResultStore,
        timepoint: Timepoint,
        image: &Path,
    ) -> Result<AnnotationReport, AnnotationError> {
        let mut pairwise = Vec::with_capacity(4);
        for (active_x, active_y) in [(true, true), (true, false), (false, true), (false, false)] {
            let matrix =
                store.pairwise_activation_matrix_at_timepoint(timepoint, active_x, active_y)?;
            let cells = matrix
                .lower_triangle()
                .into_iter()
                .map(|c| TriangleEntry {
                    y: c.y.column().to_string(),
                    x: c.x.column().to_string(),
                    permille: c.value,
                })
                .collect();
            pairwise.push(PairwiseReport {
                active_x,
                active_y,
                cells,
            });
        }

        Ok(AnnotationReport {
            image: image
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            neighbor_pairs: store.neighbors_at_timepoint(timepoint).len() as u64,
            summary: store.summary_at_timepoint(timepoint)?,
            pairwise,
        })
    }
}

impl Annotator for ReportAnnotator {
    fn annotate(
        &self,
        store: &ResultStore,
        timepoint: Timepoint,
        image: &Path,
    ) -> Result<(), AnnotationError> {
        let path = Self::report_path(image);
        if path.exists() {
            warn!("{:?} is already annotated, skipping.", image);
            return Ok(());
        }

        let report = Self::build(store, timepoint, image)?;
        let text = toml::to_string(&report)
            .map_err(|source| AnnotationError::Encode { timepoint, source })?;
        std::fs::write(&path, text).map_err(|source| AnnotationError::Io { path, source })
    }
}
