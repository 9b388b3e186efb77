use super::error::ResultError;
use super::store::{HourView, ResultStore};
use crate::core::models::cell::ALIVE_COLUMN;
use crate::core::models::timepoint::Timepoint;
use serde::Serialize;

pub const IFNE_UPPER_COLUMN: &str = "IFNeU";
pub const IFNE_LOWER_COLUMN: &str = "IFNeL";

/// Living cells of one species, counted per exact level `0..=display_max`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LevelCounts {
    pub molecule: String,
    pub threshold: f64,
    pub counts: Vec<u64>,
}

/// Population overview of one timepoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HourSummary {
    pub hour: f64,
    pub fields: u64,
    pub alive: u64,
    pub dead: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mean_ifne_upper: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mean_ifne_lower: Option<f64>,
    pub levels: Vec<LevelCounts>,
}

fn column_mean(view: &HourView<'_>, column: &str) -> Option<f64> {
    let position = view.schema().position(column)?;
    let finite: Vec<f64> = view
        .records()
        .iter()
        .map(|r| r.value_at(position))
        .filter(|v| v.is_finite())
        .collect();
    if finite.is_empty() {
        return None;
    }
    Some(finite.iter().sum::<f64>() / finite.len() as f64)
}

impl ResultStore {
    pub fn summary_at_timepoint(&self, timepoint: Timepoint) -> Result<HourSummary, ResultError> {
        self.summarize(self.at_timepoint(timepoint), timepoint.hours())
    }

    /// Population overview at `hour`; empty for unobserved hours.
    pub fn summary(&self, hour: f64) -> Result<HourSummary, ResultError> {
        self.summarize(self.at(hour), hour)
    }

    fn summarize(&self, view: HourView<'_>, hour: f64) -> Result<HourSummary, ResultError> {
        let alive_position = self
            .schema()
            .position(ALIVE_COLUMN)
            .ok_or_else(|| ResultError::MissingColumn(ALIVE_COLUMN.to_string()))?;

        let living: Vec<_> = view
            .records()
            .iter()
            .filter(|r| r.value_at(alive_position) > 0.0)
            .collect();

        let levels = self
            .schema()
            .molecules()
            .into_iter()
            .filter_map(|molecule| {
                let position = self.schema().position(molecule.column())?;
                let mut counts = vec![0u64; molecule.display_max() as usize + 1];
                for record in &living {
                    let level = record.value_at(position);
                    if level < 0.0 || level.fract() != 0.0 {
                        continue;
                    }
                    if let Some(slot) = counts.get_mut(level as usize) {
                        *slot += 1;
                    }
                }
                Some(LevelCounts {
                    molecule: molecule.column().to_string(),
                    threshold: molecule.activation_threshold(),
                    counts,
                })
            })
            .collect();

        let fields = view.len() as u64;
        let alive = living.len() as u64;
        Ok(HourSummary {
            hour,
            fields,
            alive,
            dead: fields - alive,
            mean_ifne_upper: column_mean(&view, IFNE_UPPER_COLUMN),
            mean_ifne_lower: column_mean(&view, IFNE_LOWER_COLUMN),
            levels,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::results::store::tests::write_run;

    #[test]
    fn counts_fields_and_levels_of_living_cells() {
        let dir = write_run(&[
            ("neighbors.csv", "left,right\n"),
            (
                "t_1h.csv",
                "id,alive,Vinf,VRNA,IFNeU,IFNeL\n0,1,0,3,2,4\n1,1,1,5,4,4\n2,0,1,3,0,4\n",
            ),
        ]);
        let store = ResultStore::load(dir.path()).unwrap();
        let summary = store.summary(1.0).unwrap();

        assert_eq!(summary.fields, 3);
        assert_eq!(summary.alive, 2);
        assert_eq!(summary.dead, 1);

        let vinf = &summary.levels[0];
        assert_eq!(vinf.molecule, "Vinf");
        assert_eq!(vinf.threshold, 1.0);
        assert_eq!(vinf.counts, vec![1, 1]);

        // level 5 lies beyond the displayed range
        let vrna = &summary.levels[1];
        assert_eq!(vrna.counts, vec![0, 0, 0, 1]);

        assert_eq!(summary.mean_ifne_upper, Some(2.0));
        assert_eq!(summary.mean_ifne_lower, Some(4.0));
    }

    #[test]
    fn missing_extracellular_columns_are_omitted() {
        let dir = write_run(&[
            ("neighbors.csv", "left,right\n"),
            ("t_0h.csv", "id,alive,ISG\n0,1,3\n"),
        ]);
        let store = ResultStore::load(dir.path()).unwrap();
        let summary = store.summary(0.0).unwrap();
        assert!(summary.mean_ifne_upper.is_none());

        let text = toml::to_string(&summary).unwrap();
        assert!(!text.contains("mean_ifne_upper"));
        assert!(text.contains("ISG"));
    }

    #[test]
    fn unobserved_hour_is_empty() {
        let dir = write_run(&[
            ("neighbors.csv", "left,right\n"),
            ("t_0h.csv", "id,alive,Vinf\n0,1,1\n"),
        ]);
        let store = ResultStore::load(dir.path()).unwrap();
        let summary = store.summary(4.0).unwrap();
        assert_eq!(summary.fields, 0);
        assert_eq!(summary.levels[0].counts, vec![0, 0]);
    }
}
