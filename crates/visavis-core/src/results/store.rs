use super::error::ResultError;
use crate::core::io::tables::{self, NeighborRelation, StateTable};
use crate::core::models::cell::{CellId, CellRecord, Schema};
use crate::core::models::molecule::Molecule;
use crate::core::models::timepoint::{TIMEPOINT_FILE_PREFIX, Timepoint};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::{debug, info, instrument};

pub const NEIGHBORS_FILE_NAME: &str = "neighbors.csv";
pub const STATES_EXTENSION: &str = "csv";
pub const IMAGE_EXTENSION: &str = "png";

const LEFT_SUFFIX: &str = "_left";
const RIGHT_SUFFIX: &str = "_right";

/// A named per-cell quantity usable as a boolean input of the association engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attribute {
    /// Derived flag `<molecule>_act`.
    Activation(Molecule),
    /// Raw numeric column, by schema position; true when strictly positive.
    Level(usize),
}

impl Attribute {
    pub fn resolve(schema: &Schema, name: &str) -> Result<Self, ResultError> {
        if let Some(molecule) = Molecule::from_flag_name(name) {
            if schema.has_molecule(molecule) {
                return Ok(Attribute::Activation(molecule));
            }
        } else if let Some(position) = schema.position(name) {
            return Ok(Attribute::Level(position));
        }
        Err(ResultError::MissingColumn(name.to_string()))
    }

    pub fn truth(self, record: &CellRecord) -> bool {
        match self {
            Attribute::Activation(m) => record.is_active(m),
            Attribute::Level(i) => record.value_at(i) > 0.0,
        }
    }

    pub fn value(self, record: &CellRecord) -> f64 {
        match self {
            Attribute::Activation(m) => f64::from(u8::from(record.is_active(m))),
            Attribute::Level(i) => record.value_at(i),
        }
    }
}

/// All cells of one timepoint. Empty when the timepoint was never observed.
#[derive(Debug, Clone, Copy)]
pub struct HourView<'a> {
    schema: &'a Schema,
    records: &'a [CellRecord],
}

impl<'a> HourView<'a> {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &'a [CellRecord] {
        self.records
    }

    pub fn schema(&self) -> &'a Schema {
        self.schema
    }

    pub fn ids(&self) -> Vec<CellId> {
        self.records.iter().map(|r| r.id).collect()
    }

    pub fn values(&self, name: &str) -> Result<Vec<f64>, ResultError> {
        let attribute = Attribute::resolve(self.schema, name)?;
        Ok(self.records.iter().map(|r| attribute.value(r)).collect())
    }

    pub fn flags(&self, name: &str) -> Result<Vec<bool>, ResultError> {
        let attribute = Attribute::resolve(self.schema, name)?;
        Ok(self.records.iter().map(|r| attribute.truth(r)).collect())
    }
}

/// Directed neighbor pairs at one timepoint: every undirected relation whose
/// endpoints are both observed contributes `(left, right)` and `(right, left)`.
#[derive(Debug, Clone)]
pub struct NeighborView<'a> {
    schema: &'a Schema,
    pairs: Vec<(&'a CellRecord, &'a CellRecord)>,
}

impl<'a> NeighborView<'a> {
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn pairs(&self) -> &[(&'a CellRecord, &'a CellRecord)] {
        &self.pairs
    }

    /// Resolves `<attribute>_left` or `<attribute>_right`.
    fn resolve_side(&self, name: &str) -> Result<(Attribute, bool), ResultError> {
        let (base, is_left) = if let Some(base) = name.strip_suffix(LEFT_SUFFIX) {
            (base, true)
        } else if let Some(base) = name.strip_suffix(RIGHT_SUFFIX) {
            (base, false)
        } else {
            return Err(ResultError::MissingColumn(name.to_string()));
        };
        Ok((Attribute::resolve(self.schema, base)?, is_left))
    }

    pub fn values(&self, name: &str) -> Result<Vec<f64>, ResultError> {
        let (attribute, is_left) = self.resolve_side(name)?;
        Ok(self
            .pairs
            .iter()
            .map(|(l, r)| attribute.value(if is_left { l } else { r }))
            .collect())
    }

    pub fn flags(&self, name: &str) -> Result<Vec<bool>, ResultError> {
        let (attribute, is_left) = self.resolve_side(name)?;
        Ok(self
            .pairs
            .iter()
            .map(|(l, r)| attribute.truth(if is_left { l } else { r }))
            .collect())
    }
}

/// The aggregated output of one successful simulation run.
#[derive(Debug, Clone)]
pub struct ResultStore {
    directory: PathBuf,
    schema: Schema,
    neighbors: Vec<NeighborRelation>,
    states: BTreeMap<Timepoint, Vec<CellRecord>>,
    images: OnceLock<HashMap<Timepoint, PathBuf>>,
}

fn io_error(path: &Path, source: std::io::Error) -> ResultError {
    ResultError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Lists files named `t_*.<extension>` (or `*.<extension>` when `prefixed`
/// is false) with their decoded timepoints, ordered by time then name.
fn encoded_files(
    directory: &Path,
    extension: &str,
    prefixed: bool,
) -> Result<Vec<(Timepoint, PathBuf)>, ResultError> {
    let mut found = Vec::new();
    let entries = std::fs::read_dir(directory).map_err(|e| io_error(directory, e))?;
    for entry in entries {
        let entry = entry.map_err(|e| io_error(directory, e))?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if prefixed && !name.starts_with(TIMEPOINT_FILE_PREFIX) {
            continue;
        }
        if path.extension().and_then(|e| e.to_str()) != Some(extension) {
            continue;
        }
        let timepoint = Timepoint::from_file_name(name, extension).map_err(|source| {
            ResultError::MalformedTimepoint {
                file: name.to_string(),
                source,
            }
        })?;
        found.push((timepoint, path));
    }
    found.sort();
    Ok(found)
}

impl ResultStore {
    /// Loads a finished run's directory into memory.
    #[instrument(skip_all, name = "result_store_load")]
    pub fn load(directory: impl AsRef<Path>) -> Result<Self, ResultError> {
        let directory = directory.as_ref();
        if !directory.is_dir() {
            return Err(ResultError::MissingDirectory {
                path: directory.to_path_buf(),
            });
        }

        let neighbors_path = directory.join(NEIGHBORS_FILE_NAME);
        if !neighbors_path.is_file() {
            return Err(ResultError::MissingNeighbors {
                path: neighbors_path,
            });
        }
        let neighbors = tables::read_neighbors(&neighbors_path)?;

        let state_files = encoded_files(directory, STATES_EXTENSION, true)?;
        if state_files.is_empty() {
            return Err(ResultError::NoStateFiles {
                path: directory.to_path_buf(),
            });
        }

        let mut parts: Vec<(Timepoint, StateTable)> = Vec::with_capacity(state_files.len());
        for (timepoint, path) in &state_files {
            debug!("Loading states at {} from {:?}", timepoint, path);
            parts.push((*timepoint, tables::read_states(path)?));
        }

        let (schema, states) = Self::merge(parts)?;
        info!(
            "Loaded {} timepoint(s), {} cell record(s), {} neighbor relation(s) from {:?}",
            states.len(),
            states.values().map(Vec::len).sum::<usize>(),
            neighbors.len(),
            directory
        );

        Ok(Self {
            directory: directory.to_path_buf(),
            schema,
            neighbors,
            states,
            images: OnceLock::new(),
        })
    }

    fn merge(
        parts: Vec<(Timepoint, StateTable)>,
    ) -> Result<(Schema, BTreeMap<Timepoint, Vec<CellRecord>>), ResultError> {
        let mut schema = Schema::new();
        let layouts: Vec<Vec<usize>> = parts
            .iter()
            .map(|(_, table)| table.columns.iter().map(|c| schema.intern(c)).collect())
            .collect();

        let mut seen = HashSet::new();
        let mut states: BTreeMap<Timepoint, Vec<CellRecord>> = BTreeMap::new();
        for ((timepoint, table), layout) in parts.into_iter().zip(layouts) {
            for (id, raw) in table.rows {
                if !seen.insert((id, timepoint)) {
                    return Err(ResultError::DuplicateRecord { id, timepoint });
                }
                let mut values = vec![f64::NAN; schema.len()];
                for (value, &position) in raw.into_iter().zip(&layout) {
                    values[position] = value;
                }
                states
                    .entry(timepoint)
                    .or_default()
                    .push(CellRecord::new(id, timepoint, values, &schema));
            }
        }
        Ok((schema, states))
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn neighbors(&self) -> &[NeighborRelation] {
        &self.neighbors
    }

    /// Every record of the run, ordered by timepoint then file order.
    pub fn states(&self) -> impl Iterator<Item = &CellRecord> {
        self.states.values().flatten()
    }

    pub fn len(&self) -> usize {
        self.states.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Observed timepoints, ascending and unique.
    pub fn timepoints(&self) -> Vec<Timepoint> {
        self.states.keys().copied().collect()
    }

    /// Observed timepoints in hours, ascending and unique.
    pub fn hours(&self) -> Vec<f64> {
        self.states.keys().map(|t| t.hours()).collect()
    }

    pub fn at_timepoint(&self, timepoint: Timepoint) -> HourView<'_> {
        HourView {
            schema: &self.schema,
            records: self
                .states
                .get(&timepoint)
                .map(Vec::as_slice)
                .unwrap_or_default(),
        }
    }

    /// Records observed exactly at `hour`; no interpolation.
    pub fn at(&self, hour: f64) -> HourView<'_> {
        match Timepoint::from_hours(hour) {
            Some(timepoint) => self.at_timepoint(timepoint),
            None => HourView {
                schema: &self.schema,
                records: &[],
            },
        }
    }

    pub fn neighbors_at_timepoint(&self, timepoint: Timepoint) -> NeighborView<'_> {
        let view = self.at_timepoint(timepoint);
        let by_id: HashMap<CellId, &CellRecord> =
            view.records().iter().map(|r| (r.id, r)).collect();

        let joined: Vec<(&CellRecord, &CellRecord)> = self
            .neighbors
            .iter()
            .filter_map(|rel| Some((*by_id.get(&rel.left)?, *by_id.get(&rel.right)?)))
            .collect();

        let mut pairs = Vec::with_capacity(joined.len() * 2);
        pairs.extend(joined.iter().copied());
        pairs.extend(joined.iter().map(|&(l, r)| (r, l)));

        NeighborView {
            schema: &self.schema,
            pairs,
        }
    }

    pub fn neighbors_at(&self, hour: f64) -> NeighborView<'_> {
        match Timepoint::from_hours(hour) {
            Some(timepoint) => self.neighbors_at_timepoint(timepoint),
            None => NeighborView {
                schema: &self.schema,
                pairs: Vec::new(),
            },
        }
    }

    /// Image written by the simulator for `timepoint`. The directory is
    /// scanned once per store and the index reused afterwards.
    pub fn image_path(&self, timepoint: Timepoint) -> Result<PathBuf, ResultError> {
        let index = match self.images.get() {
            Some(index) => index,
            None => {
                let scanned: HashMap<Timepoint, PathBuf> =
                    encoded_files(&self.directory, IMAGE_EXTENSION, false)?
                        .into_iter()
                        .collect();
                debug!("Indexed {} image(s) in {:?}", scanned.len(), self.directory);
                self.images.get_or_init(|| scanned)
            }
        };
        index
            .get(&timepoint)
            .filter(|path| path.exists())
            .cloned()
            .ok_or_else(|| ResultError::MissingImage {
                timepoint,
                directory: self.directory.clone(),
            })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::fs;
    use tempfile::{TempDir, tempdir};

    pub(crate) fn write_run(files: &[(&str, &str)]) -> TempDir {
        let dir = tempdir().unwrap();
        for (name, content) in files {
            fs::write(dir.path().join(name), content).unwrap();
        }
        dir
    }

    fn standard_run() -> TempDir {
        write_run(&[
            ("neighbors.csv", "left,right\n0,1\n1,2\n"),
            ("t_0000h.csv", "id,alive,Vinf,VRNA\n0,1,0,0\n1,1,2,3\n2,0,1,1\n"),
            ("t_0001h.csv", "id,alive,Vinf,VRNA\n0,1,1,4\n1,1,2,3\n"),
            ("t_00-5h.csv", "id,alive,Vinf,VRNA\n0,1,0,0\n"),
            ("t_30m.csv", "id,alive,Vinf,VRNA\n0,1,0,0\n"),
        ])
    }

    #[test]
    fn load_fails_for_missing_directory() {
        let dir = tempdir().unwrap();
        let result = ResultStore::load(dir.path().join("gone"));
        assert!(matches!(result, Err(ResultError::MissingDirectory { .. })));
    }

    #[test]
    fn load_fails_without_neighbor_file() {
        let dir = write_run(&[("t_0h.csv", "id,Vinf\n0,1\n")]);
        let result = ResultStore::load(dir.path());
        assert!(matches!(result, Err(ResultError::MissingNeighbors { .. })));
    }

    #[test]
    fn load_fails_without_state_files() {
        let dir = write_run(&[("neighbors.csv", "left,right\n"), ("other.csv", "id\n1\n")]);
        let result = ResultStore::load(dir.path());
        assert!(matches!(result, Err(ResultError::NoStateFiles { .. })));
    }

    #[test]
    fn load_fails_for_malformed_timepoint_name() {
        let dir = write_run(&[("neighbors.csv", "left,right\n"), ("t_soon.csv", "id\n1\n")]);
        let result = ResultStore::load(dir.path());
        assert!(matches!(result, Err(ResultError::MalformedTimepoint { .. })));
    }

    #[test]
    fn load_rejects_duplicate_cell_timepoints() {
        let dir = write_run(&[
            ("neighbors.csv", "left,right\n"),
            ("t_1h.csv", "id,Vinf\n0,1\n"),
            ("t_60m.csv", "id,Vinf\n0,1\n"),
        ]);
        let result = ResultStore::load(dir.path());
        assert!(matches!(
            result,
            Err(ResultError::DuplicateRecord { id: 0, .. })
        ));
    }

    #[test]
    fn hours_are_sorted_unique_and_decoded() {
        let dir = standard_run();
        let store = ResultStore::load(dir.path()).unwrap();
        assert_eq!(store.hours(), vec![-5.0, 0.0, 0.5, 1.0]);
        assert_eq!(store.len(), 7);
        assert_eq!(store.neighbors().len(), 2);
    }

    #[test]
    fn at_returns_exact_hour_only() {
        let dir = standard_run();
        let store = ResultStore::load(dir.path()).unwrap();
        let view = store.at(0.0);
        assert_eq!(view.ids(), vec![0, 1, 2]);
        assert_eq!(view.flags("Vinf_act").unwrap(), vec![false, true, true]);
        assert_eq!(view.flags("VRNA_act").unwrap(), vec![false, true, false]);
        assert_eq!(store.at(0.5).len(), 1);
        assert!(store.at(0.25).is_empty());
        assert!(store.at(42.0).is_empty());
    }

    fn minute_encoded_run() -> TempDir {
        write_run(&[
            ("neighbors.csv", "left,right\n0,1\n"),
            ("t_0000m.csv", "id,alive,Vinf\n0,1,0\n1,1,1\n"),
            ("t_0031m.csv", "id,alive,Vinf\n0,1,1\n1,1,1\n"),
            ("t_0125m.csv", "id,alive,Vinf\n0,1,1\n1,0,1\n"),
            ("t_0490m.csv", "id,alive,Vinf\n0,0,1\n1,1,0\n"),
            ("t_0965m.csv", "id,alive,Vinf\n0,1,0\n1,1,0\n"),
            ("t_0-62m.csv", "id,alive,Vinf\n0,1,0\n1,1,0\n"),
        ])
    }

    #[test]
    fn every_reported_hour_resolves_for_minute_encoded_files() {
        let dir = minute_encoded_run();
        let store = ResultStore::load(dir.path()).unwrap();
        assert_eq!(store.hours().len(), 6);

        for hour in store.hours() {
            assert_eq!(store.at(hour).len(), 2, "cells at {}h", hour);
            assert_eq!(store.neighbors_at(hour).len(), 2, "pairs at {}h", hour);
            assert_eq!(store.summary(hour).unwrap().fields, 2, "summary at {}h", hour);
        }

        let hour = Timepoint::from_minutes(490).hours();
        assert_eq!(store.at(hour).flags("Vinf_act").unwrap(), vec![true, false]);
        assert_eq!(store.ks_at_hour("Vinf_act", "alive", hour).unwrap(), -1.0);
        assert_eq!(store.hours()[0], Timepoint::from_minutes(-62).hours());
    }

    #[test]
    fn unknown_attribute_is_reported() {
        let dir = standard_run();
        let store = ResultStore::load(dir.path()).unwrap();
        assert!(matches!(
            store.at(0.0).flags("ISG_act"),
            Err(ResultError::MissingColumn(_))
        ));
        assert!(matches!(
            store.at(0.0).values("nope"),
            Err(ResultError::MissingColumn(_))
        ));
    }

    #[test]
    fn numeric_columns_are_preserved() {
        let dir = standard_run();
        let store = ResultStore::load(dir.path()).unwrap();
        assert_eq!(store.schema().columns(), &["alive", "Vinf", "VRNA"]);
        assert_eq!(store.at(0.0).values("alive").unwrap(), vec![1.0, 1.0, 0.0]);
        assert_eq!(store.at(1.0).values("VRNA").unwrap(), vec![4.0, 3.0]);
    }

    #[test]
    fn differing_headers_are_unioned() {
        let dir = write_run(&[
            ("neighbors.csv", "left,right\n"),
            ("t_0h.csv", "id,Vinf\n0,1\n"),
            ("t_1h.csv", "id,ISG\n0,5\n"),
        ]);
        let store = ResultStore::load(dir.path()).unwrap();
        assert_eq!(store.schema().columns(), &["Vinf", "ISG"]);
        assert!(store.at(0.0).values("ISG").unwrap()[0].is_nan());
        assert_eq!(store.at(1.0).flags("ISG_act").unwrap(), vec![true]);
        assert_eq!(store.at(1.0).flags("Vinf_act").unwrap(), vec![false]);
    }

    #[test]
    fn neighbors_at_materializes_both_directions() {
        let dir = standard_run();
        let store = ResultStore::load(dir.path()).unwrap();

        let view = store.neighbors_at(0.0);
        assert_eq!(view.len(), 2 * store.neighbors().len());
        let ids: Vec<(CellId, CellId)> = view.pairs().iter().map(|(l, r)| (l.id, r.id)).collect();
        assert_eq!(ids, vec![(0, 1), (1, 2), (1, 0), (2, 1)]);
        assert_eq!(
            view.values("Vinf_left").unwrap(),
            vec![0.0, 2.0, 2.0, 1.0]
        );
        assert_eq!(
            view.flags("Vinf_act_right").unwrap(),
            vec![true, true, false, true]
        );
        assert!(view.values("Vinf").is_err());
    }

    #[test]
    fn neighbors_at_drops_relations_with_unobserved_endpoints() {
        let dir = standard_run();
        let store = ResultStore::load(dir.path()).unwrap();
        let view = store.neighbors_at(1.0);
        let ids: Vec<(CellId, CellId)> = view.pairs().iter().map(|(l, r)| (l.id, r.id)).collect();
        assert_eq!(ids, vec![(0, 1), (1, 0)]);
        assert!(store.neighbors_at(7.0).is_empty());
    }

    #[test]
    fn loading_twice_yields_identical_tables() {
        let dir = standard_run();
        let a = ResultStore::load(dir.path()).unwrap();
        let b = ResultStore::load(dir.path()).unwrap();

        assert_eq!(a.schema(), b.schema());
        assert_eq!(a.neighbors(), b.neighbors());
        assert_eq!(a.len(), b.len());
        for (ra, rb) in a.states().zip(b.states()) {
            assert_eq!(ra.id, rb.id);
            assert_eq!(ra.timepoint, rb.timepoint);
            let bits_a: Vec<u64> = ra.values().iter().map(|v| v.to_bits()).collect();
            let bits_b: Vec<u64> = rb.values().iter().map(|v| v.to_bits()).collect();
            assert_eq!(bits_a, bits_b);
            for m in Molecule::ALL {
                assert_eq!(ra.is_active(m), rb.is_active(m));
            }
        }
    }

    #[test]
    fn image_lookup_uses_filename_encoding() {
        let dir = standard_run();
        fs::write(dir.path().join("t_0001h.png"), b"png").unwrap();
        let store = ResultStore::load(dir.path()).unwrap();

        let path = store.image_path(Timepoint::from_whole_hours(1)).unwrap();
        assert_eq!(path.file_name().unwrap(), "t_0001h.png");
        assert!(matches!(
            store.image_path(Timepoint::from_whole_hours(0)),
            Err(ResultError::MissingImage { .. })
        ));
    }

    #[test]
    fn image_index_is_scoped_to_each_store() {
        let first = standard_run();
        let second = standard_run();
        fs::write(first.path().join("t_0000h.png"), b"png").unwrap();

        let a = ResultStore::load(first.path()).unwrap();
        let b = ResultStore::load(second.path()).unwrap();
        assert!(a.image_path(Timepoint::default()).is_ok());
        assert!(b.image_path(Timepoint::default()).is_err());
    }
}
