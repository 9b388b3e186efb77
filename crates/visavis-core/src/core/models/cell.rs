use super::molecule::Molecule;
use super::timepoint::Timepoint;

/// Name of the entity identifier column in per-timepoint state files.
pub const ID_COLUMN: &str = "id";
/// Name of the liveness column in per-timepoint state files.
pub const ALIVE_COLUMN: &str = "alive";

pub type CellId = u64;

/// Union of the numeric columns seen across all state files of a run,
/// in first-seen order. The identifier column is kept out of `columns`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schema {
    columns: Vec<String>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a column if missing and returns its position.
    pub fn intern(&mut self, name: &str) -> usize {
        match self.position(name) {
            Some(i) => i,
            None => {
                self.columns.push(name.to_string());
                self.columns.len() - 1
            }
        }
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn has_molecule(&self, molecule: Molecule) -> bool {
        self.position(molecule.column()).is_some()
    }

    /// Molecules with a column in this schema, in catalogue order.
    pub fn molecules(&self) -> Vec<Molecule> {
        Molecule::ALL
            .into_iter()
            .filter(|m| self.has_molecule(*m))
            .collect()
    }
}

/// One cell observed at one timepoint.
#[derive(Debug, Clone)]
pub struct CellRecord {
    pub id: CellId,
    pub timepoint: Timepoint,
    values: Vec<f64>,
    activation: [bool; Molecule::COUNT],
}

impl CellRecord {
    /// Builds a record whose `values` are laid out by `schema`, deriving the
    /// activation flags of every molecule the schema carries.
    pub fn new(id: CellId, timepoint: Timepoint, values: Vec<f64>, schema: &Schema) -> Self {
        let mut activation = [false; Molecule::COUNT];
        for molecule in Molecule::ALL {
            if let Some(i) = schema.position(molecule.column()) {
                activation[molecule.index()] =
                    molecule.is_active(values.get(i).copied().unwrap_or(f64::NAN));
            }
        }
        Self {
            id,
            timepoint,
            values,
            activation,
        }
    }

    pub fn hour(&self) -> f64 {
        self.timepoint.hours()
    }

    pub fn value_at(&self, position: usize) -> f64 {
        self.values.get(position).copied().unwrap_or(f64::NAN)
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn is_active(&self, molecule: Molecule) -> bool {
        self.activation[molecule.index()]
    }
}
