use super::error::ResultError;
use super::store::{HourView, ResultStore};
use crate::core::models::cell::{ALIVE_COLUMN, CellRecord};
use crate::core::models::molecule::Molecule;
use crate::core::models::timepoint::Timepoint;
use nalgebra::DMatrix;

const PERMILLE: f64 = 1000.0;

/// One visible cell of the lower-triangular table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TriangleCell {
    pub y: Molecule,
    pub x: Molecule,
    pub value: f64,
}

/// Co-activation counts among living cells: entry `(y, x)` counts cells whose
/// `y` flag equals `active_y` and whose `x` flag equals `active_x`.
#[derive(Debug, Clone, PartialEq)]
pub struct ActivationMatrix {
    molecules: Vec<Molecule>,
    counts: DMatrix<u64>,
    active_x: bool,
    active_y: bool,
    fields: usize,
}

impl ActivationMatrix {
    fn indicator(records: &[&CellRecord], molecules: &[Molecule], state: bool) -> DMatrix<u64> {
        DMatrix::from_fn(records.len(), molecules.len(), |i, j| {
            u64::from(records[i].is_active(molecules[j]) == state)
        })
    }

    pub fn molecules(&self) -> &[Molecule] {
        &self.molecules
    }

    pub fn counts(&self) -> &DMatrix<u64> {
        &self.counts
    }

    pub fn active_x(&self) -> bool {
        self.active_x
    }

    pub fn active_y(&self) -> bool {
        self.active_y
    }

    /// Number of lattice fields (alive or dead) at the timepoint.
    pub fn fields(&self) -> usize {
        self.fields
    }

    pub fn get(&self, y: Molecule, x: Molecule) -> Option<u64> {
        let row = self.molecules.iter().position(|m| *m == y)?;
        let col = self.molecules.iter().position(|m| *m == x)?;
        Some(self.counts[(row, col)])
    }

    /// Counts per thousand lattice fields; NaN when there are no fields.
    pub fn permille(&self) -> DMatrix<f64> {
        let fields = self.fields as f64;
        self.counts.map(|c| {
            if self.fields == 0 {
                f64::NAN
            } else {
                PERMILLE * c as f64 / fields
            }
        })
    }

    /// Permille values of the pairs with `x` before `y` in catalogue order,
    /// row by row from the last molecule upwards.
    pub fn lower_triangle(&self) -> Vec<TriangleCell> {
        let permille = self.permille();
        let n = self.molecules.len();
        let mut cells = Vec::with_capacity(n * n.saturating_sub(1) / 2);
        for row in (1..n).rev() {
            for col in 0..row {
                cells.push(TriangleCell {
                    y: self.molecules[row],
                    x: self.molecules[col],
                    value: permille[(row, col)],
                });
            }
        }
        cells
    }
}

impl ResultStore {
    fn activation_matrix(
        &self,
        view: HourView<'_>,
        active_x: bool,
        active_y: bool,
    ) -> Result<ActivationMatrix, ResultError> {
        let alive = self
            .schema()
            .position(ALIVE_COLUMN)
            .ok_or_else(|| ResultError::MissingColumn(ALIVE_COLUMN.to_string()))?;
        let living: Vec<&CellRecord> = view
            .records()
            .iter()
            .filter(|r| r.value_at(alive) > 0.0)
            .collect();

        let molecules = self.schema().molecules();
        let x = ActivationMatrix::indicator(&living, &molecules, active_x);
        let y = ActivationMatrix::indicator(&living, &molecules, active_y);

        Ok(ActivationMatrix {
            counts: y.transpose() * x,
            molecules,
            active_x,
            active_y,
            fields: view.len(),
        })
    }

    pub fn pairwise_activation_matrix_at_timepoint(
        &self,
        timepoint: Timepoint,
        active_x: bool,
        active_y: bool,
    ) -> Result<ActivationMatrix, ResultError> {
        self.activation_matrix(self.at_timepoint(timepoint), active_x, active_y)
    }

    /// Pairwise co-activation counts among living cells at `hour`.
    /// Unobserved hours give an all-zero matrix over zero fields.
    pub fn pairwise_activation_matrix(
        &self,
        hour: f64,
        active_x: bool,
        active_y: bool,
    ) -> Result<ActivationMatrix, ResultError> {
        self.activation_matrix(self.at(hour), active_x, active_y)
    }
}
