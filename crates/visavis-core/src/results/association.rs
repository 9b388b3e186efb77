use super::error::ResultError;
use super::store::{Attribute, ResultStore};
use crate::core::models::timepoint::Timepoint;

/// Joint counts of two boolean attributes.
///
/// [`ContingencyTable::statistic`] normalizes by the marginals of `first`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ContingencyTable {
    pub both: u64,
    pub first_only: u64,
    pub second_only: u64,
    pub neither: u64,
}

impl ContingencyTable {
    pub fn record(&mut self, first: bool, second: bool) {
        match (first, second) {
            (true, true) => self.both += 1,
            (true, false) => self.first_only += 1,
            (false, true) => self.second_only += 1,
            (false, false) => self.neither += 1,
        }
    }

    pub fn total(&self) -> u64 {
        self.both + self.first_only + self.second_only + self.neither
    }

    /// `P(second | first) + P(!second | !first) - 1`.
    ///
    /// Lies in `[-1, 1]`; NaN when `first` is never active or never inactive.
    pub fn statistic(&self) -> f64 {
        let first_active = self.both + self.first_only;
        let first_inactive = self.second_only + self.neither;
        if first_active == 0 || first_inactive == 0 {
            return f64::NAN;
        }
        self.both as f64 / first_active as f64 + self.neither as f64 / first_inactive as f64
            - 1.0
    }
}

impl ResultStore {
    pub fn contingency_at_timepoint(
        &self,
        first: &str,
        second: &str,
        timepoint: Timepoint,
    ) -> Result<ContingencyTable, ResultError> {
        let a = Attribute::resolve(self.schema(), first)?;
        let b = Attribute::resolve(self.schema(), second)?;

        let mut table = ContingencyTable::default();
        for record in self.at_timepoint(timepoint).records() {
            table.record(a.truth(record), b.truth(record));
        }
        Ok(table)
    }

    /// Association of two attributes over the cells observed at `hour`.
    pub fn ks_at_hour(&self, first: &str, second: &str, hour: f64) -> Result<f64, ResultError> {
        let Some(timepoint) = Timepoint::from_hours(hour) else {
            Attribute::resolve(self.schema(), first)?;
            Attribute::resolve(self.schema(), second)?;
            return Ok(f64::NAN);
        };
        Ok(self
            .contingency_at_timepoint(first, second, timepoint)?
            .statistic())
    }

    /// Counts `first` of one endpoint against `second` of the other, over
    /// every directed neighbor pair. Each undirected relation therefore
    /// contributes both `(left, right)` and `(right, left)`.
    pub fn neighbor_contingency_at_timepoint(
        &self,
        first: &str,
        second: &str,
        timepoint: Timepoint,
    ) -> Result<ContingencyTable, ResultError> {
        let a = Attribute::resolve(self.schema(), first)?;
        let b = Attribute::resolve(self.schema(), second)?;

        let mut table = ContingencyTable::default();
        for (left, right) in self.neighbors_at_timepoint(timepoint).pairs() {
            table.record(a.truth(left), b.truth(right));
        }
        Ok(table)
    }

    /// Association of two attributes across adjacent cells at `hour`.
    pub fn neighbor_ks_at_hour(
        &self,
        first: &str,
        second: &str,
        hour: f64,
    ) -> Result<f64, ResultError> {
        let Some(timepoint) = Timepoint::from_hours(hour) else {
            Attribute::resolve(self.schema(), first)?;
            Attribute::resolve(self.schema(), second)?;
            return Ok(f64::NAN);
        };
        Ok(self
            .neighbor_contingency_at_timepoint(first, second, timepoint)?
            .statistic())
    }
}
