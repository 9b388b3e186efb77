//! # Core Models Module
//!
//! - [`parameters`] - Reaction and transport rates written to `parameters.json`
//! - [`molecule`] - The seven tracked species and their activation thresholds
//! - [`timepoint`] - Exact timepoints and their file-name encoding
//! - [`cell`] - Column schema and one cell's state at one timepoint
//!
//! ```ignore
//! use visavis::core::models::timepoint::Timepoint;
//!
//! let t = Timepoint::from_file_name("t_00-5h.csv", "csv")?;
//! assert_eq!(t.hours(), -5.0);
//! ```

pub mod cell;
pub mod molecule;
pub mod parameters;
pub mod timepoint;
