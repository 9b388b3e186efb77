pub mod association;
pub mod error;
pub mod pairwise;
pub mod store;
pub mod summary;

pub use association::ContingencyTable;
pub use error::ResultError;
pub use pairwise::{ActivationMatrix, TriangleCell};
pub use store::{Attribute, HourView, NeighborView, ResultStore};
pub use summary::{HourSummary, LevelCounts};
