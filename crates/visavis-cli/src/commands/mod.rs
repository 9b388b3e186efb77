pub mod analyze;
pub mod parameters;
pub mod run;
