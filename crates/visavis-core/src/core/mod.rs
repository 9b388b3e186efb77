//! # Core Module
//!
//! Stateless building blocks shared by the rest of the library.
//!
//! - **Models** ([`models`]) - Simulation parameters, the tracked molecular species,
//!   timepoints and per-cell records
//! - **File I/O** ([`io`]) - Readers for the simulator's CSV output

pub mod io;
pub mod models;
