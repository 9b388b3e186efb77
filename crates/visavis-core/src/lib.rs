//! # VIS-A-VIS Core Library
//!
//! Drives the VIS-A-VIS stochastic cell-signaling simulator and analyzes what it
//! leaves behind: per-timepoint cell states on a lattice, their activation
//! flags, and association statistics between cells and their neighbors.
//!
//! ## Architecture
//!
//! - **[`core`]: The Foundation.** Stateless data: typed simulation parameters,
//!   the molecule catalogue with activation thresholds, timepoint encoding, and
//!   readers for the simulator's CSV output.
//!
//! - **[`engine`]: Run Orchestration.** Run options, per-run workspaces, the
//!   simulator subprocess with an optional deadline, progress events, and the
//!   error taxonomy of a run.
//!
//! - **[`results`]: Analysis.** The [`ResultStore`](results::ResultStore) that
//!   unions a finished run into one time-indexed dataset, and the association
//!   statistics, pairwise activation matrices and hour summaries computed on it.
//!
//! - **[`workflows`]: The Public API.** [`simulate::run`](workflows::simulate::run)
//!   takes parameters and a protocol to a loaded result store;
//!   [`annotate`](workflows::annotate) post-processes the run's images in parallel.

pub mod core;
pub mod engine;
pub mod results;
pub mod workflows;
