//! # Engine Module
//!
//! The stateful side of a simulation run: everything between validated inputs
//! and the simulator's exit status.
//!
//! - **Configuration** ([`config`]) - Run options and their builder
//! - **Workspaces** ([`workspace`]) - Per-run directories, staged inputs and clean-up
//! - **Process Control** ([`process`]) - Invoking the simulator, with an optional deadline
//! - **Progress Monitoring** ([`progress`]) - Phase and task events for front-ends
//! - **Error Handling** ([`error`]) - The orchestration error taxonomy

pub mod config;
pub mod error;
pub mod process;
pub mod progress;
pub mod workspace;
