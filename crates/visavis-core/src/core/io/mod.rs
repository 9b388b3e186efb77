//! Readers for the tabular files the simulator leaves in its workspace.

pub mod tables;
