//! # Workflows Module
//!
//! User-facing entry points that tie the `engine` and `results` layers together.
//!
//! - **Simulation** ([`simulate`]) - Runs the simulator in a fresh workspace and
//!   loads its output into a [`ResultStore`](crate::results::ResultStore).
//! - **Annotation** ([`annotate`]) - Hands every output image to an
//!   [`Annotator`](annotate::Annotator), in parallel across timepoints.

pub mod annotate;
pub mod simulate;
