//! Integration module for the command-line pipeline.
//!
//! This module provides configuration loading and logging setup for running
//! the estimation pipeline from the command line.

pub(crate) mod settings;
pub(crate) mod tracing_setup;
