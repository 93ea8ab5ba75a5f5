//! Command-line front end for the conversion pipeline.

pub mod commands;
pub mod logging;
pub mod summary;
