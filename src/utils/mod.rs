//! Utility modules shared by the pipeline stages
//!
//! - `arrow`: helpers for the string columns of CSV-backed record batches
//! - `io`: CSV table reading and writing, path checks, side files
//! - `logging`: operation logging and progress bars

pub mod arrow;
pub mod io;
pub mod logging;
