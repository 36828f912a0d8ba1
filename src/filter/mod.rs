//! Row filtering for record batches
//!
//! - `core`: the `BatchFilter` trait and mask-based filtering
//! - `subject`: keep or drop rows by patient identifier

pub mod core;
pub mod subject;

pub use self::core::{BatchFilter, filter_record_batch};
pub use subject::{SubjectFilter, SubjectFilterMode, SubjectSet};
