//! Arrow data handling utilities
//!
//! Helpers for the string-typed record batches every CSV table is read into.

pub mod array_utils;

pub use array_utils::{
    SUBJECT_ID, lowercase_column, parse_identifier, replace_column, string_column, subject_ids,
    with_string_columns,
};
