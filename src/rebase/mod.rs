//! Anchor-year re-basing of date columns and validity checking of the result

pub mod validity;
pub mod year;

pub use validity::{DateRule, disqualified_subjects, invalid_row_mask, is_valid_datetime};
pub use year::{adjust_year, adjust_year_column};
