//! Year re-basing of date-like strings.

use arrow::array::{Array, StringArray};

use crate::anchor::AnchorPair;

/// Re-base the leading year of a `"<year>-<rest>"` string
///
/// The new year is `year - anchor_year + chosen_anchor_year`, computed in
/// floating point and rendered without decimals. Everything from the first
/// `-` onwards is kept byte for byte. Returns `None` when the leading
/// component is not a number.
#[must_use]
pub fn adjust_year(value: &str, pair: AnchorPair) -> Option<String> {
    let split = value.find('-').unwrap_or(value.len());
    let (year, rest) = value.split_at(split);

    let year: f64 = year.trim().parse().ok()?;
    if !year.is_finite() {
        return None;
    }

    let shifted = year - f64::from(pair.anchor_year) + f64::from(pair.chosen_anchor_year);
    Some(format!("{shifted:.0}{rest}"))
}

/// Re-base a whole column given one anchor pair per row
///
/// Nulls stay null. Values whose year cannot be read are kept verbatim and
/// counted in the second element of the result; they never parse as dates,
/// so the validity check treats them like any other invalid date.
///
/// # Panics
///
/// Panics if `pairs` is shorter than `values`.
#[must_use]
pub fn adjust_year_column(values: &StringArray, pairs: &[AnchorPair]) -> (StringArray, usize) {
    assert!(
        pairs.len() >= values.len(),
        "one anchor pair is needed per row"
    );

    let mut malformed = 0;
    let adjusted = values
        .iter()
        .zip(pairs)
        .map(|(value, pair)| {
            value.map(|v| {
                adjust_year(v, *pair).unwrap_or_else(|| {
                    malformed += 1;
                    v.to_string()
                })
            })
        })
        .collect::<StringArray>();

    (adjusted, malformed)
}
