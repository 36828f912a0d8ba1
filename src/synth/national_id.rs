//! 18-digit resident identity numbers
//!
//! Layout: 6-digit region code, 8-digit birth date (`YYYYMMDD`), 3-digit
//! sequence whose last digit is odd for men and even for women, and an
//! ISO 7064 MOD 11-2 check character (`0`-`9` or `X`).

use chrono::{Datelike, NaiveDate};
use rand::Rng;
use rand::seq::IndexedRandom;

use super::Sex;

const WEIGHTS: [u32; 17] = [7, 9, 10, 5, 8, 4, 2, 1, 6, 3, 7, 9, 10, 5, 8, 4, 2];
const CHECK_CHARS: [char; 11] = ['1', '0', 'X', '9', '8', '7', '6', '5', '4', '3', '2'];

/// County-level region codes used for generated numbers
const REGION_CODES: &[&str] = &[
    "110101", "110105", "110108", "120101", "130102", "140105", "210102", "220102", "230102",
    "310101", "310104", "310115", "320102", "320505", "330102", "330106", "340102", "350102",
    "360102", "370102", "370202", "410105", "420102", "430102", "440103", "440106", "440305",
    "450103", "460106", "500103", "510104", "510107", "520102", "530102", "610102", "620102",
];

/// What can be read back from a valid number
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NationalIdInfo {
    pub birth_date: NaiveDate,
    pub sex: Sex,
}

/// Compute the check character for the first 17 digits
#[must_use]
pub fn check_character(body: &str) -> Option<char> {
    if body.len() != 17 {
        return None;
    }
    let mut sum = 0;
    for (c, weight) in body.chars().zip(WEIGHTS) {
        sum += c.to_digit(10)? * weight;
    }
    Some(CHECK_CHARS[(sum % 11) as usize])
}

/// Decode a number, returning `None` unless it is well formed
///
/// Checks length, digits, the embedded birth date and the check character;
/// a lowercase `x` check character is accepted.
#[must_use]
pub fn decode_national_id(id: &str) -> Option<NationalIdInfo> {
    if id.len() != 18 || !id.is_ascii() {
        return None;
    }
    let (body, check) = id.split_at(17);
    let expected = check_character(body)?;
    if !check.eq_ignore_ascii_case(&expected.to_string()) {
        return None;
    }

    let birth_date = NaiveDate::parse_from_str(&body[6..14], "%Y%m%d").ok()?;
    let sequence_digit = body[16..17].parse::<u32>().ok()?;
    let sex = if sequence_digit % 2 == 1 {
        Sex::Male
    } else {
        Sex::Female
    };

    Some(NationalIdInfo { birth_date, sex })
}

/// Whether a string is a valid identity number
#[must_use]
pub fn validate_national_id(id: &str) -> bool {
    decode_national_id(id).is_some()
}

/// Generate a valid number for the given birth date and sex
///
/// Returns `None` for birth years outside `1000..=9999`.
pub fn generate_national_id<R: Rng + ?Sized>(
    rng: &mut R,
    birth_date: NaiveDate,
    sex: Sex,
) -> Option<String> {
    if !(1000..=9999).contains(&birth_date.year()) {
        return None;
    }

    let region = REGION_CODES.choose(rng)?;
    let order: u32 = rng.random_range(0..100);
    let parity_digit = match sex {
        Sex::Male => 2 * rng.random_range(0..5) + 1,
        Sex::Female => 2 * rng.random_range(0..5),
    };

    let body = format!(
        "{region}{}{order:02}{parity_digit}",
        birth_date.format("%Y%m%d")
    );
    let check = check_character(&body)?;
    Some(format!("{body}{check}"))
}

/// Pick a uniformly random day of `year`
pub fn random_birth_date<R: Rng + ?Sized>(rng: &mut R, year: i32) -> Option<NaiveDate> {
    let days = if crate::anchor::is_leap_year(year) { 366 } else { 365 };
    NaiveDate::from_yo_opt(year, rng.random_range(1..=days))
}
