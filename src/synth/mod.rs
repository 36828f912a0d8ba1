//! Synthetic patient identities
//!
//! All randomness flows through an explicitly owned `StdRng`, so a seeded run
//! produces the same identities every time.

pub mod names;
pub mod national_id;

use std::str::FromStr;

use chrono::NaiveDate;
use rand::SeedableRng;
use rand::rngs::StdRng;

pub use names::generate_name;
pub use national_id::{
    NationalIdInfo, decode_national_id, generate_national_id, random_birth_date,
    validate_national_id,
};

/// Administrative sex as recorded in the `gender` column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sex {
    Male,
    Female,
}

impl FromStr for Sex {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "M" | "m" => Ok(Self::Male),
            "F" | "f" => Ok(Self::Female),
            other => Err(format!("unknown gender '{other}'")),
        }
    }
}

/// A generated identity for one patient
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntheticIdentity {
    pub national_id: String,
    pub name: String,
    pub birth_date: NaiveDate,
}

/// Seedable source of synthetic identities
#[derive(Debug, Clone)]
pub struct IdentityGenerator {
    rng: StdRng,
}

impl IdentityGenerator {
    /// Seeded when `seed` is given, otherwise drawn from the OS
    #[must_use]
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self { rng }
    }

    /// Generate an identity born in `birth_year`
    ///
    /// Returns `None` when the year cannot be encoded in a national ID.
    pub fn identity(&mut self, birth_year: i32, sex: Sex) -> Option<SyntheticIdentity> {
        let birth_date = random_birth_date(&mut self.rng, birth_year)?;
        let national_id = generate_national_id(&mut self.rng, birth_date, sex)?;
        let name = generate_name(&mut self.rng, sex);

        Some(SyntheticIdentity {
            national_id,
            name,
            birth_date,
        })
    }
}
