//! Typed fixture fields
//!
//! A field spec has the form `"<type>[:<rename>]"`, for example `"int"` or
//! `"datetime:admitted_at"`.

use std::fmt;
use std::str::FromStr;

use serde_json::Value;

use crate::error::{PipelineError, Result};

/// JSON type a CSV column is converted to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Str,
    Int,
    Float,
    /// Kept as the string written in the CSV
    Datetime,
    Bool,
}

impl FromStr for FieldType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim() {
            "str" => Ok(Self::Str),
            "int" => Ok(Self::Int),
            "float" => Ok(Self::Float),
            "datetime" => Ok(Self::Datetime),
            "bool" => Ok(Self::Bool),
            other => Err(format!(
                "unknown field type '{other}' (expected str, int, float, datetime or bool)"
            )),
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Str => "str",
            Self::Int => "int",
            Self::Float => "float",
            Self::Datetime => "datetime",
            Self::Bool => "bool",
        };
        f.write_str(name)
    }
}

/// One copied column of a fixture
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    /// CSV column to read
    pub column: String,
    pub kind: FieldType,
    /// Name of the field in the fixture
    pub rename: String,
}

impl FieldSpec {
    /// Parse `"<type>[:<rename>]"` for `column`
    ///
    /// An empty rename keeps the column name.
    pub fn parse(column: &str, spec: &str) -> Result<Self> {
        let (kind, rename) = match spec.split_once(':') {
            Some((kind, rename)) if !rename.is_empty() => (kind, rename),
            Some((kind, _)) => (kind, column),
            None => (spec, column),
        };
        let kind = kind.parse().map_err(PipelineError::Config)?;

        Ok(Self {
            column: column.to_string(),
            kind,
            rename: rename.to_string(),
        })
    }

    /// Convert one CSV cell; `None` is an empty cell
    ///
    /// Empty cells become `""` for strings and `null` for every other type.
    pub fn convert(&self, table: &str, value: Option<&str>) -> Result<Value> {
        let Some(raw) = value.filter(|v| !v.is_empty()) else {
            return Ok(match self.kind {
                FieldType::Str => Value::String(String::new()),
                _ => Value::Null,
            });
        };

        let invalid = || PipelineError::invalid_value(table, &self.column, raw);
        match self.kind {
            FieldType::Str | FieldType::Datetime => Ok(Value::String(raw.to_string())),
            FieldType::Int => {
                let parsed: f64 = raw.trim().parse().map_err(|_| invalid())?;
                if !parsed.is_finite() {
                    return Err(invalid());
                }
                #[allow(clippy::cast_possible_truncation)]
                Ok(Value::from(parsed.trunc() as i64))
            }
            FieldType::Float => {
                let parsed: f64 = raw.trim().parse().map_err(|_| invalid())?;
                Ok(Value::from(parsed))
            }
            FieldType::Bool => match raw.trim().to_lowercase().as_str() {
                "true" | "t" | "1" => Ok(Value::Bool(true)),
                "false" | "f" | "0" => Ok(Value::Bool(false)),
                _ => Err(invalid()),
            },
        }
    }
}
