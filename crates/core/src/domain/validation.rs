//! Rule accumulator for entity validation.
//!
//! Rules never short-circuit: every failing rule is recorded so callers get
//! the complete list of problems in one response.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A single failed rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// All failed rules for one payload.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, Error)]
pub struct ValidationErrors {
    pub errors: Vec<FieldError>,
}

impl ValidationErrors {
    /// Builds a result holding a single field error.
    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            errors: vec![FieldError {
                field: field.into(),
                message: message.into(),
            }],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Returns the messages recorded for a field.
    pub fn for_field<'a>(&'a self, field: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.errors
            .iter()
            .filter(move |e| e.field == field)
            .map(|e| e.message.as_str())
    }

    pub fn merge(&mut self, other: ValidationErrors) {
        self.errors.extend(other.errors);
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Validation failed")?;
        for (i, error) in self.errors.iter().enumerate() {
            let sep = if i == 0 { ": " } else { "; " };
            write!(f, "{sep}{} {}", error.field, error.message)?;
        }
        Ok(())
    }
}

/// Collects rule failures for one payload.
#[derive(Debug, Default)]
pub struct Validator {
    errors: ValidationErrors,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `message` against `field` when `condition` is false.
    pub fn ensure(&mut self, field: &str, condition: bool, message: impl Into<String>) -> &mut Self {
        if !condition {
            self.errors.errors.push(FieldError {
                field: field.to_string(),
                message: message.into(),
            });
        }
        self
    }

    /// Value must contain at least one non-whitespace character.
    pub fn not_empty(&mut self, field: &str, value: &str) -> &mut Self {
        self.ensure(field, !value.trim().is_empty(), "must not be empty")
    }

    /// Trimmed value must be between `min` and `max` characters.
    pub fn length(&mut self, field: &str, value: &str, min: usize, max: usize) -> &mut Self {
        let len = value.trim().chars().count();
        if len == 0 && min > 0 {
            return self.not_empty(field, value);
        }
        self.ensure(
            field,
            (min..=max).contains(&len),
            format!("must be between {min} and {max} characters"),
        )
    }

    /// Optional text, when present, must not exceed `max` characters.
    pub fn max_length(&mut self, field: &str, value: Option<&str>, max: usize) -> &mut Self {
        let len = value.map(|v| v.chars().count()).unwrap_or(0);
        self.ensure(
            field,
            len <= max,
            format!("must be at most {max} characters"),
        )
    }

    /// Value must lie in the inclusive range.
    pub fn range<T>(&mut self, field: &str, value: T, min: T, max: T) -> &mut Self
    where
        T: PartialOrd + fmt::Display,
    {
        let ok = value >= min && value <= max;
        self.ensure(field, ok, format!("must be between {min} and {max}"))
    }

    /// Value must be strictly greater than zero.
    pub fn positive(&mut self, field: &str, value: f64) -> &mut Self {
        self.ensure(
            field,
            value.is_finite() && value > 0.0,
            "must be greater than 0",
        )
    }

    pub fn finish(&mut self) -> Result<(), ValidationErrors> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(std::mem::take(&mut self.errors))
        }
    }
}
