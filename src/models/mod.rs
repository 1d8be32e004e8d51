//! Data models for the pantry planner.
//!
//! Field names serialize as camelCase to match the web client.

mod category;
mod dashboard;
mod inventory;
mod meal_plan;
mod nutrition;
mod product;
mod recipe;
mod shopping_list;
mod staple;
mod user;

pub use category::*;
pub use dashboard::*;
pub use inventory::*;
pub use meal_plan::*;
pub use nutrition::*;
pub use product::*;
pub use recipe::*;
pub use shopping_list::*;
pub use staple::*;
pub use user::*;

use chrono::NaiveDate;

use crate::errors::AppError;

/// Check that a trimmed string is within `min..=max` characters.
pub fn require_length(field: &str, value: &str, min: usize, max: usize) -> Result<(), AppError> {
    let len = value.trim().chars().count();
    if len < min {
        return Err(if min == 1 {
            AppError::Validation(format!("{} is required", field))
        } else {
            AppError::Validation(format!("{} must be at least {} characters", field, min))
        });
    }
    if len > max {
        return Err(AppError::Validation(format!(
            "{} must be at most {} characters",
            field, max
        )));
    }
    Ok(())
}

/// Check that an optional string does not exceed `max` characters.
pub fn optional_length(field: &str, value: &Option<String>, max: usize) -> Result<(), AppError> {
    match value {
        Some(v) if v.chars().count() > max => Err(AppError::Validation(format!(
            "{} must be at most {} characters",
            field, max
        ))),
        _ => Ok(()),
    }
}

/// Check that a quantity is a finite number not below zero.
pub fn require_non_negative(field: &str, value: f64) -> Result<(), AppError> {
    if !value.is_finite() || value < 0.0 {
        return Err(AppError::Validation(format!(
            "{} must be zero or greater",
            field
        )));
    }
    Ok(())
}

/// Check that a quantity is a finite number above zero.
pub fn require_positive(field: &str, value: f64) -> Result<(), AppError> {
    if !value.is_finite() || value <= 0.0 {
        return Err(AppError::Validation(format!("{} must be greater than zero", field)));
    }
    Ok(())
}

/// Parse a `YYYY-MM-DD` calendar date.
pub fn parse_date(field: &str, value: &str) -> Result<NaiveDate, AppError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| {
        AppError::Validation(format!("{} must be a date in YYYY-MM-DD format", field))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_length_messages() {
        let err = require_length("Name", "   ", 1, 10).unwrap_err();
        assert_eq!(err.message(), "Name is required");

        let err = require_length("Password", "short", 8, 128).unwrap_err();
        assert_eq!(err.message(), "Password must be at least 8 characters");

        assert!(require_length("Name", "Milk", 1, 10).is_ok());
        assert!(require_length("Name", "a very long name", 1, 10).is_err());
    }

    #[test]
    fn test_quantity_checks() {
        assert!(require_non_negative("Quantity", 0.0).is_ok());
        assert!(require_non_negative("Quantity", -0.5).is_err());
        assert!(require_non_negative("Quantity", f64::NAN).is_err());
        assert!(require_positive("Servings", 0.0).is_err());
        assert!(require_positive("Servings", 2.0).is_ok());
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(
            parse_date("Date", "2024-03-04").unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 4).unwrap()
        );
        assert!(parse_date("Date", "04/03/2024").is_err());
    }
}
