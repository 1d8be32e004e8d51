//! Recurring staple models.

use serde::{Deserialize, Serialize};

use super::{optional_length, parse_date, require_length, require_positive};
use crate::errors::AppError;

/// How often a staple is bought.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StapleFrequency {
    Weekly,
    Biweekly,
    Monthly,
    Custom,
}

impl StapleFrequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            StapleFrequency::Weekly => "weekly",
            StapleFrequency::Biweekly => "biweekly",
            StapleFrequency::Monthly => "monthly",
            StapleFrequency::Custom => "custom",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "weekly" => Some(StapleFrequency::Weekly),
            "biweekly" => Some(StapleFrequency::Biweekly),
            "monthly" => Some(StapleFrequency::Monthly),
            "custom" => Some(StapleFrequency::Custom),
            _ => None,
        }
    }
}

/// Restock urgency of a staple relative to today.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum DueStatus {
    Overdue,
    DueToday,
    DueSoon,
    Upcoming,
}

/// A household item bought on a recurring schedule.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Staple {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub quantity: f64,
    pub unit: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub frequency: StapleFrequency,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_days: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_purchased_date: Option<String>,
    pub is_active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// A staple with its computed due information.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StapleWithDue {
    #[serde(flatten)]
    pub staple: Staple,
    pub due_date: String,
    pub days_until_due: i64,
    pub due_status: DueStatus,
}

/// Request body for creating a staple.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateStapleRequest {
    pub name: String,
    #[serde(default = "default_quantity")]
    pub quantity: f64,
    #[serde(default)]
    pub unit: String,
    #[serde(default)]
    pub category: Option<String>,
    pub frequency: StapleFrequency,
    #[serde(default)]
    pub custom_days: Option<i64>,
    #[serde(default)]
    pub last_purchased_date: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

fn default_quantity() -> f64 {
    1.0
}

impl CreateStapleRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        require_length("Staple name", &self.name, 1, 100)?;
        require_positive("Quantity", self.quantity)?;
        optional_length("Unit", &Some(self.unit.clone()), 20)?;
        validate_schedule(self.frequency, self.custom_days)?;
        if let Some(date) = &self.last_purchased_date {
            parse_date("Last purchased date", date)?;
        }
        optional_length("Notes", &self.notes, 500)
    }
}

/// Request body for updating a staple.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStapleRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub quantity: Option<f64>,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub frequency: Option<StapleFrequency>,
    #[serde(default)]
    pub custom_days: Option<i64>,
    #[serde(default)]
    pub last_purchased_date: Option<String>,
    #[serde(default)]
    pub is_active: Option<bool>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl UpdateStapleRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        if let Some(name) = &self.name {
            require_length("Staple name", name, 1, 100)?;
        }
        if let Some(quantity) = self.quantity {
            require_positive("Quantity", quantity)?;
        }
        optional_length("Unit", &self.unit, 20)?;
        if let Some(days) = self.custom_days {
            validate_custom_days(days)?;
        }
        if let Some(date) = &self.last_purchased_date {
            parse_date("Last purchased date", date)?;
        }
        optional_length("Notes", &self.notes, 500)
    }
}

/// A custom schedule needs its day count; fixed schedules ignore it.
pub fn validate_schedule(
    frequency: StapleFrequency,
    custom_days: Option<i64>,
) -> Result<(), AppError> {
    match (frequency, custom_days) {
        (StapleFrequency::Custom, None) => Err(AppError::Validation(
            "Custom frequency requires customDays".to_string(),
        )),
        (_, Some(days)) => validate_custom_days(days),
        _ => Ok(()),
    }
}

fn validate_custom_days(days: i64) -> Result<(), AppError> {
    if !(1..=365).contains(&days) {
        return Err(AppError::Validation(
            "Custom days must be between 1 and 365".to_string(),
        ));
    }
    Ok(())
}
