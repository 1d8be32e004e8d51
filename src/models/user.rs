//! User account and household profile models.

use serde::{Deserialize, Serialize};

use super::{optional_length, require_length};
use crate::errors::AppError;

/// A registered user. The password hash never leaves the repository.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: String,
    pub created_at: String,
}

/// Request body for creating an account.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub name: String,
}

impl RegisterRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        let email = self.email.trim();
        if email.is_empty() {
            return Err(AppError::Validation("Email is required".to_string()));
        }
        if !looks_like_email(email) {
            return Err(AppError::Validation("Email address is invalid".to_string()));
        }
        require_length("Password", &self.password, 8, 128)?;
        require_length("Name", &self.name, 1, 100)
    }
}

/// Request body for logging in.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl LoginRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.email.trim().is_empty() || self.password.is_empty() {
            return Err(AppError::Validation(
                "Email and password are required".to_string(),
            ));
        }
        Ok(())
    }
}

fn looks_like_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !email.contains(char::is_whitespace)
        }
        None => false,
    }
}

/// Household settings used by the dashboard and the nutrition features.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub user_id: String,
    pub household_size: i64,
    pub dietary_preferences: Vec<String>,
    pub allergies: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub daily_calorie_target: Option<i64>,
    pub updated_at: String,
}

/// Request body for updating the profile. Absent fields keep their value.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    #[serde(default)]
    pub household_size: Option<i64>,
    #[serde(default)]
    pub dietary_preferences: Option<Vec<String>>,
    #[serde(default)]
    pub allergies: Option<Vec<String>>,
    #[serde(default)]
    pub daily_calorie_target: Option<i64>,
}

impl UpdateProfileRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        if let Some(size) = self.household_size {
            if !(1..=20).contains(&size) {
                return Err(AppError::Validation(
                    "Household size must be between 1 and 20".to_string(),
                ));
            }
        }
        if let Some(target) = self.daily_calorie_target {
            if !(500..=10_000).contains(&target) {
                return Err(AppError::Validation(
                    "Daily calorie target must be between 500 and 10000".to_string(),
                ));
            }
        }
        for pref in self
            .dietary_preferences
            .iter()
            .chain(self.allergies.iter())
            .flatten()
        {
            optional_length("Preference", &Some(pref.clone()), 50)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_validation() {
        let ok = RegisterRequest {
            email: "sam@example.com".to_string(),
            password: "correct horse".to_string(),
            name: "Sam".to_string(),
        };
        assert!(ok.validate().is_ok());

        let bad_email = RegisterRequest {
            email: "sam.example.com".to_string(),
            ..ok.clone()
        };
        assert_eq!(
            bad_email.validate().unwrap_err().message(),
            "Email address is invalid"
        );

        let short_password = RegisterRequest {
            password: "abc".to_string(),
            ..ok
        };
        assert!(short_password.validate().is_err());
    }

    #[test]
    fn test_profile_validation() {
        let req = UpdateProfileRequest {
            household_size: Some(0),
            dietary_preferences: None,
            allergies: None,
            daily_calorie_target: None,
        };
        assert!(req.validate().is_err());

        let req = UpdateProfileRequest {
            household_size: Some(4),
            dietary_preferences: Some(vec!["vegetarian".to_string()]),
            allergies: Some(vec!["peanuts".to_string()]),
            daily_calorie_target: Some(2200),
        };
        assert!(req.validate().is_ok());
    }
}
