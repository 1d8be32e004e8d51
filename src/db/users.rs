//! Users, sessions and household profiles.

use chrono::{DateTime, Duration, Utc};
use sqlx::{sqlite::SqliteRow, Row};

use super::repository::{new_id, now, parse_json_array, to_json, Repository};
use crate::errors::AppError;
use crate::grocery::categories::DEFAULT_CATEGORIES;
use crate::models::{Profile, UpdateProfileRequest, User};

/// Session row joined with its user.
#[derive(Debug, Clone)]
pub struct SessionRecord {
    pub user: User,
    pub token_hash: String,
    pub expires_at: DateTime<Utc>,
}

const DEFAULT_HOUSEHOLD_SIZE: i64 = 2;

impl Repository {
    // ==================== USER OPERATIONS ====================

    /// Create a user with a default profile and the default categories.
    pub async fn create_user(
        &self,
        email: &str,
        name: &str,
        password_hash: &str,
    ) -> Result<User, AppError> {
        let email = email.trim().to_lowercase();
        let mut tx = self.pool.begin().await?;

        let existing = sqlx::query("SELECT id FROM users WHERE email = ?")
            .bind(&email)
            .fetch_optional(&mut *tx)
            .await?;
        if existing.is_some() {
            return Err(AppError::Conflict(
                "An account with this email already exists".to_string(),
            ));
        }

        let id = new_id();
        let now = now();
        sqlx::query(
            "INSERT INTO users (id, email, name, password_hash, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(&email)
        .bind(name.trim())
        .bind(password_hash)
        .bind(&now)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            "INSERT INTO profiles (user_id, household_size, dietary_preferences, allergies, updated_at) VALUES (?, ?, '[]', '[]', ?)",
        )
        .bind(&id)
        .bind(DEFAULT_HOUSEHOLD_SIZE)
        .bind(&now)
        .execute(&mut *tx)
        .await?;

        for (order, category) in DEFAULT_CATEGORIES.iter().enumerate() {
            sqlx::query(
                "INSERT INTO categories (id, user_id, name, display_order, is_default, created_at) VALUES (?, ?, ?, ?, 1, ?)",
            )
            .bind(new_id())
            .bind(&id)
            .bind(*category)
            .bind(order as i64)
            .bind(&now)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(User {
            id,
            email,
            name: name.trim().to_string(),
            created_at: now,
        })
    }

    /// Look up a user and password hash by email.
    pub async fn find_credentials(&self, email: &str) -> Result<Option<(User, String)>, AppError> {
        let row = sqlx::query(
            "SELECT id, email, name, created_at, password_hash FROM users WHERE email = ?",
        )
        .bind(email.trim().to_lowercase())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| (user_from_row(&row), row.get("password_hash"))))
    }

    pub async fn get_user(&self, id: &str) -> Result<Option<User>, AppError> {
        let row = sqlx::query("SELECT id, email, name, created_at FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(user_from_row))
    }

    // ==================== SESSION OPERATIONS ====================

    /// Store a session and return its expiry.
    pub async fn create_session(
        &self,
        session_id: &str,
        user_id: &str,
        token_hash: &str,
        ttl_hours: i64,
    ) -> Result<DateTime<Utc>, AppError> {
        let created = Utc::now();
        let expires_at = created + Duration::hours(ttl_hours);

        // Expired sessions of this user are dropped on every login.
        sqlx::query("DELETE FROM sessions WHERE user_id = ? AND expires_at < ?")
            .bind(user_id)
            .bind(created.to_rfc3339())
            .execute(&self.pool)
            .await?;

        sqlx::query(
            "INSERT INTO sessions (id, user_id, token_hash, created_at, expires_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(session_id)
        .bind(user_id)
        .bind(token_hash)
        .bind(created.to_rfc3339())
        .bind(expires_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(expires_at)
    }

    pub async fn get_session(&self, session_id: &str) -> Result<Option<SessionRecord>, AppError> {
        let row = sqlx::query(
            r#"SELECT u.id, u.email, u.name, u.created_at, s.token_hash, s.expires_at
               FROM sessions s JOIN users u ON u.id = s.user_id
               WHERE s.id = ?"#,
        )
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let expires_raw: String = row.get("expires_at");
        let expires_at = DateTime::parse_from_rfc3339(&expires_raw)
            .map(|d| d.with_timezone(&Utc))
            .map_err(|e| AppError::Internal(format!("Corrupt session expiry: {}", e)))?;

        Ok(Some(SessionRecord {
            user: user_from_row(&row),
            token_hash: row.get("token_hash"),
            expires_at,
        }))
    }

    pub async fn delete_session(&self, session_id: &str) -> Result<(), AppError> {
        sqlx::query("DELETE FROM sessions WHERE id = ?")
            .bind(session_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    // ==================== PROFILE OPERATIONS ====================

    pub async fn get_profile(&self, user_id: &str) -> Result<Option<Profile>, AppError> {
        let row = sqlx::query(
            "SELECT user_id, household_size, dietary_preferences, allergies, daily_calorie_target, updated_at FROM profiles WHERE user_id = ?",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.as_ref().map(profile_from_row))
    }

    /// Update the profile, creating it first if it is missing.
    pub async fn update_profile(
        &self,
        user_id: &str,
        request: &UpdateProfileRequest,
    ) -> Result<Profile, AppError> {
        let existing = self.get_profile(user_id).await?.unwrap_or(Profile {
            user_id: user_id.to_string(),
            household_size: DEFAULT_HOUSEHOLD_SIZE,
            dietary_preferences: Vec::new(),
            allergies: Vec::new(),
            daily_calorie_target: None,
            updated_at: String::new(),
        });

        let profile = Profile {
            user_id: user_id.to_string(),
            household_size: request.household_size.unwrap_or(existing.household_size),
            dietary_preferences: request
                .dietary_preferences
                .clone()
                .unwrap_or(existing.dietary_preferences),
            allergies: request.allergies.clone().unwrap_or(existing.allergies),
            daily_calorie_target: request
                .daily_calorie_target
                .or(existing.daily_calorie_target),
            updated_at: now(),
        };

        sqlx::query(
            r#"INSERT INTO profiles (user_id, household_size, dietary_preferences, allergies, daily_calorie_target, updated_at)
               VALUES (?, ?, ?, ?, ?, ?)
               ON CONFLICT(user_id) DO UPDATE SET
                 household_size = excluded.household_size,
                 dietary_preferences = excluded.dietary_preferences,
                 allergies = excluded.allergies,
                 daily_calorie_target = excluded.daily_calorie_target,
                 updated_at = excluded.updated_at"#,
        )
        .bind(user_id)
        .bind(profile.household_size)
        .bind(to_json(&profile.dietary_preferences)?)
        .bind(to_json(&profile.allergies)?)
        .bind(profile.daily_calorie_target)
        .bind(&profile.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(profile)
    }
}

fn user_from_row(row: &SqliteRow) -> User {
    User {
        id: row.get("id"),
        email: row.get("email"),
        name: row.get("name"),
        created_at: row.get("created_at"),
    }
}

fn profile_from_row(row: &SqliteRow) -> Profile {
    let preferences: String = row.get("dietary_preferences");
    let allergies: String = row.get("allergies");
    Profile {
        user_id: row.get("user_id"),
        household_size: row.get("household_size"),
        dietary_preferences: parse_json_array(&preferences),
        allergies: parse_json_array(&allergies),
        daily_calorie_target: row.get("daily_calorie_target"),
        updated_at: row.get("updated_at"),
    }
}
