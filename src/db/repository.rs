//! Database repository shared by every resource module.
//!
//! Uses prepared statements and transactions for data integrity. Reads of a
//! single owned resource report 404 before 403.

use chrono::{Local, NaiveDate, Utc};
use serde::Serialize;
use sqlx::SqlitePool;

use crate::errors::AppError;
use crate::models::SourceDetail;

/// Database repository for all data operations.
#[derive(Clone)]
pub struct Repository {
    pub(super) pool: SqlitePool,
}

impl Repository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

pub(super) fn now() -> String {
    Utc::now().to_rfc3339()
}

pub(super) fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Calendar date used for staple schedules and expiry checks.
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

pub(super) fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// 404 when the row is missing, 403 when it belongs to someone else.
pub(super) fn ensure_owner(owner: &str, user_id: &str, resource: &str) -> Result<(), AppError> {
    if owner != user_id {
        return Err(AppError::forbidden(resource));
    }
    Ok(())
}

pub(super) fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String, AppError> {
    serde_json::to_string(value)
        .map_err(|e| AppError::Internal(format!("Failed to encode column: {}", e)))
}

pub(super) fn parse_json_array(s: &str) -> Vec<String> {
    serde_json::from_str(s).unwrap_or_default()
}

pub(super) fn parse_source_details(s: &str) -> Vec<SourceDetail> {
    serde_json::from_str(s).unwrap_or_default()
}

/// Blank optional text is stored as NULL.
pub(super) fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
