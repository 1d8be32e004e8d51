//! REST API module.
//!
//! Handlers take the session's [`CurrentUser`](crate::auth::CurrentUser) from
//! request extensions and answer with the `{success, data}` envelope.

mod auth;
mod catalog;
mod convert;
mod dashboard;
mod dedup;
mod extract;
mod imports;
mod inventory;
mod items;
mod meal_plans;
mod nutritionist;
mod profile;
mod recipes;
mod shopping_lists;
mod staples;

pub use auth::*;
pub use catalog::*;
pub use convert::*;
pub use dashboard::*;
pub use dedup::*;
pub use imports::*;
pub use inventory::*;
pub use items::*;
pub use meal_plans::*;
pub use nutritionist::*;
pub use profile::*;
pub use recipes::*;
pub use shopping_lists::*;
pub use staples::*;

use std::sync::Arc;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::ai::LlmProvider;
use crate::errors::AppError;
use crate::AppState;

/// Success response envelope.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn new(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

/// Response type that can be either success or error.
pub type ApiResult<T> = Result<ApiResponse<T>, AppError>;

/// Create a successful API response.
pub fn success<T: Serialize>(data: T) -> ApiResult<T> {
    Ok(ApiResponse::new(data))
}

/// Payload of endpoints that only acknowledge.
#[derive(Debug, Serialize)]
pub struct Deleted {
    pub deleted: bool,
}

/// The configured LLM, or 503 when AI features are disabled.
pub(crate) fn require_llm(state: &AppState) -> Result<Arc<dyn LlmProvider>, AppError> {
    state.llm.clone().ok_or(AppError::AiUnavailable)
}
