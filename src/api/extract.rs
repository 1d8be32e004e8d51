//! Body and query extractors that reject with [`AppError`] instead of
//! axum's plain-text 4xx responses.

use axum::extract::{FromRequest, FromRequestParts};

use crate::errors::AppError;

/// JSON body whose deserialization failure is a `VALIDATION_ERROR`.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct Json<T>(pub T);

/// Query string whose deserialization failure is a `VALIDATION_ERROR`.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct Query<T>(pub T);
