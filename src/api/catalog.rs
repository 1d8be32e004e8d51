//! Category and product catalog endpoints.

use axum::{
    extract::{Path, State},
    Extension,
};

use super::extract::{Json, Query};
use super::{success, ApiResult, Deleted};
use crate::auth::CurrentUser;
use crate::models::{
    Category, CreateCategoryRequest, CreateProductRequest, Product, ProductQuery,
    ReorderCategoriesRequest, UpdateCategoryRequest, UpdateProductRequest,
};
use crate::AppState;

// ==================== CATEGORIES ====================

/// GET /api/categories - Categories in display order.
pub async fn list_categories(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> ApiResult<Vec<Category>> {
    success(state.repo.list_categories(&user.id).await?)
}

/// POST /api/categories
pub async fn create_category(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(request): Json<CreateCategoryRequest>,
) -> ApiResult<Category> {
    request.validate()?;
    success(state.repo.create_category(&user.id, &request).await?)
}

/// PUT /api/categories/:id
pub async fn update_category(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<String>,
    Json(request): Json<UpdateCategoryRequest>,
) -> ApiResult<Category> {
    request.validate()?;
    success(state.repo.update_category(&user.id, &id, &request).await?)
}

/// DELETE /api/categories/:id
pub async fn delete_category(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> ApiResult<Deleted> {
    state.repo.delete_category(&user.id, &id).await?;
    success(Deleted { deleted: true })
}

/// POST /api/categories/reorder - Assign display order by position.
pub async fn reorder_categories(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(request): Json<ReorderCategoriesRequest>,
) -> ApiResult<Vec<Category>> {
    success(state.repo.reorder_categories(&user.id, &request.ids).await?)
}

// ==================== PRODUCTS ====================

/// GET /api/products?q= - Products, optionally filtered by name.
pub async fn list_products(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Query(query): Query<ProductQuery>,
) -> ApiResult<Vec<Product>> {
    let filter = query.q.as_deref().map(str::trim).filter(|q| !q.is_empty());
    success(state.repo.list_products(&user.id, filter).await?)
}

/// GET /api/products/:id
pub async fn get_product(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> ApiResult<Product> {
    success(state.repo.get_product(&user.id, &id).await?)
}

/// POST /api/products
pub async fn create_product(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(request): Json<CreateProductRequest>,
) -> ApiResult<Product> {
    request.validate()?;
    success(state.repo.create_product(&user.id, &request).await?)
}

/// PUT /api/products/:id
pub async fn update_product(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<String>,
    Json(request): Json<UpdateProductRequest>,
) -> ApiResult<Product> {
    request.validate()?;
    success(state.repo.update_product(&user.id, &id, &request).await?)
}

/// DELETE /api/products/:id
pub async fn delete_product(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> ApiResult<Deleted> {
    state.repo.delete_product(&user.id, &id).await?;
    success(Deleted { deleted: true })
}
