//! Pantry Planner Backend
//!
//! REST backend for household meal planning, inventory and shopping lists,
//! with SQLite persistence and a Tantivy recipe index.

mod ai;
mod api;
mod auth;
mod config;
mod db;
mod errors;
mod grocery;
mod models;
mod nutrition;
mod search;

use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, patch, post, put},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use ai::{LlmProvider, OpenAiCompatibleProvider};
use config::{Config, LogFormat};
use db::Repository;
use search::SearchIndex;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<Repository>,
    pub search: Arc<SearchIndex>,
    pub config: Arc<Config>,
    /// `None` when no LLM endpoint is configured
    pub llm: Option<Arc<dyn LlmProvider>>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize logging
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let registry = tracing_subscriber::registry().with(env_filter);
    match config.log_format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).init(),
    }

    tracing::info!("Starting Pantry Planner Backend");
    tracing::info!("Database path: {:?}", config.db_path);
    tracing::info!("Index path: {:?}", config.index_path);
    tracing::info!("Bind address: {}", config.bind_addr);

    let llm: Option<Arc<dyn LlmProvider>> = match &config.llm {
        Some(llm_config) => {
            tracing::info!(
                "AI features enabled ({} at {})",
                llm_config.model,
                llm_config.base_url
            );
            let provider: Arc<dyn LlmProvider> =
                Arc::new(OpenAiCompatibleProvider::new(llm_config.clone())?);
            Some(provider)
        }
        None => {
            tracing::warn!("No LLM configured (MEALPLAN_LLM_BASE_URL / MEALPLAN_LLM_API_KEY). AI features are disabled");
            None
        }
    };

    // Initialize database
    let pool = db::init_database(&config.db_path).await?;
    let repo = Arc::new(Repository::new(pool));

    // Initialize search index
    let search = Arc::new(SearchIndex::open(&config.index_path)?);

    // Build initial search index from database
    tracing::info!("Building search index...");
    let recipes = repo.list_all_recipes().await?;
    search.rebuild(&recipes).await?;

    // Create application state
    let state = AppState {
        repo,
        search,
        config: Arc::new(config.clone()),
        llm,
    };

    // Build router
    let app = create_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Create the application router with all routes.
pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Routes that need a session
    let session_routes = Router::new()
        .route("/auth/me", get(api::me))
        // Profile
        .route("/profile", get(api::get_profile).put(api::update_profile))
        // Categories
        .route(
            "/categories",
            get(api::list_categories).post(api::create_category),
        )
        .route("/categories/reorder", post(api::reorder_categories))
        .route(
            "/categories/{id}",
            put(api::update_category).delete(api::delete_category),
        )
        // Products
        .route("/products", get(api::list_products).post(api::create_product))
        .route(
            "/products/{id}",
            get(api::get_product)
                .put(api::update_product)
                .delete(api::delete_product),
        )
        // Recipes
        .route("/recipes", get(api::list_recipes).post(api::create_recipe))
        .route("/recipes/search", get(api::search_recipes))
        .route("/recipes/generate", post(api::generate_recipe))
        .route(
            "/recipes/{id}",
            get(api::get_recipe)
                .put(api::update_recipe)
                .delete(api::delete_recipe),
        )
        .route("/recipes/{id}/nutrition", get(api::get_recipe_nutrition))
        // Meal plans
        .route(
            "/meal-plans",
            get(api::list_meal_plans).post(api::create_meal_plan),
        )
        .route("/meal-plans/generate", post(api::generate_meal_plan))
        .route(
            "/meal-plans/{id}",
            get(api::get_meal_plan)
                .put(api::update_meal_plan)
                .delete(api::delete_meal_plan),
        )
        .route(
            "/meal-plans/{id}/entries",
            put(api::replace_meal_plan_entries),
        )
        .route(
            "/meal-plans/{id}/nutrition",
            get(api::get_meal_plan_nutrition),
        )
        // Inventory
        .route(
            "/inventory",
            get(api::list_inventory).post(api::create_inventory_item),
        )
        .route("/inventory/expiring", get(api::list_expiring_inventory))
        .route(
            "/inventory/{id}",
            get(api::get_inventory_item)
                .put(api::update_inventory_item)
                .delete(api::delete_inventory_item),
        )
        // Staples
        .route("/staples", get(api::list_staples).post(api::create_staple))
        .route("/staples/due", get(api::list_due_staples))
        .route(
            "/staples/{id}",
            get(api::get_staple)
                .put(api::update_staple)
                .delete(api::delete_staple),
        )
        // Shopping lists
        .route(
            "/shopping-lists",
            get(api::list_shopping_lists).post(api::create_shopping_list),
        )
        .route(
            "/shopping-lists/{id}",
            get(api::get_shopping_list)
                .patch(api::update_shopping_list)
                .delete(api::delete_shopping_list),
        )
        .route(
            "/shopping-lists/{id}/items",
            get(api::list_items).post(api::add_item),
        )
        .route(
            "/shopping-lists/{id}/items/bulk-purchase",
            post(api::bulk_purchase),
        )
        .route(
            "/shopping-lists/{id}/items/suggest-categories",
            post(api::suggest_categories),
        )
        .route(
            "/shopping-lists/{id}/items/{item_id}",
            patch(api::update_item).delete(api::delete_item),
        )
        .route(
            "/shopping-lists/{id}/deduplicate",
            get(api::find_duplicates).post(api::merge_duplicates),
        )
        .route(
            "/shopping-lists/{id}/deduplicate/all",
            post(api::combine_all_duplicates),
        )
        .route(
            "/shopping-lists/{id}/import/staples",
            get(api::staple_import_candidates).post(api::import_staples),
        )
        .route(
            "/shopping-lists/{id}/import/meal-plan",
            get(api::meal_plan_import_preview).post(api::import_meal_plan),
        )
        .route(
            "/shopping-lists/{id}/excluded-items",
            get(api::list_excluded_items).post(api::add_back_excluded_item),
        )
        .route(
            "/shopping-lists/{id}/convert-to-inventory",
            get(api::convert_preview).post(api::convert_to_inventory),
        )
        // Dashboard
        .route("/dashboard", get(api::get_dashboard))
        // Nutritionist
        .route("/nutritionist/chat", post(api::nutritionist_chat))
        .route(
            "/nutritionist/history",
            get(api::nutritionist_history).delete(api::clear_nutritionist_history),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_session,
        ));

    // Routes that start or end a session
    let public_routes = Router::new()
        .route("/auth/register", post(api::register))
        .route("/auth/login", post(api::login))
        .route("/auth/logout", post(api::logout));

    // Health check (no auth required)
    let health_routes = Router::new().route("/health", get(health_check));

    Router::new()
        .nest("/api", session_routes.merge(public_routes))
        .merge(health_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "OK"
}

#[cfg(test)]
mod tests;
