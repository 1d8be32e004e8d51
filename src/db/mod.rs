//! Database module for SQLite persistence.
//!
//! SQLite is the source of truth for all application data. Each resource
//! adds its own `impl Repository` block in a sibling module.

mod catalog;
mod convert;
mod dashboard;
mod dedup;
mod imports;
mod inventory;
mod meal_plans;
mod nutrition;
mod recipes;
mod repository;
mod shopping_lists;
mod staples;
mod users;

pub use repository::*;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;

/// Initialize the database connection pool and run migrations.
pub async fn init_database(db_path: &Path) -> Result<SqlitePool, sqlx::Error> {
    // Ensure the parent directory exists
    if let Some(parent) = db_path.parent() {
        tokio::fs::create_dir_all(parent).await.ok();
    }

    let db_url = format!("sqlite:{}?mode=rwc", db_path.display());

    let options = SqliteConnectOptions::from_str(&db_url)?
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
        .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
        .busy_timeout(std::time::Duration::from_secs(30));

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    // Run embedded migrations
    run_migrations(&pool).await?;

    Ok(pool)
}

/// Run database migrations.
async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id TEXT PRIMARY KEY,
            email TEXT NOT NULL UNIQUE,
            name TEXT NOT NULL,
            password_hash TEXT NOT NULL,
            created_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS sessions (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            token_hash TEXT NOT NULL,
            created_at TEXT NOT NULL,
            expires_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS profiles (
            user_id TEXT PRIMARY KEY REFERENCES users(id) ON DELETE CASCADE,
            household_size INTEGER NOT NULL DEFAULT 2,
            dietary_preferences TEXT NOT NULL DEFAULT '[]',
            allergies TEXT NOT NULL DEFAULT '[]',
            daily_calorie_target INTEGER,
            updated_at TEXT NOT NULL
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS categories (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            name TEXT NOT NULL,
            display_order INTEGER NOT NULL DEFAULT 0,
            is_default INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS products (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            name TEXT NOT NULL,
            category TEXT,
            default_quantity REAL NOT NULL DEFAULT 1,
            default_unit TEXT NOT NULL DEFAULT '',
            notes TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS recipes (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            name TEXT NOT NULL,
            description TEXT,
            servings INTEGER NOT NULL DEFAULT 2,
            prep_minutes INTEGER,
            cook_minutes INTEGER,
            instructions TEXT NOT NULL DEFAULT '[]',
            tags TEXT NOT NULL DEFAULT '[]',
            calories REAL,
            protein_g REAL,
            carbs_g REAL,
            fat_g REAL,
            source TEXT NOT NULL DEFAULT 'manual',
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS recipe_ingredients (
            id TEXT PRIMARY KEY,
            recipe_id TEXT NOT NULL REFERENCES recipes(id) ON DELETE CASCADE,
            position INTEGER NOT NULL,
            name TEXT NOT NULL,
            quantity REAL NOT NULL DEFAULT 0,
            unit TEXT NOT NULL DEFAULT '',
            notes TEXT
        );

        CREATE TABLE IF NOT EXISTS meal_plans (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            name TEXT NOT NULL,
            week_start_date TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'draft',
            notes TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS meal_plan_entries (
            id TEXT PRIMARY KEY,
            meal_plan_id TEXT NOT NULL REFERENCES meal_plans(id) ON DELETE CASCADE,
            date TEXT NOT NULL,
            meal_type TEXT NOT NULL,
            recipe_id TEXT REFERENCES recipes(id) ON DELETE SET NULL,
            custom_name TEXT,
            servings INTEGER NOT NULL DEFAULT 1,
            notes TEXT
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS inventory_items (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            name TEXT NOT NULL,
            quantity REAL NOT NULL DEFAULT 0,
            unit TEXT NOT NULL DEFAULT '',
            category TEXT,
            location TEXT NOT NULL DEFAULT 'pantry',
            expiry_date TEXT,
            notes TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS staples (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            name TEXT NOT NULL,
            quantity REAL NOT NULL DEFAULT 1,
            unit TEXT NOT NULL DEFAULT '',
            category TEXT,
            frequency TEXT NOT NULL,
            custom_days INTEGER,
            last_purchased_date TEXT,
            is_active INTEGER NOT NULL DEFAULT 1,
            notes TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS shopping_lists (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            name TEXT NOT NULL,
            notes TEXT,
            status TEXT NOT NULL DEFAULT 'draft',
            meal_plan_ids TEXT NOT NULL DEFAULT '[]',
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            finalized_at TEXT,
            archived_at TEXT
        );

        CREATE TABLE IF NOT EXISTS shopping_list_items (
            id TEXT PRIMARY KEY,
            list_id TEXT NOT NULL REFERENCES shopping_lists(id) ON DELETE CASCADE,
            name TEXT NOT NULL,
            quantity REAL NOT NULL DEFAULT 1 CHECK (quantity >= 0),
            unit TEXT NOT NULL DEFAULT '',
            category TEXT,
            source TEXT NOT NULL DEFAULT 'manual',
            source_details TEXT NOT NULL DEFAULT '[]',
            is_purchased INTEGER NOT NULL DEFAULT 0,
            is_consolidated INTEGER NOT NULL DEFAULT 0,
            display_order INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS excluded_items (
            id TEXT PRIMARY KEY,
            list_id TEXT NOT NULL REFERENCES shopping_lists(id) ON DELETE CASCADE,
            name TEXT NOT NULL,
            required_quantity REAL NOT NULL,
            required_unit TEXT NOT NULL DEFAULT '',
            inventory_quantity REAL NOT NULL,
            inventory_unit TEXT NOT NULL DEFAULT '',
            source_details TEXT NOT NULL DEFAULT '[]',
            added_back_at TEXT,
            created_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS nutrition_messages (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            role TEXT NOT NULL,
            content TEXT NOT NULL,
            created_at TEXT NOT NULL
        );
        "#,
    )
    .execute(pool)
    .await?;

    // Create indexes for common queries
    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_sessions_user ON sessions(user_id);
        CREATE UNIQUE INDEX IF NOT EXISTS idx_categories_user_name ON categories(user_id, name COLLATE NOCASE);
        CREATE INDEX IF NOT EXISTS idx_products_user ON products(user_id, name);
        CREATE INDEX IF NOT EXISTS idx_recipes_user ON recipes(user_id, name);
        CREATE INDEX IF NOT EXISTS idx_ingredients_recipe ON recipe_ingredients(recipe_id, position);
        CREATE INDEX IF NOT EXISTS idx_meal_plans_user ON meal_plans(user_id, week_start_date);
        CREATE INDEX IF NOT EXISTS idx_entries_plan ON meal_plan_entries(meal_plan_id, date);
        CREATE INDEX IF NOT EXISTS idx_inventory_user ON inventory_items(user_id, name);
        CREATE INDEX IF NOT EXISTS idx_inventory_expiry ON inventory_items(user_id, expiry_date);
        CREATE INDEX IF NOT EXISTS idx_staples_user ON staples(user_id, is_active);
        CREATE INDEX IF NOT EXISTS idx_lists_user ON shopping_lists(user_id, status, updated_at);
        CREATE INDEX IF NOT EXISTS idx_items_list ON shopping_list_items(list_id, display_order);
        CREATE INDEX IF NOT EXISTS idx_excluded_list ON excluded_items(list_id);
        CREATE INDEX IF NOT EXISTS idx_messages_user ON nutrition_messages(user_id, created_at);
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}
