//! Recipe library persistence.

use std::collections::HashMap;

use sqlx::{sqlite::SqliteRow, Row, Sqlite, Transaction};

use super::repository::{ensure_owner, new_id, non_blank, now, parse_json_array, to_json, Repository};
use crate::errors::AppError;
use crate::grocery::units::canonical_unit;
use crate::models::{
    CreateRecipeRequest, IngredientInput, NutritionFacts, Recipe, RecipeIngredient, RecipeSource,
    UpdateRecipeRequest,
};

const RECIPE_COLUMNS: &str = "id, user_id, name, description, servings, prep_minutes, cook_minutes, instructions, tags, calories, protein_g, carbs_g, fat_g, source, created_at, updated_at";

impl Repository {
    /// List a user's recipes with their ingredients, by name.
    pub async fn list_recipes(&self, user_id: &str) -> Result<Vec<Recipe>, AppError> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM recipes WHERE user_id = ? ORDER BY name COLLATE NOCASE",
            RECIPE_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        let ingredient_rows = sqlx::query(
            r#"SELECT i.id, i.recipe_id, i.position, i.name, i.quantity, i.unit, i.notes
               FROM recipe_ingredients i JOIN recipes r ON r.id = i.recipe_id
               WHERE r.user_id = ?
               ORDER BY i.recipe_id, i.position"#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(attach_ingredients(&rows, &ingredient_rows))
    }

    /// Every recipe of every user, for rebuilding the search index.
    pub async fn list_all_recipes(&self) -> Result<Vec<Recipe>, AppError> {
        let rows = sqlx::query(&format!("SELECT {} FROM recipes", RECIPE_COLUMNS))
            .fetch_all(&self.pool)
            .await?;
        let ingredient_rows = sqlx::query(
            "SELECT id, recipe_id, position, name, quantity, unit, notes FROM recipe_ingredients ORDER BY recipe_id, position",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(attach_ingredients(&rows, &ingredient_rows))
    }

    /// A user's recipes keyed by id.
    pub async fn recipes_by_id(&self, user_id: &str) -> Result<HashMap<String, Recipe>, AppError> {
        Ok(self
            .list_recipes(user_id)
            .await?
            .into_iter()
            .map(|r| (r.id.clone(), r))
            .collect())
    }

    pub async fn get_recipe(&self, user_id: &str, id: &str) -> Result<Recipe, AppError> {
        let row = sqlx::query(&format!("SELECT {} FROM recipes WHERE id = ?", RECIPE_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        let row = row.ok_or_else(|| AppError::not_found("Recipe", id))?;
        let owner: String = row.get("user_id");
        ensure_owner(&owner, user_id, "recipe")?;

        let ingredient_rows = sqlx::query(
            "SELECT id, recipe_id, position, name, quantity, unit, notes FROM recipe_ingredients WHERE recipe_id = ? ORDER BY position",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        let mut recipe = recipe_from_row(&row);
        recipe.ingredients = ingredient_rows.iter().map(ingredient_from_row).collect();
        Ok(recipe)
    }

    pub async fn count_recipes(&self, user_id: &str) -> Result<i64, AppError> {
        Ok(sqlx::query_scalar("SELECT COUNT(*) FROM recipes WHERE user_id = ?")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?)
    }

    /// Create a recipe and its ingredients in one transaction.
    pub async fn create_recipe(
        &self,
        user_id: &str,
        request: &CreateRecipeRequest,
    ) -> Result<Recipe, AppError> {
        let id = new_id();
        let now = now();
        let source = request.source.unwrap_or(RecipeSource::Manual);
        let description = non_blank(&request.description);

        let mut tx = self.pool.begin().await?;
        sqlx::query(&format!(
            "INSERT INTO recipes ({}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            RECIPE_COLUMNS
        ))
        .bind(&id)
        .bind(user_id)
        .bind(request.name.trim())
        .bind(&description)
        .bind(request.servings)
        .bind(request.prep_minutes)
        .bind(request.cook_minutes)
        .bind(to_json(&request.instructions)?)
        .bind(to_json(&request.tags)?)
        .bind(request.nutrition.calories)
        .bind(request.nutrition.protein_g)
        .bind(request.nutrition.carbs_g)
        .bind(request.nutrition.fat_g)
        .bind(source.as_str())
        .bind(&now)
        .bind(&now)
        .execute(&mut *tx)
        .await?;

        let ingredients = insert_ingredients(&mut tx, &id, &request.ingredients).await?;
        tx.commit().await?;

        Ok(Recipe {
            id,
            user_id: user_id.to_string(),
            name: request.name.trim().to_string(),
            description,
            servings: request.servings,
            prep_minutes: request.prep_minutes,
            cook_minutes: request.cook_minutes,
            instructions: request.instructions.clone(),
            tags: request.tags.clone(),
            nutrition: request.nutrition.clone(),
            source,
            ingredients,
            created_at: now.clone(),
            updated_at: now,
        })
    }

    /// Update a recipe. A present ingredient list replaces the stored one.
    pub async fn update_recipe(
        &self,
        user_id: &str,
        id: &str,
        request: &UpdateRecipeRequest,
    ) -> Result<Recipe, AppError> {
        let existing = self.get_recipe(user_id, id).await?;

        let description = if request.description.is_some() {
            non_blank(&request.description)
        } else {
            existing.description.clone()
        };
        let mut recipe = Recipe {
            name: request
                .name
                .as_deref()
                .map(|n| n.trim().to_string())
                .unwrap_or(existing.name),
            description,
            servings: request.servings.unwrap_or(existing.servings),
            prep_minutes: request.prep_minutes.or(existing.prep_minutes),
            cook_minutes: request.cook_minutes.or(existing.cook_minutes),
            instructions: request
                .instructions
                .clone()
                .unwrap_or(existing.instructions),
            tags: request.tags.clone().unwrap_or(existing.tags),
            nutrition: request.nutrition.clone().unwrap_or(existing.nutrition),
            updated_at: now(),
            ..existing
        };

        let mut tx = self.pool.begin().await?;
        sqlx::query(
            r#"UPDATE recipes SET name = ?, description = ?, servings = ?, prep_minutes = ?, cook_minutes = ?,
                  instructions = ?, tags = ?, calories = ?, protein_g = ?, carbs_g = ?, fat_g = ?, updated_at = ?
               WHERE id = ? AND user_id = ?"#,
        )
        .bind(&recipe.name)
        .bind(&recipe.description)
        .bind(recipe.servings)
        .bind(recipe.prep_minutes)
        .bind(recipe.cook_minutes)
        .bind(to_json(&recipe.instructions)?)
        .bind(to_json(&recipe.tags)?)
        .bind(recipe.nutrition.calories)
        .bind(recipe.nutrition.protein_g)
        .bind(recipe.nutrition.carbs_g)
        .bind(recipe.nutrition.fat_g)
        .bind(&recipe.updated_at)
        .bind(id)
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

        if let Some(ingredients) = &request.ingredients {
            sqlx::query("DELETE FROM recipe_ingredients WHERE recipe_id = ?")
                .bind(id)
                .execute(&mut *tx)
                .await?;
            recipe.ingredients = insert_ingredients(&mut tx, id, ingredients).await?;
        }

        tx.commit().await?;
        Ok(recipe)
    }

    /// Delete a recipe. Planned entries keep their title and lose the link.
    pub async fn delete_recipe(&self, user_id: &str, id: &str) -> Result<(), AppError> {
        self.get_recipe(user_id, id).await?;
        sqlx::query("DELETE FROM recipes WHERE id = ? AND user_id = ?")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

async fn insert_ingredients(
    tx: &mut Transaction<'_, Sqlite>,
    recipe_id: &str,
    inputs: &[IngredientInput],
) -> Result<Vec<RecipeIngredient>, AppError> {
    let mut ingredients = Vec::with_capacity(inputs.len());
    for (position, input) in inputs.iter().enumerate() {
        let ingredient = RecipeIngredient {
            id: new_id(),
            name: input.name.trim().to_string(),
            quantity: input.quantity,
            unit: canonical_unit(&input.unit),
            notes: non_blank(&input.notes),
            position: position as i64,
        };
        sqlx::query(
            "INSERT INTO recipe_ingredients (id, recipe_id, position, name, quantity, unit, notes) VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&ingredient.id)
        .bind(recipe_id)
        .bind(ingredient.position)
        .bind(&ingredient.name)
        .bind(ingredient.quantity)
        .bind(&ingredient.unit)
        .bind(&ingredient.notes)
        .execute(&mut **tx)
        .await?;
        ingredients.push(ingredient);
    }
    Ok(ingredients)
}

fn attach_ingredients(recipe_rows: &[SqliteRow], ingredient_rows: &[SqliteRow]) -> Vec<Recipe> {
    let mut by_recipe: HashMap<String, Vec<RecipeIngredient>> = HashMap::new();
    for row in ingredient_rows {
        by_recipe
            .entry(row.get("recipe_id"))
            .or_default()
            .push(ingredient_from_row(row));
    }
    recipe_rows
        .iter()
        .map(|row| {
            let mut recipe = recipe_from_row(row);
            recipe.ingredients = by_recipe.remove(&recipe.id).unwrap_or_default();
            recipe
        })
        .collect()
}

fn recipe_from_row(row: &SqliteRow) -> Recipe {
    let instructions: String = row.get("instructions");
    let tags: String = row.get("tags");
    let source: String = row.get("source");
    Recipe {
        id: row.get("id"),
        user_id: row.get("user_id"),
        name: row.get("name"),
        description: row.get("description"),
        servings: row.get("servings"),
        prep_minutes: row.get("prep_minutes"),
        cook_minutes: row.get("cook_minutes"),
        instructions: parse_json_array(&instructions),
        tags: parse_json_array(&tags),
        nutrition: NutritionFacts {
            calories: row.get("calories"),
            protein_g: row.get("protein_g"),
            carbs_g: row.get("carbs_g"),
            fat_g: row.get("fat_g"),
        },
        source: RecipeSource::parse(&source).unwrap_or(RecipeSource::Manual),
        ingredients: Vec::new(),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

fn ingredient_from_row(row: &SqliteRow) -> RecipeIngredient {
    RecipeIngredient {
        id: row.get("id"),
        name: row.get("name"),
        quantity: row.get("quantity"),
        unit: row.get("unit"),
        notes: row.get("notes"),
        position: row.get("position"),
    }
}
