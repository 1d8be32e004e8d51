//! Tantivy-based recipe search index.
//!
//! Every document carries its owner's id as an untokenized term, and each
//! query is restricted to the caller's recipes.

use std::path::Path;
use std::sync::Arc;
use tantivy::collector::TopDocs;
use tantivy::query::{BooleanQuery, BoostQuery, Occur, Query, QueryParser, TermQuery};
use tantivy::schema::{Field, IndexRecordOption, Schema, Value, STORED, STRING, TEXT};
use tantivy::{doc, Index, IndexReader, IndexWriter, ReloadPolicy, TantivyDocument, Term};
use tokio::sync::RwLock;

use crate::errors::AppError;
use crate::models::Recipe;

const BOOST_NAME: f32 = 10.0;
const BOOST_INGREDIENTS: f32 = 6.0;
const BOOST_TAGS: f32 = 5.0;
const BOOST_DESCRIPTION: f32 = 3.0;

/// Search hit with relevance score.
#[derive(Debug, Clone)]
pub struct SearchResult {
    pub recipe_id: String,
    pub score: f32,
}

struct SearchFields {
    recipe_id: Field,
    user_id: Field,
    name: Field,
    description: Field,
    ingredients: Field,
    tags: Field,
}

/// Tantivy search index for recipes.
pub struct SearchIndex {
    index: Index,
    reader: IndexReader,
    writer: Arc<RwLock<IndexWriter>>,
    fields: SearchFields,
}

impl SearchIndex {
    /// Create or open a search index at the specified path.
    pub fn open(index_path: &Path) -> Result<Self, AppError> {
        std::fs::create_dir_all(index_path)
            .map_err(|e| AppError::Search(format!("Failed to create index directory: {}", e)))?;

        let mut schema_builder = Schema::builder();
        let recipe_id = schema_builder.add_text_field("recipe_id", STRING | STORED);
        let user_id = schema_builder.add_text_field("user_id", STRING);
        let name = schema_builder.add_text_field("name", TEXT | STORED);
        let description = schema_builder.add_text_field("description", TEXT);
        let ingredients = schema_builder.add_text_field("ingredients", TEXT);
        let tags = schema_builder.add_text_field("tags", TEXT);
        let schema = schema_builder.build();

        let fields = SearchFields {
            recipe_id,
            user_id,
            name,
            description,
            ingredients,
            tags,
        };

        let index = Index::open_in_dir(index_path)
            .or_else(|_| Index::create_in_dir(index_path, schema.clone()))
            .map_err(|e| AppError::Search(format!("Failed to open/create index: {}", e)))?;

        let reader = index
            .reader_builder()
            .reload_policy(ReloadPolicy::OnCommitWithDelay)
            .try_into()
            .map_err(|e| AppError::Search(format!("Failed to create reader: {}", e)))?;

        let writer = index
            .writer(50_000_000) // 50MB buffer
            .map_err(|e| AppError::Search(format!("Failed to create writer: {}", e)))?;

        Ok(Self {
            index,
            reader,
            writer: Arc::new(RwLock::new(writer)),
            fields,
        })
    }

    /// Replace the whole index with the given recipes.
    pub async fn rebuild(&self, recipes: &[Recipe]) -> Result<(), AppError> {
        let mut writer = self.writer.write().await;
        writer.delete_all_documents()?;
        for recipe in recipes {
            writer.add_document(self.create_document(recipe))?;
        }
        writer.commit()?;
        self.reader.reload()?;

        tracing::info!("Search index rebuilt with {} recipes", recipes.len());
        Ok(())
    }

    /// Add or replace one recipe.
    pub async fn index_recipe(&self, recipe: &Recipe) -> Result<(), AppError> {
        let mut writer = self.writer.write().await;
        writer.delete_term(Term::from_field_text(self.fields.recipe_id, &recipe.id));
        writer.add_document(self.create_document(recipe))?;
        writer.commit()?;
        self.reader.reload()?;
        Ok(())
    }

    pub async fn remove_recipe(&self, recipe_id: &str) -> Result<(), AppError> {
        let mut writer = self.writer.write().await;
        writer.delete_term(Term::from_field_text(self.fields.recipe_id, recipe_id));
        writer.commit()?;
        self.reader.reload()?;
        Ok(())
    }

    /// Search one user's recipes.
    pub fn search(
        &self,
        user_id: &str,
        query_str: &str,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<SearchResult>, AppError> {
        if query_str.trim().is_empty() {
            return Ok(Vec::new());
        }

        let searcher = self.reader.searcher();

        let field_queries = [
            (self.fields.name, BOOST_NAME),
            (self.fields.ingredients, BOOST_INGREDIENTS),
            (self.fields.tags, BOOST_TAGS),
            (self.fields.description, BOOST_DESCRIPTION),
        ];

        let mut text_queries: Vec<(Occur, Box<dyn Query>)> = Vec::new();
        for (field, boost) in field_queries {
            let mut parser = QueryParser::for_index(&self.index, vec![field]);
            parser.set_conjunction_by_default();
            let (field_query, _errors) = parser.parse_query_lenient(query_str);
            text_queries.push((Occur::Should, Box::new(BoostQuery::new(field_query, boost))));
        }

        let owner = TermQuery::new(
            Term::from_field_text(self.fields.user_id, user_id),
            IndexRecordOption::Basic,
        );
        let query = BooleanQuery::new(vec![
            (Occur::Must, Box::new(owner) as Box<dyn Query>),
            (Occur::Must, Box::new(BooleanQuery::new(text_queries))),
        ]);

        let top_docs = searcher
            .search(&query, &TopDocs::with_limit(limit + offset))
            .map_err(|e| AppError::Search(format!("Search failed: {}", e)))?;

        let results = top_docs
            .into_iter()
            .skip(offset)
            .take(limit)
            .filter_map(|(score, doc_address)| {
                let doc: TantivyDocument = searcher.doc(doc_address).ok()?;
                let recipe_id = doc.get_first(self.fields.recipe_id)?.as_str()?.to_string();
                Some(SearchResult { recipe_id, score })
            })
            .collect();

        Ok(results)
    }

    fn create_document(&self, recipe: &Recipe) -> TantivyDocument {
        let ingredients = recipe
            .ingredients
            .iter()
            .map(|i| i.name.as_str())
            .collect::<Vec<_>>()
            .join(" ");

        doc!(
            self.fields.recipe_id => recipe.id.clone(),
            self.fields.user_id => recipe.user_id.clone(),
            self.fields.name => recipe.name.clone(),
            self.fields.description => recipe.description.clone().unwrap_or_default(),
            self.fields.ingredients => ingredients,
            self.fields.tags => recipe.tags.join(" ")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NutritionFacts, RecipeIngredient, RecipeSource};
    use tempfile::TempDir;

    fn create_test_recipe(id: &str, user_id: &str, name: &str, ingredients: &[&str]) -> Recipe {
        Recipe {
            id: id.to_string(),
            user_id: user_id.to_string(),
            name: name.to_string(),
            description: None,
            servings: 2,
            prep_minutes: None,
            cook_minutes: None,
            instructions: Vec::new(),
            tags: vec!["dinner".to_string()],
            nutrition: NutritionFacts::default(),
            source: RecipeSource::Manual,
            ingredients: ingredients
                .iter()
                .enumerate()
                .map(|(i, name)| RecipeIngredient {
                    id: format!("{}-{}", id, i),
                    name: name.to_string(),
                    quantity: 1.0,
                    unit: "pcs".to_string(),
                    notes: None,
                    position: i as i64,
                })
                .collect(),
            created_at: "2024-01-01T00:00:00Z".to_string(),
            updated_at: "2024-01-01T00:00:00Z".to_string(),
        }
    }

    #[tokio::test]
    async fn test_search_by_name_and_ingredient() {
        let temp_dir = TempDir::new().unwrap();
        let index = SearchIndex::open(temp_dir.path()).unwrap();

        let recipes = vec![
            create_test_recipe("1", "u1", "Tomato Soup", &["tomato", "onion"]),
            create_test_recipe("2", "u1", "Pancakes", &["flour", "egg", "milk"]),
        ];
        index.rebuild(&recipes).await.unwrap();

        let results = index.search("u1", "soup", 10, 0).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].recipe_id, "1");

        let results = index.search("u1", "flour", 10, 0).unwrap();
        assert_eq!(results[0].recipe_id, "2");
    }

    #[tokio::test]
    async fn test_search_is_scoped_to_owner() {
        let temp_dir = TempDir::new().unwrap();
        let index = SearchIndex::open(temp_dir.path()).unwrap();

        index
            .rebuild(&[create_test_recipe("1", "u1", "Tomato Soup", &["tomato"])])
            .await
            .unwrap();

        assert!(index.search("u2", "tomato", 10, 0).unwrap().is_empty());
        assert_eq!(index.search("u1", "tomato", 10, 0).unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_reindex_and_remove() {
        let temp_dir = TempDir::new().unwrap();
        let index = SearchIndex::open(temp_dir.path()).unwrap();

        let mut recipe = create_test_recipe("1", "u1", "Tomato Soup", &["tomato"]);
        index.index_recipe(&recipe).await.unwrap();
        recipe.name = "Pumpkin Soup".to_string();
        index.index_recipe(&recipe).await.unwrap();

        assert_eq!(index.search("u1", "soup", 10, 0).unwrap().len(), 1);
        assert_eq!(index.search("u1", "pumpkin", 10, 0).unwrap().len(), 1);

        index.remove_recipe("1").await.unwrap();
        assert!(index.search("u1", "soup", 10, 0).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_search_empty_query() {
        let temp_dir = TempDir::new().unwrap();
        let index = SearchIndex::open(temp_dir.path()).unwrap();

        let results = index.search("u1", "", 10, 0).unwrap();
        assert!(results.is_empty());
    }
}
