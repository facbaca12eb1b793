//! Category service - user-scoped category management

use std::sync::Arc;

use uuid::Uuid;

use crate::adapters::duckdb::DuckDbRepository;
use crate::domain::result::{Error, Result};
use crate::domain::{validate_name, Category};

pub struct CategoryService {
    repository: Arc<DuckDbRepository>,
    user_id: String,
}

impl CategoryService {
    pub fn new(repository: Arc<DuckDbRepository>, user_id: impl Into<String>) -> Self {
        Self {
            repository,
            user_id: user_id.into(),
        }
    }

    pub fn list(&self) -> Result<Vec<Category>> {
        self.repository.list_categories(&self.user_id)
    }

    pub fn get(&self, id: Uuid) -> Result<Category> {
        self.repository.get_category(&self.user_id, id)
    }

    pub fn create(&self, name: &str) -> Result<Category> {
        let category = Category::new(&self.user_id, name.trim());
        category.validate().map_err(Error::validation)?;
        self.repository.insert_category(&category)?;
        Ok(category)
    }

    pub fn rename(&self, id: Uuid, name: &str) -> Result<Category> {
        let name = name.trim();
        validate_name(name).map_err(Error::validation)?;
        self.repository.rename_category(&self.user_id, id, name)
    }

    /// Delete a category; its transactions become uncategorized
    pub fn delete(&self, id: Uuid) -> Result<()> {
        self.repository.delete_category(&self.user_id, id)
    }

    pub fn bulk_delete(&self, ids: &[Uuid]) -> Result<Vec<Uuid>> {
        self.repository.bulk_delete_categories(&self.user_id, ids)
    }

    /// Look a category up by ID or by case-insensitive name
    pub fn resolve(&self, id_or_name: &str) -> Result<Category> {
        if let Ok(id) = Uuid::parse_str(id_or_name.trim()) {
            return self.get(id);
        }

        let wanted = id_or_name.trim().to_lowercase();
        self.list()?
            .into_iter()
            .find(|c| c.name.to_lowercase() == wanted)
            .ok_or_else(|| Error::not_found(format!("Category '{}'", id_or_name)))
    }
}
