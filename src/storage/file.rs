//! JSON-file-backed drink store
//!
//! Keeps the full menu in memory behind a lock and rewrites the backing
//! file on every mutation. Recipes are held in their storage form as
//! serialized JSON text and converted at the trait boundary.

use super::{DrinkStore, StorageError};
use crate::{Drink, Ingredient, NewDrink};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::fs;

/// A drink record in storage form.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredDrink {
    id: i64,
    title: String,
    /// Recipe as serialized JSON text.
    recipe: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl StoredDrink {
    fn from_drink(drink: &Drink) -> Result<Self, StorageError> {
        Ok(Self {
            id: drink.id,
            title: drink.title.clone(),
            recipe: serde_json::to_string(&drink.recipe)
                .map_err(|e| StorageError::Serialization(e.to_string()))?,
            created_at: drink.created_at,
            updated_at: drink.updated_at,
        })
    }

    fn into_drink(self) -> Result<Drink, StorageError> {
        let recipe: Vec<Ingredient> = serde_json::from_str(&self.recipe)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        Ok(Drink {
            id: self.id,
            title: self.title,
            recipe,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// On-disk format for the store file.
#[derive(Debug, Serialize, Deserialize)]
struct StoreFile {
    /// Version for future migrations.
    version: u32,
    /// Next id to assign; monotonic, so ids are never reused.
    next_id: i64,
    drinks: BTreeMap<i64, StoredDrink>,
}

#[derive(Debug)]
struct StoreCache {
    next_id: i64,
    drinks: BTreeMap<i64, StoredDrink>,
}

impl StoreCache {
    fn title_taken(&self, title: &str, excluding: Option<i64>) -> bool {
        self.drinks
            .values()
            .any(|d| d.title == title && Some(d.id) != excluding)
    }
}

/// File-based drink store.
pub struct FileStore {
    path: PathBuf,
    cache: RwLock<StoreCache>,
}

impl FileStore {
    /// Open the store at `path`, loading existing data if present.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let cache = if path.exists() {
            let content = fs::read_to_string(&path).await?;
            let file: StoreFile = serde_json::from_str(&content)
                .map_err(|e| StorageError::Serialization(e.to_string()))?;
            StoreCache {
                next_id: file.next_id,
                drinks: file.drinks,
            }
        } else {
            StoreCache {
                next_id: 1,
                drinks: BTreeMap::new(),
            }
        };

        let store = Self {
            path,
            cache: RwLock::new(cache),
        };
        store.save().await?;
        Ok(store)
    }

    /// Rewrite the backing file from the cache. Writes to a sibling temp
    /// file and renames it into place so a crash never leaves a torn file.
    async fn save(&self) -> Result<(), StorageError> {
        let content = {
            let cache = self.cache.read();
            let file = StoreFile {
                version: 1,
                next_id: cache.next_id,
                drinks: cache.drinks.clone(),
            };
            serde_json::to_string_pretty(&file)
                .map_err(|e| StorageError::Serialization(e.to_string()))?
        };

        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, content).await?;
        fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl DrinkStore for FileStore {
    async fn insert(&self, new: NewDrink) -> Result<Drink, StorageError> {
        if new.title.is_empty() {
            return Err(StorageError::EmptyTitle);
        }

        let stored = {
            let mut cache = self.cache.write();
            if cache.title_taken(&new.title, None) {
                return Err(StorageError::DuplicateTitle(new.title));
            }

            let now = Utc::now();
            let drink = Drink {
                id: cache.next_id,
                title: new.title,
                recipe: new.recipe,
                created_at: now,
                updated_at: now,
            };
            let stored = StoredDrink::from_drink(&drink)?;
            cache.next_id += 1;
            cache.drinks.insert(stored.id, stored.clone());
            stored
        };

        self.save().await?;
        stored.into_drink()
    }

    async fn list(&self) -> Result<Vec<Drink>, StorageError> {
        let stored: Vec<StoredDrink> = self.cache.read().drinks.values().cloned().collect();
        stored.into_iter().map(StoredDrink::into_drink).collect()
    }

    async fn find(&self, id: i64) -> Result<Option<Drink>, StorageError> {
        let stored = self.cache.read().drinks.get(&id).cloned();
        stored.map(StoredDrink::into_drink).transpose()
    }

    async fn update(&self, drink: &Drink) -> Result<(), StorageError> {
        if drink.title.is_empty() {
            return Err(StorageError::EmptyTitle);
        }

        {
            let mut cache = self.cache.write();
            if !cache.drinks.contains_key(&drink.id) {
                return Err(StorageError::NotFound(drink.id));
            }
            if cache.title_taken(&drink.title, Some(drink.id)) {
                return Err(StorageError::DuplicateTitle(drink.title.clone()));
            }

            let mut stored = StoredDrink::from_drink(drink)?;
            stored.updated_at = Utc::now();
            cache.drinks.insert(stored.id, stored);
        }

        self.save().await
    }

    async fn delete(&self, id: i64) -> Result<(), StorageError> {
        {
            let mut cache = self.cache.write();
            if cache.drinks.remove(&id).is_none() {
                return Err(StorageError::NotFound(id));
            }
        }

        self.save().await
    }

    async fn health_check(&self) -> Result<(), StorageError> {
        fs::metadata(&self.path).await?;
        Ok(())
    }
}
