//! Storage backends for drink persistence

mod file;

pub use file::FileStore;

use crate::{Drink, NewDrink};
use async_trait::async_trait;
use thiserror::Error;

/// Storage-related errors
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("drink not found: {0}")]
    NotFound(i64),

    #[error("drink title already exists: {0}")]
    DuplicateTitle(String),

    #[error("drink title must not be empty")]
    EmptyTitle,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Trait for drink storage backends.
///
/// The service treats the store as an external collaborator: it assigns
/// ids, enforces title uniqueness and provides whatever durability it can.
#[async_trait]
pub trait DrinkStore: Send + Sync {
    /// Insert a new drink, assigning the next id.
    async fn insert(&self, new: NewDrink) -> Result<Drink, StorageError>;

    /// Fetch every drink, ordered by id.
    async fn list(&self) -> Result<Vec<Drink>, StorageError>;

    /// Fetch a drink by id.
    async fn find(&self, id: i64) -> Result<Option<Drink>, StorageError>;

    /// Persist changes to an existing drink.
    async fn update(&self, drink: &Drink) -> Result<(), StorageError>;

    /// Remove a drink permanently.
    async fn delete(&self, id: i64) -> Result<(), StorageError>;

    /// Check that the backend is available and healthy.
    async fn health_check(&self) -> Result<(), StorageError>;
}

/// Seed the reference sample drink when the store is empty.
///
/// Idempotent; invoked once at process start under application control,
/// never as an import-time side effect.
pub async fn seed_sample_drinks(store: &dyn DrinkStore) -> Result<(), StorageError> {
    if !store.list().await?.is_empty() {
        return Ok(());
    }

    let sample = NewDrink {
        title: "chocolate milk".to_string(),
        recipe: vec![
            crate::Ingredient {
                name: "coffee".to_string(),
                color: "brown".to_string(),
                parts: 1,
            },
            crate::Ingredient {
                name: "milk".to_string(),
                color: "cream".to_string(),
                parts: 3,
            },
            crate::Ingredient {
                name: "foam".to_string(),
                color: "white".to_string(),
                parts: 1,
            },
        ],
    };

    let drink = store.insert(sample).await?;
    tracing::debug!(id = drink.id, title = %drink.title, "seeded sample drink");
    Ok(())
}
