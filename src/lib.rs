//! Brewstand - a drinks-menu API with role-based access control
//!
//! Brewstand exposes CRUD operations over a single drink resource. Routes
//! are gated by permission strings carried in a bearer JWT issued by an
//! external identity provider; this service only verifies and authorizes
//! incoming tokens.

pub mod auth;
pub mod config;
pub mod storage;
pub mod web;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Sentinel `parts` value for an adjustable ingredient whose proportion is
/// hidden from viewers without the drinks-detail permission.
pub const HIDDEN_PARTS: i64 = -1;

/// One entry in a drink recipe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ingredient {
    pub name: String,
    pub color: String,
    pub parts: i64,
}

/// A drink on the menu.
///
/// Two projections are exposed over HTTP: [`Drink::short`] for public
/// listings and [`Drink::long`] for privileged viewers. Timestamps are
/// record metadata and never appear in either view.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Drink {
    /// Unique identifier, assigned by the store, never reused.
    pub id: i64,
    /// Display title, non-empty and unique across drinks.
    pub title: String,
    /// Ordered ingredient list.
    pub recipe: Vec<Ingredient>,
    /// When the drink was created.
    pub created_at: DateTime<Utc>,
    /// When the drink was last updated.
    pub updated_at: DateTime<Utc>,
}

/// A drink as submitted for creation, before the store assigns an id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewDrink {
    pub title: String,
    pub recipe: Vec<Ingredient>,
}

/// Restricted recipe entry: ingredient name withheld, hidden proportions
/// masked to `null`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShortIngredient {
    pub color: String,
    pub parts: Option<i64>,
}

/// Restricted drink representation for the public listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DrinkShort {
    pub id: i64,
    pub title: String,
    pub recipe: Vec<ShortIngredient>,
}

/// Full drink representation for viewers with elevated access.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DrinkLong {
    pub id: i64,
    pub title: String,
    pub recipe: Vec<Ingredient>,
}

impl Drink {
    /// Short view: `{id, title, recipe: [{color, parts}]}`.
    pub fn short(&self) -> DrinkShort {
        DrinkShort {
            id: self.id,
            title: self.title.clone(),
            recipe: self
                .recipe
                .iter()
                .map(|i| ShortIngredient {
                    color: i.color.clone(),
                    parts: if i.parts == HIDDEN_PARTS {
                        None
                    } else {
                        Some(i.parts)
                    },
                })
                .collect(),
        }
    }

    /// Long view: `{id, title, recipe: [{name, color, parts}]}`.
    pub fn long(&self) -> DrinkLong {
        DrinkLong {
            id: self.id,
            title: self.title.clone(),
            recipe: self.recipe.clone(),
        }
    }
}
