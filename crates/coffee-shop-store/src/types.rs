//! Drink records stored in the database.

use coffee_shop_core::DrinkId;
use serde::{Deserialize, Serialize};

/// One ingredient of a drink recipe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ingredient {
    /// Ingredient name, e.g. `"milk"`.
    pub name: String,
    /// Display color used by the frontend, e.g. `"grey"`.
    pub color: String,
    /// Relative number of parts in the drink.
    pub parts: u32,
}

/// A drink record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Drink {
    /// Store-allocated identifier.
    pub id: DrinkId,
    /// Unique title.
    pub title: String,
    /// Ordered recipe.
    pub recipe: Vec<Ingredient>,
}

/// Data for inserting a new drink.
#[derive(Debug, Clone)]
pub struct NewDrink {
    /// Unique title.
    pub title: String,
    /// Ordered recipe.
    pub recipe: Vec<Ingredient>,
}

/// A partial update; `None` fields are left unchanged.
#[derive(Debug, Clone, Default)]
pub struct DrinkUpdate {
    /// Replacement title.
    pub title: Option<String>,
    /// Replacement recipe.
    pub recipe: Option<Vec<Ingredient>>,
}

impl DrinkUpdate {
    /// Returns `true` if the update changes nothing.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.title.is_none() && self.recipe.is_none()
    }
}

impl Drink {
    /// Apply a partial update in place.
    pub fn apply(&mut self, update: DrinkUpdate) {
        if let Some(title) = update.title {
            self.title = title;
        }
        if let Some(recipe) = update.recipe {
            self.recipe = recipe;
        }
    }
}

/// The sample drink inserted by `SEED_DRINKS`.
#[must_use]
pub fn sample_drink() -> NewDrink {
    NewDrink {
        title: "water".to_string(),
        recipe: vec![Ingredient {
            name: "water".to_string(),
            color: "blue".to_string(),
            parts: 1,
        }],
    }
}
