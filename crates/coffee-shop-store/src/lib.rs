//! `RocksDB` storage layer for coffee-shop drinks.
//!
//! The HTTP API only reaches this crate after a request has been authorized,
//! so nothing here knows about tokens or permissions.
//!
//! # Architecture
//!
//! The storage uses the following column families:
//!
//! - `drinks`: Primary drink records, keyed by `drink_id`
//! - `drinks_by_title`: Unique title index
//! - `meta`: The drink id sequence
//!
//! # Example
//!
//! ```no_run
//! use coffee_shop_store::{sample_drink, RocksStore, Store};
//!
//! let store = RocksStore::open("/tmp/coffee-shop-db").unwrap();
//! let drink = store.insert_drink(sample_drink()).unwrap();
//! assert_eq!(store.get_drink(drink.id).unwrap(), Some(drink));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod keys;
pub mod rocks;
pub mod schema;
pub mod types;

pub use error::{Result, StoreError};
pub use rocks::RocksStore;
pub use types::{sample_drink, Drink, DrinkUpdate, Ingredient, NewDrink};

use coffee_shop_core::DrinkId;

/// The storage trait for drink records.
///
/// This trait abstracts the storage layer so the API can be tested against
/// any implementation.
pub trait Store: Send + Sync {
    /// List all drinks in id order.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn list_drinks(&self) -> Result<Vec<Drink>>;

    /// Get a drink by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_drink(&self, drink_id: DrinkId) -> Result<Option<Drink>>;

    /// Insert a new drink and allocate its id.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Conflict` if the title is already taken.
    fn insert_drink(&self, drink: NewDrink) -> Result<Drink>;

    /// Apply a partial update to an existing drink.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the drink doesn't exist, or
    /// `StoreError::Conflict` if the new title belongs to another drink.
    fn update_drink(&self, drink_id: DrinkId, update: DrinkUpdate) -> Result<Drink>;

    /// Delete a drink by ID.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the drink doesn't exist.
    fn delete_drink(&self, drink_id: DrinkId) -> Result<()>;

    /// Returns `true` if no drinks are stored.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn is_empty(&self) -> Result<bool>;
}
