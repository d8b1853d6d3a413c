//! Core types for the coffee-shop service.
//!
//! This crate provides the identifiers shared by the store and the HTTP API.
//!
//! # Example
//!
//! ```
//! use coffee_shop_core::DrinkId;
//!
//! let id: DrinkId = "42".parse().unwrap();
//! assert_eq!(id.get(), 42);
//! assert_eq!(id.next(), DrinkId::new(43));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod ids;

pub use ids::{DrinkId, IdError};
