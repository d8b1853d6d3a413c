//! Drink menu endpoints.
//!
//! `GET /drinks` is public and returns the short representation. Every other
//! endpoint sits behind a permission layer and returns the long one.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};

use coffee_shop_auth::{TokenVerifier, ValidatedClaims};
use coffee_shop_core::DrinkId;
use coffee_shop_store::{Drink, DrinkUpdate, Ingredient, NewDrink, Store};

use crate::error::ApiError;
use crate::state::AppState;

// =============================================================================
// Request/Response Types
// =============================================================================

/// Recipe entry in the public representation: no ingredient names.
#[derive(Debug, Serialize)]
pub struct ShortIngredient {
    /// Display color.
    pub color: String,
    /// Relative number of parts.
    pub parts: u32,
}

/// Public drink representation.
#[derive(Debug, Serialize)]
pub struct DrinkShort {
    /// Drink ID.
    pub id: DrinkId,
    /// Title.
    pub title: String,
    /// Recipe without ingredient names.
    pub recipe: Vec<ShortIngredient>,
}

impl From<Drink> for DrinkShort {
    fn from(drink: Drink) -> Self {
        Self {
            id: drink.id,
            title: drink.title,
            recipe: drink
                .recipe
                .into_iter()
                .map(|ingredient| ShortIngredient {
                    color: ingredient.color,
                    parts: ingredient.parts,
                })
                .collect(),
        }
    }
}

/// Full drink representation for staff.
#[derive(Debug, Serialize)]
pub struct DrinkLong {
    /// Drink ID.
    pub id: DrinkId,
    /// Title.
    pub title: String,
    /// Full recipe.
    pub recipe: Vec<Ingredient>,
}

impl From<Drink> for DrinkLong {
    fn from(drink: Drink) -> Self {
        Self {
            id: drink.id,
            title: drink.title,
            recipe: drink.recipe,
        }
    }
}

/// Response carrying a list of drinks.
#[derive(Debug, Serialize)]
pub struct DrinksResponse<T> {
    /// Always `true`.
    pub success: bool,
    /// The drinks.
    pub drinks: Vec<T>,
}

impl<T> DrinksResponse<T> {
    fn new(drinks: Vec<T>) -> Self {
        Self {
            success: true,
            drinks,
        }
    }
}

/// Response for a deleted drink.
#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    /// Always `true`.
    pub success: bool,
    /// The deleted drink's ID.
    pub delete: DrinkId,
}

/// Ingredient as sent by clients.
#[derive(Debug, Deserialize)]
pub struct IngredientBody {
    /// Ingredient name.
    pub name: String,
    /// Display color.
    pub color: String,
    /// Relative number of parts.
    pub parts: u32,
}

/// A recipe given either as one ingredient or as a list.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum RecipeBody {
    /// A single ingredient object.
    One(IngredientBody),
    /// A list of ingredients.
    Many(Vec<IngredientBody>),
}

/// Request to create a drink.
#[derive(Debug, Deserialize)]
pub struct CreateDrinkBody {
    /// Unique title.
    #[serde(default)]
    pub title: Option<String>,
    /// Recipe.
    #[serde(default)]
    pub recipe: Option<RecipeBody>,
}

/// Request to update a drink. At least one field must be present.
#[derive(Debug, Deserialize)]
pub struct UpdateDrinkBody {
    /// Replacement title.
    #[serde(default)]
    pub title: Option<String>,
    /// Replacement recipe.
    #[serde(default)]
    pub recipe: Option<RecipeBody>,
}

// =============================================================================
// Handlers
// =============================================================================

/// List drinks in the short representation.
///
/// `GET /drinks` (public)
///
/// # Errors
///
/// Returns an internal error if the store cannot be read.
pub async fn list_drinks<S, V>(
    State(state): State<Arc<AppState<S, V>>>,
) -> Result<Json<DrinksResponse<DrinkShort>>, ApiError>
where
    S: Store + 'static,
    V: TokenVerifier + 'static,
{
    let drinks = state.store.list_drinks()?;
    Ok(Json(DrinksResponse::new(
        drinks.into_iter().map(DrinkShort::from).collect(),
    )))
}

/// List drinks in the long representation.
///
/// `GET /drinks-detail` (requires `get:drinks-detail`)
///
/// # Errors
///
/// Returns an internal error if the store cannot be read.
pub async fn list_drinks_detail<S, V>(
    State(state): State<Arc<AppState<S, V>>>,
    Extension(claims): Extension<ValidatedClaims>,
) -> Result<Json<DrinksResponse<DrinkLong>>, ApiError>
where
    S: Store + 'static,
    V: TokenVerifier + 'static,
{
    tracing::debug!(subject = %claims.subject(), "Listing drink details");
    let drinks = state.store.list_drinks()?;
    Ok(Json(DrinksResponse::new(
        drinks.into_iter().map(DrinkLong::from).collect(),
    )))
}

/// Create a drink.
///
/// `POST /drinks` (requires `post:drinks`)
///
/// # Errors
///
/// Returns `BadRequest` for a missing or empty title or recipe, and
/// `Unprocessable` if the title is taken.
pub async fn create_drink<S, V>(
    State(state): State<Arc<AppState<S, V>>>,
    Extension(claims): Extension<ValidatedClaims>,
    body: Result<Json<CreateDrinkBody>, JsonRejection>,
) -> Result<Json<DrinksResponse<DrinkLong>>, ApiError>
where
    S: Store + 'static,
    V: TokenVerifier + 'static,
{
    let Json(body) = body?;
    let title = body
        .title
        .ok_or_else(|| ApiError::BadRequest("title is required".to_string()))
        .and_then(validate_title)?;
    let recipe = body
        .recipe
        .ok_or_else(|| ApiError::BadRequest("recipe is required".to_string()))
        .and_then(validate_recipe)?;

    let drink = state.store.insert_drink(NewDrink { title, recipe })?;
    tracing::info!(
        subject = %claims.subject(),
        drink_id = %drink.id,
        title = %drink.title,
        "Drink created"
    );

    Ok(Json(DrinksResponse::new(vec![DrinkLong::from(drink)])))
}

/// Update a drink's title and/or recipe.
///
/// `PATCH /drinks/:drink_id` (requires `patch:drinks`)
///
/// # Errors
///
/// Returns `NotFound` for an unknown id (checked before the body),
/// `BadRequest` for an empty update or empty fields, and `Unprocessable` if
/// the new title is taken.
pub async fn update_drink<S, V>(
    State(state): State<Arc<AppState<S, V>>>,
    Extension(claims): Extension<ValidatedClaims>,
    Path(drink_id): Path<String>,
    body: Result<Json<UpdateDrinkBody>, JsonRejection>,
) -> Result<Json<DrinksResponse<DrinkLong>>, ApiError>
where
    S: Store + 'static,
    V: TokenVerifier + 'static,
{
    let drink_id = parse_drink_id(&drink_id)?;
    // Unknown drinks are reported before anything about the body
    if state.store.get_drink(drink_id)?.is_none() {
        return Err(ApiError::NotFound(format!("drink {drink_id}")));
    }
    let Json(body) = body?;

    let update = DrinkUpdate {
        title: body.title.map(validate_title).transpose()?,
        recipe: body.recipe.map(validate_recipe).transpose()?,
    };
    if update.is_empty() {
        return Err(ApiError::BadRequest(
            "provide a title or a recipe to update".to_string(),
        ));
    }

    let drink = state.store.update_drink(drink_id, update)?;
    tracing::info!(subject = %claims.subject(), drink_id = %drink_id, "Drink updated");

    Ok(Json(DrinksResponse::new(vec![DrinkLong::from(drink)])))
}

/// Delete a drink.
///
/// `DELETE /drinks/:drink_id` (requires `delete:drinks`)
///
/// # Errors
///
/// Returns `NotFound` for an unknown id.
pub async fn delete_drink<S, V>(
    State(state): State<Arc<AppState<S, V>>>,
    Extension(claims): Extension<ValidatedClaims>,
    Path(drink_id): Path<String>,
) -> Result<Json<DeleteResponse>, ApiError>
where
    S: Store + 'static,
    V: TokenVerifier + 'static,
{
    let drink_id = parse_drink_id(&drink_id)?;
    state.store.delete_drink(drink_id)?;
    tracing::info!(subject = %claims.subject(), drink_id = %drink_id, "Drink deleted");

    Ok(Json(DeleteResponse {
        success: true,
        delete: drink_id,
    }))
}

// =============================================================================
// Helpers
// =============================================================================

fn parse_drink_id(raw: &str) -> Result<DrinkId, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::NotFound(format!("drink {raw}")))
}

fn validate_title(title: String) -> Result<String, ApiError> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(ApiError::BadRequest("title must not be empty".to_string()));
    }
    Ok(trimmed.to_string())
}

fn validate_recipe(recipe: RecipeBody) -> Result<Vec<Ingredient>, ApiError> {
    let ingredients = match recipe {
        RecipeBody::One(ingredient) => vec![ingredient],
        RecipeBody::Many(ingredients) => ingredients,
    };
    if ingredients.is_empty() {
        return Err(ApiError::BadRequest("recipe must not be empty".to_string()));
    }

    ingredients
        .into_iter()
        .map(|ingredient| {
            if ingredient.name.trim().is_empty() {
                return Err(ApiError::BadRequest(
                    "ingredient name must not be empty".to_string(),
                ));
            }
            Ok(Ingredient {
                name: ingredient.name,
                color: ingredient.color,
                parts: ingredient.parts,
            })
        })
        .collect()
}
