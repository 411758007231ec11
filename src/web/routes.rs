//! Request handlers for the drink resource

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::HeaderMap,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::auth::{
    PERM_DELETE_DRINKS, PERM_GET_DRINKS_DETAIL, PERM_PATCH_DRINKS, PERM_POST_DRINKS,
};
use crate::{Ingredient, NewDrink};

use super::error::ApiError;
use super::server::AppState;

#[derive(Serialize)]
pub struct DrinksResponse<T: Serialize> {
    pub success: bool,
    pub drinks: T,
}

#[derive(Serialize)]
pub struct DeleteResponse {
    pub success: bool,
    pub delete: i64,
}

#[derive(Deserialize)]
pub struct CreateDrinkRequest {
    pub title: String,
    pub recipe: Vec<Ingredient>,
}

#[derive(Deserialize)]
pub struct UpdateDrinkRequest {
    pub title: Option<String>,
}

/// `GET /drinks` - public listing, short views only.
pub async fn list_drinks(
    State(state): State<AppState>,
) -> Result<Json<DrinksResponse<Vec<crate::DrinkShort>>>, ApiError> {
    let drinks = state.store.list().await.map_err(|_| ApiError::internal())?;

    Ok(Json(DrinksResponse {
        success: true,
        drinks: drinks.iter().map(|d| d.short()).collect(),
    }))
}

/// `GET /drinks-detail` - long views, requires `get:drinks-detail`.
pub async fn drink_details(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<DrinksResponse<Vec<crate::DrinkLong>>>, ApiError> {
    state
        .verifier
        .authorize(&headers, PERM_GET_DRINKS_DETAIL)
        .await?;

    let drinks = state.store.list().await.map_err(|_| ApiError::internal())?;

    Ok(Json(DrinksResponse {
        success: true,
        drinks: drinks.iter().map(|d| d.long()).collect(),
    }))
}

/// `POST /drinks` - create a drink, requires `post:drinks`.
///
/// Returns the created record as a long view; a malformed body or a store
/// refusal (empty or duplicate title) is unprocessable.
pub async fn create_drink(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<CreateDrinkRequest>, JsonRejection>,
) -> Result<Json<DrinksResponse<crate::DrinkLong>>, ApiError> {
    state.verifier.authorize(&headers, PERM_POST_DRINKS).await?;

    let Json(request) = payload.map_err(|_| ApiError::unprocessable())?;

    let drink = state
        .store
        .insert(NewDrink {
            title: request.title,
            recipe: request.recipe,
        })
        .await
        .map_err(|_| ApiError::unprocessable())?;

    tracing::info!(id = drink.id, title = %drink.title, "drink created");

    Ok(Json(DrinksResponse {
        success: true,
        drinks: drink.long(),
    }))
}

/// `PATCH /drinks/{id}` - retitle a drink, requires `patch:drinks`.
///
/// Only `title` may change; the recipe is immutable after creation. The
/// title is validated before the lookup so a bad title is rejected with
/// 400 whether or not the drink exists.
pub async fn update_drink(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    headers: HeaderMap,
    payload: Result<Json<UpdateDrinkRequest>, JsonRejection>,
) -> Result<Json<DrinksResponse<Vec<crate::DrinkLong>>>, ApiError> {
    state
        .verifier
        .authorize(&headers, PERM_PATCH_DRINKS)
        .await?;

    let title = payload
        .ok()
        .and_then(|Json(request)| request.title)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ApiError::bad_request("title must be a non-empty string"))?;

    let mut drink = state
        .store
        .find(id)
        .await
        .map_err(|_| ApiError::unprocessable())?
        .ok_or_else(ApiError::not_found)?;

    drink.title = title;
    state
        .store
        .update(&drink)
        .await
        .map_err(|_| ApiError::unprocessable())?;

    tracing::info!(id = drink.id, title = %drink.title, "drink updated");

    Ok(Json(DrinksResponse {
        success: true,
        drinks: vec![drink.long()],
    }))
}

/// `DELETE /drinks/{id}` - remove a drink, requires `delete:drinks`.
pub async fn delete_drink(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    headers: HeaderMap,
) -> Result<Json<DeleteResponse>, ApiError> {
    state
        .verifier
        .authorize(&headers, PERM_DELETE_DRINKS)
        .await?;

    let drink = state
        .store
        .find(id)
        .await
        .map_err(|_| ApiError::internal())?
        .ok_or_else(ApiError::not_found)?;

    state
        .store
        .delete(drink.id)
        .await
        .map_err(|_| ApiError::internal())?;

    tracing::info!(id, "drink deleted");

    Ok(Json(DeleteResponse {
        success: true,
        delete: id,
    }))
}
