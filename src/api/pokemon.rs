use axum::Json;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use serde::Deserialize;
use serde_json::{Value, json};
use std::collections::BTreeMap;
use tracing::{debug, warn};

use super::AppState;
use super::error::ApiError;

fn default_poke_id() -> i64 {
  1
}

/// Query of GET /get-pokemon
#[derive(Debug, Deserialize)]
pub struct PokemonQuery {
  #[serde(default = "default_poke_id")]
  pub poke_id: i64,
}

/// GET /random-pokemon
pub async fn random_pokemon(
  State(state): State<AppState>,
) -> Result<Json<(String, String)>, ApiError> {
  let mut rng = rand::rng();
  let (id, name) = state
    .pokedex
    .random_entry(&mut rng)
    .ok_or_else(|| ApiError::NotFound("Your pokedex is empty".to_string()))?;

  debug!("Random pokemon: {} {}", id, name);
  Ok(Json((id.to_string(), name.to_string())))
}

/// GET /get-pokemon?poke_id=N
pub async fn get_pokemon(
  State(state): State<AppState>,
  query: Result<Query<PokemonQuery>, QueryRejection>,
) -> Result<Json<BTreeMap<String, String>>, ApiError> {
  let Query(query) = query.map_err(|e| ApiError::Validation(e.body_text()))?;

  match state.pokedex.lookup(query.poke_id) {
    Ok((id, name)) => Ok(Json(BTreeMap::from([(id.to_string(), name.to_string())]))),
    Err(e) => {
      warn!("Pokemon lookup missed: {}", e);
      Err(e.into())
    }
  }
}

/// GET /show-pokemons
pub async fn show_pokemons(State(state): State<AppState>) -> Json<Value> {
  Json(json!({ "This is my pokedex": state.pokedex.entries() }))
}
