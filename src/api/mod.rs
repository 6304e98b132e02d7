//! HTTP API
//!
//! Routes map one-to-one onto handlers in the submodules. Handlers only read
//! the pokedex, and only touch the item store through its append/list calls.

pub mod error;
pub mod items;
pub mod pokemon;
pub mod upload;

use axum::Json;
use axum::Router;
use axum::extract::{DefaultBodyLimit, Request};
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::{get, post};
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

use crate::pokedex::Pokedex;
use crate::store::ItemStore;

pub use upload::Uploads;

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
  pub pokedex: Arc<Pokedex>,
  pub store: Arc<ItemStore>,
  pub uploads: Arc<Uploads>,
}

impl AppState {
  pub fn new(pokedex: Pokedex, store: ItemStore, uploads: Uploads) -> Self {
    Self {
      pokedex: Arc::new(pokedex),
      store: Arc::new(store),
      uploads: Arc::new(uploads),
    }
  }
}

/// Build the router with all routes
pub fn router(state: AppState) -> Router {
  Router::new()
    .route("/", get(root))
    .route("/random-pokemon", get(pokemon::random_pokemon))
    .route("/get-pokemon", get(pokemon::get_pokemon))
    .route("/show-pokemons", get(pokemon::show_pokemons))
    .route("/add-item", post(items::add_item))
    .route("/show-items", get(items::show_items))
    // Uploads are streamed to disk, so no body cap applies
    .route(
      "/upload",
      post(upload::upload_file).layer(DefaultBodyLimit::disable()),
    )
    .layer(middleware::from_fn(log_request))
    .with_state(state)
}

/// Log every handled request and its outcome
async fn log_request(request: Request, next: Next) -> Response {
  let method = request.method().clone();
  let uri = request.uri().clone();
  info!("Received request: {} {}", method, uri);

  let started = Instant::now();
  let response = next.run(request).await;
  debug!(
    "Completed {} {} with {} in {:?}",
    method,
    uri,
    response.status(),
    started.elapsed()
  );
  response
}

/// GET /
async fn root() -> Json<Value> {
  Json(json!({ "message": "Pokedex service in Rust" }))
}
