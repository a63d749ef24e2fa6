//! Demo catalog application.
//!
//! A small item API served by the bridge binary. Item creation goes through
//! the `Validated` extractor so the pipeline's validation options apply.

pub mod store;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Deserialize;

use crate::app::bootstrap::{Application, BootstrapError};
use crate::app::validation::{Field, Validate, Validated};
use crate::config::CatalogConfig;

pub use store::{Item, ItemStore};

const MAX_QUANTITY: u32 = 10_000;

/// The catalog application.
pub struct CatalogApp {
    config: CatalogConfig,
}

impl CatalogApp {
    pub fn new(config: CatalogConfig) -> Self {
        Self { config }
    }
}

impl Application for CatalogApp {
    async fn build(&self) -> Result<Router, BootstrapError> {
        let store = match &self.config.seed_path {
            Some(path) => ItemStore::load_seed(path).await?,
            None => ItemStore::new(),
        };
        Ok(routes(store))
    }
}

/// Catalog routes over a store.
pub fn routes(store: ItemStore) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/items", get(list_items).post(create_item))
        .route("/items/{id}", get(get_item))
        .with_state(store)
}

/// Payload for creating an item.
#[derive(Debug, Deserialize)]
pub struct NewItem {
    pub name: String,
    pub quantity: u32,
}

impl Validate for NewItem {
    const FIELDS: &'static [Field] = &[Field::text("name"), Field::integer("quantity")];

    fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if self.name.trim().is_empty() {
            errors.push("name should not be empty".to_string());
        }
        if self.quantity > MAX_QUANTITY {
            errors.push(format!("quantity must not be greater than {}", MAX_QUANTITY));
        }
        errors
    }
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn list_items(State(store): State<ItemStore>) -> Json<Vec<Item>> {
    Json(store.list())
}

async fn get_item(State(store): State<ItemStore>, Path(id): Path<u64>) -> Response {
    match store.get(id) {
        Some(item) => Json(item).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({
                "statusCode": 404,
                "message": format!("item {} not found", id),
            })),
        )
            .into_response(),
    }
}

async fn create_item(
    State(store): State<ItemStore>,
    Validated(payload): Validated<NewItem>,
) -> (StatusCode, Json<Item>) {
    let item = store.create(payload.name, payload.quantity);
    tracing::info!(id = item.id, "Item created");
    (StatusCode::CREATED, Json(item))
}
