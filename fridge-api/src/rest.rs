use crate::errors::ApiError;
use crate::metrics::{HTTP_REQUESTS_TOTAL, INVENTORY_CREATED_TOTAL, TELEMETRY_CREATED_TOTAL};
use crate::model::{
    CreatedResponse, Document, DocumentKind, InventoryListResponse, RecipeListResponse,
    TelemetryListResponse, INVENTORY_DEFAULT_DEVICE, SAMPLE_RECIPES,
};
use crate::store::DocumentStore;
use crate::validate;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

#[derive(Clone)]
struct AppState {
    store: Arc<dyn DocumentStore>,
}

pub fn create_router(store: Arc<dyn DocumentStore>) -> Router {
    let state = AppState { store };

    Router::new()
        .route("/", get(home))
        .route("/telemetry", get(list_telemetry).post(create_telemetry))
        .route("/inventory", get(list_inventory).post(create_inventory))
        .route("/recipes", get(list_recipes))
        .with_state(state)
}

async fn home() -> &'static str {
    HTTP_REQUESTS_TOTAL.inc();
    "Welcome to the Smart Fridge REST API"
}

async fn list_telemetry(
    State(state): State<AppState>,
) -> Result<Json<TelemetryListResponse>, ApiError> {
    HTTP_REQUESTS_TOTAL.inc();
    let items = state.store.list(DocumentKind::Telemetry).await?;
    Ok(Json(TelemetryListResponse {
        telemetry_data: items,
    }))
}

async fn create_telemetry(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<(StatusCode, Json<CreatedResponse>), ApiError> {
    HTTP_REQUESTS_TOTAL.inc();
    let payload = parse_object(&body)?;
    validate::validate_telemetry(&payload)?;

    let doc = into_document(payload, DocumentKind::Telemetry);
    debug!(
        "Creating telemetry document {} for device {}",
        doc.id, doc.device_id
    );

    let item = state.store.create(&doc).await?;
    TELEMETRY_CREATED_TOTAL.inc();

    Ok((
        StatusCode::CREATED,
        Json(CreatedResponse {
            message: "Telemetry added",
            item,
        }),
    ))
}

async fn list_inventory(
    State(state): State<AppState>,
) -> Result<Json<InventoryListResponse>, ApiError> {
    HTTP_REQUESTS_TOTAL.inc();
    let items = state.store.list(DocumentKind::Inventory).await?;
    Ok(Json(InventoryListResponse { inventory: items }))
}

async fn create_inventory(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<(StatusCode, Json<CreatedResponse>), ApiError> {
    HTTP_REQUESTS_TOTAL.inc();
    let mut payload = parse_object(&body)?;

    // Un-scoped items all land under one partition key instead of being
    // rejected, unlike the telemetry endpoint.
    if !payload.contains_key("deviceId") {
        payload.insert(
            "deviceId".to_string(),
            Value::String(INVENTORY_DEFAULT_DEVICE.to_string()),
        );
    }
    validate::validate_inventory(&payload)?;

    let doc = into_document(payload, DocumentKind::Inventory);
    debug!(
        "Creating inventory document {} for device {}",
        doc.id, doc.device_id
    );

    let item = state.store.create(&doc).await?;
    INVENTORY_CREATED_TOTAL.inc();

    Ok((
        StatusCode::CREATED,
        Json(CreatedResponse {
            message: "Item added",
            item,
        }),
    ))
}

async fn list_recipes() -> Json<RecipeListResponse> {
    HTTP_REQUESTS_TOTAL.inc();
    Json(RecipeListResponse {
        recipes: SAMPLE_RECIPES,
    })
}

fn parse_object(body: &Bytes) -> Result<Map<String, Value>, ApiError> {
    let value: Value = serde_json::from_slice(body)
        .map_err(|e| ApiError::InvalidPayload(format!("body is not valid JSON: {}", e)))?;
    match value {
        Value::Object(map) => Ok(map),
        _ => Err(ApiError::InvalidPayload(
            "body must be a JSON object".to_string(),
        )),
    }
}

/// Stamps the server-owned fields and pulls out the document identity.
/// `type` is always overwritten; `id` is generated when the client did not
/// supply one.
fn into_document(mut payload: Map<String, Value>, kind: DocumentKind) -> Document {
    let id = match payload.get("id").and_then(Value::as_str) {
        Some(id) => id.to_string(),
        None => {
            let id = Uuid::new_v4().to_string();
            payload.insert("id".to_string(), Value::String(id.clone()));
            id
        }
    };

    payload.insert(
        "type".to_string(),
        Value::String(kind.as_str().to_string()),
    );

    // Validation or defaulting guarantees a non-empty partition key here.
    let device_id = payload
        .get("deviceId")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    Document {
        id,
        device_id,
        kind,
        body: payload,
    }
}
