use serde::Serialize;
use serde_json::{Map, Value};

/// Partition key assigned to inventory items posted without a `deviceId`.
pub const INVENTORY_DEFAULT_DEVICE: &str = "inventoryDefault";

/// Discriminator for the two record kinds sharing the collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Telemetry,
    Inventory,
}

impl DocumentKind {
    pub fn as_str(self) -> &'static str {
        match self {
            DocumentKind::Telemetry => "telemetry",
            DocumentKind::Inventory => "inventory",
        }
    }
}

/// A document ready for persistence. Identity and partition key are pulled
/// out for the store; `body` is the full wire representation including `id`,
/// `deviceId` and `type`, with client-supplied extras untouched.
#[derive(Debug, Clone)]
pub struct Document {
    pub id: String,
    pub device_id: String,
    pub kind: DocumentKind,
    pub body: Map<String, Value>,
}

/// Response wrapper for `GET /telemetry`.
#[derive(Debug, Serialize)]
pub struct TelemetryListResponse {
    pub telemetry_data: Vec<Value>,
}

/// Response wrapper for `GET /inventory`.
#[derive(Debug, Serialize)]
pub struct InventoryListResponse {
    pub inventory: Vec<Value>,
}

/// Response body for both POST endpoints.
#[derive(Debug, Serialize)]
pub struct CreatedResponse {
    pub message: &'static str,
    pub item: Value,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Recipe {
    pub recipe_name: &'static str,
    pub required_items: &'static [&'static str],
}

#[derive(Debug, Serialize)]
pub struct RecipeListResponse {
    pub recipes: &'static [Recipe],
}

/// Fixed suggestion list served by `GET /recipes`. Suggestions are not
/// derived from stored inventory.
pub const SAMPLE_RECIPES: &[Recipe] = &[
    Recipe {
        recipe_name: "Omelette",
        required_items: &["Eggs"],
    },
    Recipe {
        recipe_name: "Milkshake",
        required_items: &["Milk"],
    },
    Recipe {
        recipe_name: "Scrambled Eggs",
        required_items: &["Eggs", "Milk"],
    },
];
