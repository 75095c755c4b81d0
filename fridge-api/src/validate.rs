use crate::errors::ApiError;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_json::{Map, Value};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Shape checks for a telemetry payload. `deviceId` is required; typed
/// fields must have the right shape when present; unknown fields pass
/// through untouched.
pub fn validate_telemetry(payload: &Map<String, Value>) -> Result<(), ApiError> {
    match payload.get("deviceId") {
        None | Some(Value::Null) => return Err(ApiError::MissingField("deviceId")),
        Some(Value::String(s)) if s.is_empty() => return Err(ApiError::MissingField("deviceId")),
        Some(Value::String(_)) => {}
        Some(_) => {
            return Err(ApiError::InvalidPayload(
                "deviceId must be a string".to_string(),
            ))
        }
    }

    if let Some(temperature) = payload.get("temperature") {
        if !temperature.is_number() {
            return Err(ApiError::InvalidPayload(
                "temperature must be a number".to_string(),
            ));
        }
    }

    if let Some(timestamp) = payload.get("timestamp") {
        let ok = timestamp.as_str().is_some_and(is_iso8601);
        if !ok {
            return Err(ApiError::InvalidPayload(
                "timestamp must be an ISO-8601 string".to_string(),
            ));
        }
    }

    validate_id(payload)
}

/// Shape checks for an inventory payload. Unlike telemetry, `deviceId` is
/// optional here; the handler substitutes the default partition key before
/// validation runs when the field is absent.
pub fn validate_inventory(payload: &Map<String, Value>) -> Result<(), ApiError> {
    if let Some(device_id) = payload.get("deviceId") {
        match device_id {
            Value::String(s) if !s.is_empty() => {}
            _ => {
                return Err(ApiError::InvalidPayload(
                    "deviceId must be a non-empty string".to_string(),
                ))
            }
        }
    }

    if let Some(item_name) = payload.get("itemName") {
        if !item_name.is_string() {
            return Err(ApiError::InvalidPayload(
                "itemName must be a string".to_string(),
            ));
        }
    }

    if let Some(quantity) = payload.get("quantity") {
        if quantity.as_u64().is_none() {
            return Err(ApiError::InvalidPayload(
                "quantity must be a non-negative integer".to_string(),
            ));
        }
    }

    if let Some(expiration) = payload.get("expirationDate") {
        let ok = expiration
            .as_str()
            .is_some_and(|s| NaiveDate::parse_from_str(s, DATE_FORMAT).is_ok());
        if !ok {
            return Err(ApiError::InvalidPayload(
                "expirationDate must be a YYYY-MM-DD date".to_string(),
            ));
        }
    }

    validate_id(payload)
}

fn validate_id(payload: &Map<String, Value>) -> Result<(), ApiError> {
    if let Some(id) = payload.get("id") {
        match id {
            Value::String(s) if !s.is_empty() => {}
            _ => {
                return Err(ApiError::InvalidPayload(
                    "id must be a non-empty string".to_string(),
                ))
            }
        }
    }
    Ok(())
}

// Accepts both offset-carrying timestamps and the naive form some device
// clients emit.
fn is_iso8601(s: &str) -> bool {
    DateTime::parse_from_rfc3339(s).is_ok()
        || NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f").is_ok()
}
