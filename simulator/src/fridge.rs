use chrono::{DateTime, Duration, NaiveDate, Utc};
use rand::Rng;
use serde::Serialize;
use uuid::Uuid;

pub const SAFE_TEMP_MIN: f64 = 1.0;
pub const SAFE_TEMP_MAX: f64 = 5.0;

// Physical limits of the simulated compressor/ambient band.
const TEMP_FLOOR: f64 = -5.0;
const TEMP_CEIL: f64 = 15.0;

const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TelemetryReading {
    pub device_id: String,
    pub temperature: f64,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryItem {
    pub id: String,
    pub device_id: String,
    pub item_name: String,
    pub quantity: u32,
    pub expiration_date: String,
}

impl InventoryItem {
    fn new(device_id: &str, name: &str, quantity: u32, days_until_expiry: i64) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            device_id: device_id.to_string(),
            item_name: name.to_string(),
            quantity,
            expiration_date: (Utc::now() + Duration::days(days_until_expiry))
                .format(DATE_FORMAT)
                .to_string(),
        }
    }

    /// Days until the item expires, relative to `today`. Negative when past
    /// due, `None` when the date is unreadable.
    pub fn days_left(&self, today: NaiveDate) -> Option<i64> {
        NaiveDate::parse_from_str(&self.expiration_date, DATE_FORMAT)
            .ok()
            .map(|d| (d - today).num_days())
    }

    pub fn low_stock(&self) -> bool {
        self.quantity <= 1
    }
}

/// One simulated fridge: a drifting temperature and a local stock of items.
pub struct Fridge {
    pub device_id: String,
    temperature: f64,
    pub items: Vec<InventoryItem>,
}

impl Fridge {
    pub fn new(device_id: String, rng: &mut impl Rng) -> Self {
        let temperature = rng.gen_range(SAFE_TEMP_MIN..SAFE_TEMP_MAX);
        let items = vec![
            InventoryItem::new(&device_id, "Milk", 2, 3),
            InventoryItem::new(&device_id, "Eggs", 12, 10),
        ];
        Self {
            device_id,
            temperature,
            items,
        }
    }

    /// Drifts the temperature by up to ±0.5 °C, clamped to the physical band.
    pub fn step_temperature(&mut self, rng: &mut impl Rng) -> f64 {
        let delta = rng.gen_range(-0.5..0.5);
        self.temperature = (self.temperature + delta).clamp(TEMP_FLOOR, TEMP_CEIL);
        self.temperature
    }

    pub fn reading(&self) -> TelemetryReading {
        TelemetryReading {
            device_id: self.device_id.clone(),
            temperature: self.temperature,
            timestamp: Utc::now(),
        }
    }
}

pub fn out_of_safe_range(temperature: f64) -> bool {
    !(SAFE_TEMP_MIN..=SAFE_TEMP_MAX).contains(&temperature)
}
