//! Typed accessors for the telemetry API endpoints.
//!
//! Every accessor returns `None` when the fetch failed, when the payload is an
//! object carrying an `error` field, or when it does not have the expected
//! shape. Callers only ever see "data" or "unavailable this cycle".

use crate::fetch::DataSource;
use crate::metrics::FETCH_FAILURES_TOTAL;
use crate::model::{AlertRecord, GeofenceConfig, LatestResponse, TelemetrySnapshot};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::warn;

pub const GEOFENCE: &str = "/api/v1/geofence";
pub const ENTITY_IDS: &str = "/api/v1/vaca_ids";
pub const ALERTS: &str = "/api/v1/alertas";

pub fn latest_endpoint(entity_id: &str) -> String {
    format!("/api/v1/vaca/{}/latest", entity_id)
}

/// Decodes a fetched payload, treating error-flagged objects as missing.
pub fn decode<T: DeserializeOwned>(endpoint: &str, payload: Option<Value>) -> Option<T> {
    let value = payload?;

    if let Some(err) = value.as_object().and_then(|obj| obj.get("error")) {
        warn!("API reported an error for {}: {}", endpoint, err);
        FETCH_FAILURES_TOTAL.inc();
        return None;
    }

    match serde_json::from_value(value) {
        Ok(decoded) => Some(decoded),
        Err(e) => {
            warn!("Unexpected payload from {}: {}", endpoint, e);
            FETCH_FAILURES_TOTAL.inc();
            None
        }
    }
}

pub async fn geofence<D: DataSource>(source: &D) -> Option<GeofenceConfig> {
    decode(GEOFENCE, source.fetch(GEOFENCE).await)
}

pub async fn entity_ids<D: DataSource>(source: &D) -> Option<Vec<String>> {
    decode(ENTITY_IDS, source.fetch(ENTITY_IDS).await)
}

/// Latest reading of one entity; a response without `latest_data` counts as
/// unavailable.
pub async fn latest<D: DataSource>(source: &D, entity_id: &str) -> Option<TelemetrySnapshot> {
    let endpoint = latest_endpoint(entity_id);
    let response: LatestResponse = decode(&endpoint, source.fetch(&endpoint).await)?;
    let reading = response.latest_data?;
    Some(TelemetrySnapshot::from_reading(entity_id, reading))
}

/// Alert list; a malformed entry is dropped on its own instead of hiding the
/// whole feed.
pub async fn alerts<D: DataSource>(source: &D) -> Option<Vec<AlertRecord>> {
    let entries: Vec<Value> = decode(ALERTS, source.fetch(ALERTS).await)?;

    let alerts = entries
        .into_iter()
        .filter_map(|entry| match serde_json::from_value(entry) {
            Ok(alert) => Some(alert),
            Err(e) => {
                warn!("Skipping malformed alert from {}: {}", ALERTS, e);
                None
            }
        })
        .collect();
    Some(alerts)
}
