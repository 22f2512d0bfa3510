use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};

/// Geographic point in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

/// Geofence parameters served by `/api/v1/geofence`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeofenceConfig {
    pub center: LatLng,
    pub radius_km: f64,
}

impl GeofenceConfig {
    pub fn radius_meters(&self) -> f64 {
        self.radius_km * 1000.0
    }
}

/// Last reading of one animal as stored by the backend.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LatestReading {
    pub lat: f64,
    pub lng: f64,
    pub temp: f64,
    #[serde(deserialize_with = "pulse_from_number")]
    pub pulso: u32,
    pub riesgo: bool,
}

/// Envelope returned by `/api/v1/vaca/{id}/latest`
#[derive(Debug, Clone, Deserialize)]
pub struct LatestResponse {
    pub latest_data: Option<LatestReading>,
}

/// Telemetry of one entity for the current render pass
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TelemetrySnapshot {
    pub entity_id: String,
    pub position: LatLng,
    pub temperature: f64,
    pub pulse: u32,
    pub at_risk: bool,
}

impl TelemetrySnapshot {
    pub fn from_reading(entity_id: impl Into<String>, reading: LatestReading) -> Self {
        Self {
            entity_id: entity_id.into(),
            position: LatLng::new(reading.lat, reading.lng),
            temperature: reading.temp,
            pulse: reading.pulso,
            at_risk: reading.riesgo,
        }
    }
}

/// One entry of `/api/v1/alertas`. Coordinates sent alongside are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertRecord {
    #[serde(rename = "tipo_alerta")]
    pub alert_type: String,
    #[serde(rename = "id_vaca")]
    pub entity_id: String,
    #[serde(rename = "mensaje", default, deserialize_with = "null_as_default")]
    pub message: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub ts: String,
}

/// Pulse may arrive as an integer or a float (`72.0`); rounded to whole bpm.
fn pulse_from_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    let bpm = f64::deserialize(deserializer)?;
    if !bpm.is_finite() || bpm < 0.0 || bpm > f64::from(u32::MAX) {
        return Err(de::Error::custom(format!("pulse out of range: {}", bpm)));
    }
    Ok(bpm.round() as u32)
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
