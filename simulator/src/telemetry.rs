use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Reading published by a collar on `vaca/telemetria`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CowTelemetry {
    pub id_vaca: String,
    pub timestamp: DateTime<Utc>,
    pub lat: f64,
    pub lng: f64,
    pub area: String,
    pub temperatura: f64,
    pub pulso: u32,
    pub riesgo: bool,
}

impl CowTelemetry {
    /// Readings that should trip an alert downstream.
    pub fn is_alerting(&self) -> bool {
        self.riesgo || self.area != HOME_AREA
    }
}

pub const HOME_AREA: &str = "Potrero Norte";
pub const OUTSIDE_AREA: &str = "Fuera de Limites";
