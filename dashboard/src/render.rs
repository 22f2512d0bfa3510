use crate::model::{AlertRecord, TelemetrySnapshot};
use serde::Serialize;

pub const ALERTS_UNAVAILABLE: &str = "No connection or alerts available.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Badge {
    Danger,
    Success,
}

/// One row of the herd table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableRow {
    pub entity_id: String,
    pub position: String,
    pub temperature: String,
    pub badge: Badge,
    pub status: &'static str,
    pub pulse: String,
}

pub fn table_row(snapshot: &TelemetrySnapshot) -> TableRow {
    let (badge, status) = if snapshot.at_risk {
        (Badge::Danger, "HIGH")
    } else {
        (Badge::Success, "Normal")
    };

    TableRow {
        entity_id: snapshot.entity_id.clone(),
        position: format!(
            "{:.5}, {:.5}",
            snapshot.position.lat, snapshot.position.lng
        ),
        temperature: format!("{:.1}°C", snapshot.temperature),
        badge,
        status,
        pulse: format!("{} bpm", snapshot.pulse),
    }
}

/// Rows for the whole table, in snapshot order.
pub fn render_table(snapshots: &[TelemetrySnapshot]) -> Vec<TableRow> {
    snapshots.iter().map(table_row).collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Critical,
    Warning,
}

/// Geofence breaches and abnormally high or low readings are critical.
pub fn classify(alert: &AlertRecord) -> Severity {
    let kind = alert.alert_type.as_str();
    if kind == "Geocerca" || kind.contains("Alta") || kind.contains("Bajo") {
        Severity::Critical
    } else {
        Severity::Warning
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlertItem {
    pub severity: Severity,
    pub title: String,
    pub message: String,
    pub timestamp: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum AlertFeed {
    Items { items: Vec<AlertItem> },
    Unavailable { notice: &'static str },
}

impl Default for AlertFeed {
    fn default() -> Self {
        AlertFeed::Items { items: Vec::new() }
    }
}

impl AlertFeed {
    pub fn items(&self) -> &[AlertItem] {
        match self {
            AlertFeed::Items { items } => items,
            AlertFeed::Unavailable { .. } => &[],
        }
    }
}

/// `None` means the alert fetch failed this cycle.
pub fn render_alerts(alerts: Option<&[AlertRecord]>) -> AlertFeed {
    let Some(alerts) = alerts else {
        return AlertFeed::Unavailable {
            notice: ALERTS_UNAVAILABLE,
        };
    };

    let items = alerts
        .iter()
        .map(|alert| AlertItem {
            severity: classify(alert),
            title: format!("{} on entity {}", alert.alert_type, alert.entity_id),
            message: alert.message.clone(),
            timestamp: alert.ts.clone(),
        })
        .collect();

    AlertFeed::Items { items }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::LatLng;

    fn alert(kind: &str) -> AlertRecord {
        AlertRecord {
            alert_type: kind.to_string(),
            entity_id: "V1".to_string(),
            message: "...".to_string(),
            ts: "2025-01-01 10:00:00".to_string(),
        }
    }

    #[test]
    fn test_geofence_alert_is_critical() {
        assert_eq!(classify(&alert("Geocerca")), Severity::Critical);
    }

    #[test]
    fn test_high_and_low_readings_are_critical() {
        assert_eq!(classify(&alert("TemperaturaAlta")), Severity::Critical);
        assert_eq!(classify(&alert("PulsoBajo")), Severity::Critical);
    }

    #[test]
    fn test_other_alerts_are_warnings() {
        assert_eq!(classify(&alert("Temperatura Normal")), Severity::Warning);
        assert_eq!(classify(&alert("Bateria")), Severity::Warning);
    }

    #[test]
    fn test_render_alerts() {
        let feed = render_alerts(Some(&[alert("Geocerca")]));
        let items = feed.items();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].severity, Severity::Critical);
        assert_eq!(items[0].title, "Geocerca on entity V1");
        assert_eq!(items[0].timestamp, "2025-01-01 10:00:00");
    }

    #[test]
    fn test_failed_fetch_renders_notice() {
        assert_eq!(
            render_alerts(None),
            AlertFeed::Unavailable {
                notice: ALERTS_UNAVAILABLE
            }
        );
    }

    #[test]
    fn test_table_row_formatting() {
        let row = table_row(&TelemetrySnapshot {
            entity_id: "V1".to_string(),
            position: LatLng::new(20.111, -99.221),
            temperature: 39.24,
            pulse: 90,
            at_risk: true,
        });

        assert_eq!(row.entity_id, "V1");
        assert_eq!(row.position, "20.11100, -99.22100");
        assert_eq!(row.temperature, "39.2°C");
        assert_eq!(row.badge, Badge::Danger);
        assert_eq!(row.status, "HIGH");
        assert_eq!(row.pulse, "90 bpm");
    }
}
