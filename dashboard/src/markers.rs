use crate::map::{CircleMarker, MapSurface, MarkerHandle, PathStyle};
use crate::metrics::MARKERS;
use crate::model::TelemetrySnapshot;
use std::collections::{HashMap, HashSet};
use tracing::debug;

pub const RISK_COLOR: &str = "#FF0000";
pub const NORMAL_COLOR: &str = "#00AA00";
const MARKER_RADIUS_PX: f64 = 8.0;

pub fn marker_color(at_risk: bool) -> &'static str {
    if at_risk {
        RISK_COLOR
    } else {
        NORMAL_COLOR
    }
}

pub fn popup_text(snapshot: &TelemetrySnapshot) -> String {
    format!(
        "ID: {}\nTemp: {}°C\nBPM: {}\nRisk: {}",
        snapshot.entity_id,
        snapshot.temperature,
        snapshot.pulse,
        if snapshot.at_risk { "HIGH" } else { "Normal" }
    )
}

fn new_marker(snapshot: &TelemetrySnapshot) -> CircleMarker {
    let color = marker_color(snapshot.at_risk);
    CircleMarker {
        position: snapshot.position,
        radius_px: MARKER_RADIUS_PX,
        style: PathStyle {
            color: color.to_string(),
            fill_color: color.to_string(),
            weight: 1.0,
            opacity: 1.0,
            fill_opacity: 0.8,
        },
        popup: popup_text(snapshot),
    }
}

/// Entity id to marker mapping. Holds at most one marker per id.
#[derive(Debug, Default)]
pub struct MarkerRegistry {
    markers: HashMap<String, MarkerHandle>,
}

impl MarkerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    pub fn get(&self, entity_id: &str) -> Option<MarkerHandle> {
        self.markers.get(entity_id).copied()
    }

    /// Creates the marker for a new id or moves and restyles the existing one
    /// in place. Returns `true` when a marker was created.
    pub fn upsert<M: MapSurface>(&mut self, map: &mut M, snapshot: &TelemetrySnapshot) -> bool {
        let created = match self.markers.get(&snapshot.entity_id) {
            Some(&handle) => {
                map.set_marker_position(handle, snapshot.position);
                map.set_marker_color(handle, marker_color(snapshot.at_risk));
                map.set_marker_popup(handle, popup_text(snapshot));
                false
            }
            None => {
                let handle = map.add_marker(new_marker(snapshot));
                debug!("Created marker for {}", snapshot.entity_id);
                self.markers.insert(snapshot.entity_id.clone(), handle);
                true
            }
        };

        MARKERS.set(self.markers.len() as f64);
        created
    }

    /// Removes markers whose id is not in `live_ids`. Returns the evicted ids.
    pub fn evict_absent<M: MapSurface>(&mut self, map: &mut M, live_ids: &[String]) -> Vec<String> {
        let live: HashSet<&str> = live_ids.iter().map(String::as_str).collect();
        let stale: Vec<String> = self
            .markers
            .keys()
            .filter(|id| !live.contains(id.as_str()))
            .cloned()
            .collect();

        for id in &stale {
            if let Some(handle) = self.markers.remove(id) {
                map.remove_marker(handle);
                debug!("Evicted marker for {}", id);
            }
        }

        MARKERS.set(self.markers.len() as f64);
        stale
    }
}
