use crate::model::LatLng;
use serde::Serialize;
use std::collections::BTreeMap;

pub const DEFAULT_ZOOM: u8 = 16;

/// Opaque reference to a marker owned by a [`MapSurface`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct MarkerHandle(pub u64);

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TileLayer {
    pub url_template: String,
    pub max_zoom: u8,
    pub attribution: String,
}

impl TileLayer {
    pub fn openstreetmap() -> Self {
        Self {
            url_template: "https://tile.openstreetmap.org/{z}/{x}/{y}.png".to_string(),
            max_zoom: 19,
            attribution: "&copy; <a href=\"http://www.openstreetmap.org/copyright\">OpenStreetMap</a>"
                .to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PathStyle {
    pub color: String,
    pub fill_color: String,
    pub weight: f64,
    pub opacity: f64,
    pub fill_opacity: f64,
}

/// Circle sized in metres, drawn under the markers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CircleOverlay {
    pub center: LatLng,
    pub radius_m: f64,
    pub style: PathStyle,
    pub popup: String,
}

/// Circle marker sized in pixels.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CircleMarker {
    pub position: LatLng,
    pub radius_px: f64,
    pub style: PathStyle,
    pub popup: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MapView {
    pub center: LatLng,
    pub zoom: u8,
}

/// The map widget the dashboard draws on.
pub trait MapSurface: Send + Sync {
    /// Creates a map showing `view`.
    fn open(view: MapView) -> Self
    where
        Self: Sized;

    fn add_tile_layer(&mut self, layer: TileLayer);

    fn add_overlay(&mut self, overlay: CircleOverlay);

    fn add_marker(&mut self, marker: CircleMarker) -> MarkerHandle;

    fn set_marker_position(&mut self, handle: MarkerHandle, position: LatLng);

    /// Changes stroke and fill color, leaving the other style fields alone.
    fn set_marker_color(&mut self, handle: MarkerHandle, color: &str);

    fn set_marker_popup(&mut self, handle: MarkerHandle, popup: String);

    fn remove_marker(&mut self, handle: MarkerHandle);

    /// Recomputes the map size after the container settled.
    fn invalidate_size(&mut self);

    fn set_view(&mut self, view: MapView);
}

/// Headless [`MapSurface`] that keeps the whole map state in memory.
#[derive(Debug, Clone, Serialize)]
pub struct SceneMap {
    pub view: MapView,
    pub tile_layer: Option<TileLayer>,
    pub overlays: Vec<CircleOverlay>,
    pub markers: BTreeMap<MarkerHandle, CircleMarker>,
    /// Bumped by every `invalidate_size` call.
    pub size_generation: u32,
    #[serde(skip)]
    next_handle: u64,
}

impl SceneMap {
    pub fn marker(&self, handle: MarkerHandle) -> Option<&CircleMarker> {
        self.markers.get(&handle)
    }

    pub fn marker_count(&self) -> usize {
        self.markers.len()
    }
}

impl MapSurface for SceneMap {
    fn open(view: MapView) -> Self {
        Self {
            view,
            tile_layer: None,
            overlays: Vec::new(),
            markers: BTreeMap::new(),
            size_generation: 0,
            next_handle: 0,
        }
    }

    fn add_tile_layer(&mut self, layer: TileLayer) {
        self.tile_layer = Some(layer);
    }

    fn add_overlay(&mut self, overlay: CircleOverlay) {
        self.overlays.push(overlay);
    }

    fn add_marker(&mut self, marker: CircleMarker) -> MarkerHandle {
        let handle = MarkerHandle(self.next_handle);
        self.next_handle += 1;
        self.markers.insert(handle, marker);
        handle
    }

    fn set_marker_position(&mut self, handle: MarkerHandle, position: LatLng) {
        if let Some(marker) = self.markers.get_mut(&handle) {
            marker.position = position;
        }
    }

    fn set_marker_color(&mut self, handle: MarkerHandle, color: &str) {
        if let Some(marker) = self.markers.get_mut(&handle) {
            marker.style.color = color.to_string();
            marker.style.fill_color = color.to_string();
        }
    }

    fn set_marker_popup(&mut self, handle: MarkerHandle, popup: String) {
        if let Some(marker) = self.markers.get_mut(&handle) {
            marker.popup = popup;
        }
    }

    fn remove_marker(&mut self, handle: MarkerHandle) {
        self.markers.remove(&handle);
    }

    fn invalidate_size(&mut self) {
        self.size_generation += 1;
    }

    fn set_view(&mut self, view: MapView) {
        self.view = view;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openstreetmap_layer_links_copyright() {
        let layer = TileLayer::openstreetmap();
        assert_eq!(layer.max_zoom, 19);
        assert!(layer
            .attribution
            .contains("href=\"http://www.openstreetmap.org/copyright\""));
        assert!(layer.attribution.starts_with("&copy; "));
    }

    fn marker_at(lat: f64, lng: f64) -> CircleMarker {
        CircleMarker {
            position: LatLng::new(lat, lng),
            radius_px: 8.0,
            style: PathStyle {
                color: "#00AA00".to_string(),
                fill_color: "#00AA00".to_string(),
                weight: 1.0,
                opacity: 1.0,
                fill_opacity: 0.8,
            },
            popup: String::new(),
        }
    }

    #[test]
    fn test_handles_stay_unique_after_removal() {
        let mut map = SceneMap::open(MapView {
            center: LatLng::new(0.0, 0.0),
            zoom: DEFAULT_ZOOM,
        });

        let first = map.add_marker(marker_at(1.0, 1.0));
        map.remove_marker(first);
        let second = map.add_marker(marker_at(2.0, 2.0));

        assert_ne!(first, second);
        assert!(map.marker(first).is_none());
        assert_eq!(map.marker_count(), 1);
    }

    #[test]
    fn test_set_marker_color_keeps_opacity() {
        let mut map = SceneMap::open(MapView {
            center: LatLng::new(0.0, 0.0),
            zoom: DEFAULT_ZOOM,
        });
        let handle = map.add_marker(marker_at(1.0, 1.0));

        map.set_marker_color(handle, "#FF0000");

        let marker = map.marker(handle).unwrap();
        assert_eq!(marker.style.color, "#FF0000");
        assert_eq!(marker.style.fill_color, "#FF0000");
        assert_eq!(marker.style.fill_opacity, 0.8);
    }
}
