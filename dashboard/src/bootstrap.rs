use crate::api;
use crate::fetch::DataSource;
use crate::map::{CircleOverlay, MapSurface, MapView, PathStyle, TileLayer, DEFAULT_ZOOM};
use crate::model::{GeofenceConfig, LatLng};
use crate::session::Session;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, error, info};

/// Pasture shown when the geofence configuration cannot be fetched.
pub const FALLBACK_CENTER: LatLng = LatLng::new(20.11, -99.22);

pub fn geofence_overlay(geofence: &GeofenceConfig) -> CircleOverlay {
    CircleOverlay {
        center: geofence.center,
        radius_m: geofence.radius_meters(),
        style: PathStyle {
            color: "red".to_string(),
            fill_color: "#f03".to_string(),
            weight: 3.0,
            opacity: 1.0,
            fill_opacity: 0.15,
        },
        popup: format!("Geofence: {} km", geofence.radius_km),
    }
}

/// Creates the map for `geofence`, or the fallback view without overlay.
pub fn build_map<M: MapSurface>(geofence: Option<&GeofenceConfig>) -> M {
    let center = geofence.map_or(FALLBACK_CENTER, |g| g.center);
    let mut map = M::open(MapView {
        center,
        zoom: DEFAULT_ZOOM,
    });
    map.add_tile_layer(TileLayer::openstreetmap());

    if let Some(geofence) = geofence {
        map.add_overlay(geofence_overlay(geofence));
    }

    map
}

/// Creates the session's map if it has none. Returns `true` when this call
/// created it.
///
/// The geofence is fetched without holding the session, so a request that
/// never completes cannot block later ticks or readers. Overlapping first
/// ticks may both fetch; only the first to install wins.
pub async fn bootstrap<D, M>(source: &D, session: &RwLock<Session<M>>) -> bool
where
    D: DataSource,
    M: MapSurface,
{
    if session.read().await.map().is_some() {
        return false;
    }

    let geofence = api::geofence(source).await;

    let mut session = session.write().await;
    if session.map().is_some() {
        debug!("Map created by an overlapping cycle, discarding this bootstrap");
        return false;
    }

    match &geofence {
        Some(g) => info!(
            "Map centered on geofence ({}, {}), radius {} km",
            g.center.lat, g.center.lng, g.radius_km
        ),
        None => error!(
            "Could not fetch the geofence configuration, using fallback view ({}, {})",
            FALLBACK_CENTER.lat, FALLBACK_CENTER.lng
        ),
    }

    let map = build_map(geofence.as_ref());
    session.install_map(map, geofence);
    true
}

/// Waits for the layout to settle, then recomputes the map size and
/// recenters it on a freshly fetched geofence.
pub async fn settle<D, M>(source: &D, session: &RwLock<Session<M>>, delay: Duration)
where
    D: DataSource,
    M: MapSurface,
{
    tokio::time::sleep(delay).await;

    {
        let mut session = session.write().await;
        match session.map_mut() {
            Some(map) => map.invalidate_size(),
            None => return,
        }
    }

    let Some(geofence) = api::geofence(source).await else {
        debug!("Geofence unavailable after settle, keeping current view");
        return;
    };

    if let Some(map) = session.write().await.map_mut() {
        map.set_view(MapView {
            center: geofence.center,
            zoom: DEFAULT_ZOOM,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::FixtureSource;
    use crate::map::SceneMap;
    use crate::session::Phase;
    use serde_json::json;

    fn geofence_source() -> FixtureSource {
        let source = FixtureSource::new();
        source.set(
            api::GEOFENCE,
            json!({"center": {"lat": 20.734503, "lng": -103.455896}, "radius_km": 0.5}),
        );
        source
    }

    #[tokio::test]
    async fn test_bootstrap_from_geofence() {
        let source = geofence_source();
        let session = RwLock::new(Session::<SceneMap>::new(false));

        assert!(bootstrap(&source, &session).await);

        let session = session.read().await;
        assert_eq!(session.phase(), Phase::Running);
        let map = session.map().unwrap();
        assert_eq!(map.view.center, LatLng::new(20.734503, -103.455896));
        assert_eq!(map.view.zoom, 16);
        assert_eq!(map.overlays.len(), 1);
        assert_eq!(map.overlays[0].radius_m, 500.0);
        assert_eq!(map.overlays[0].popup, "Geofence: 0.5 km");
        assert_eq!(map.tile_layer.as_ref().unwrap().max_zoom, 19);
    }

    #[tokio::test]
    async fn test_bootstrap_falls_back_without_geofence() {
        let source = FixtureSource::new();
        let session = RwLock::new(Session::<SceneMap>::new(false));

        assert!(bootstrap(&source, &session).await);

        let session = session.read().await;
        let map = session.map().unwrap();
        assert_eq!(map.view.center, LatLng::new(20.11, -99.22));
        assert!(map.overlays.is_empty());
        assert!(session.geofence().is_none());
    }

    #[tokio::test]
    async fn test_error_payload_falls_back() {
        let source = FixtureSource::new();
        source.set(api::GEOFENCE, json!({"error": "missing env"}));
        let session = RwLock::new(Session::<SceneMap>::new(false));

        bootstrap(&source, &session).await;

        assert_eq!(
            session.read().await.map().unwrap().view.center,
            FALLBACK_CENTER
        );
    }

    #[tokio::test]
    async fn test_bootstrap_runs_once() {
        let source = geofence_source();
        let session = RwLock::new(Session::<SceneMap>::new(false));

        assert!(bootstrap(&source, &session).await);
        assert!(!bootstrap(&source, &session).await);
        assert_eq!(source.count(api::GEOFENCE), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_settle_resizes_and_recenters() {
        let source = FixtureSource::new();
        let session = RwLock::new(Session::<SceneMap>::new(false));
        bootstrap(&source, &session).await;

        // Geofence becomes reachable after the map was created.
        source.set(
            api::GEOFENCE,
            json!({"center": {"lat": 20.5, "lng": -103.0}, "radius_km": 1.0}),
        );
        settle(&source, &session, Duration::from_millis(300)).await;

        let session = session.read().await;
        let map = session.map().unwrap();
        assert_eq!(map.size_generation, 1);
        assert_eq!(map.view.center, LatLng::new(20.5, -103.0));
        // Only the initial centering draws the overlay.
        assert!(map.overlays.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_settle_without_map_does_nothing() {
        let source = geofence_source();
        let session = RwLock::new(Session::<SceneMap>::new(false));

        settle(&source, &session, Duration::from_millis(300)).await;

        assert!(session.read().await.map().is_none());
        assert_eq!(source.count(api::GEOFENCE), 0);
    }
}
