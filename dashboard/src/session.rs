use crate::map::{MapSurface, SceneMap};
use crate::markers::MarkerRegistry;
use crate::model::{GeofenceConfig, TelemetrySnapshot};
use crate::render::{render_table, AlertFeed, TableRow};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, warn};

pub type SharedSession<M> = Arc<RwLock<Session<M>>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// No map has been created yet.
    Uninitialized,
    Running,
}

/// Everything one dashboard keeps between poll cycles.
#[derive(Debug)]
pub struct Session<M> {
    map: Option<M>,
    geofence: Option<GeofenceConfig>,
    registry: MarkerRegistry,
    table: Vec<TableRow>,
    alerts: AlertFeed,
    last_cycle: Option<DateTime<Utc>>,
    evict_stale_markers: bool,
}

impl<M: MapSurface> Session<M> {
    pub fn new(evict_stale_markers: bool) -> Self {
        Self {
            map: None,
            geofence: None,
            registry: MarkerRegistry::new(),
            table: Vec::new(),
            alerts: AlertFeed::default(),
            last_cycle: None,
            evict_stale_markers,
        }
    }

    pub fn shared(evict_stale_markers: bool) -> SharedSession<M> {
        Arc::new(RwLock::new(Self::new(evict_stale_markers)))
    }

    pub fn phase(&self) -> Phase {
        if self.map.is_some() {
            Phase::Running
        } else {
            Phase::Uninitialized
        }
    }

    pub fn map(&self) -> Option<&M> {
        self.map.as_ref()
    }

    pub fn map_mut(&mut self) -> Option<&mut M> {
        self.map.as_mut()
    }

    pub fn geofence(&self) -> Option<&GeofenceConfig> {
        self.geofence.as_ref()
    }

    pub fn registry(&self) -> &MarkerRegistry {
        &self.registry
    }

    pub fn table(&self) -> &[TableRow] {
        &self.table
    }

    pub fn alerts(&self) -> &AlertFeed {
        &self.alerts
    }

    pub fn last_cycle(&self) -> Option<DateTime<Utc>> {
        self.last_cycle
    }

    pub(crate) fn install_map(&mut self, map: M, geofence: Option<GeofenceConfig>) {
        self.map = Some(map);
        self.geofence = geofence;
    }

    /// Replaces the table and reconciles markers with the snapshots of a
    /// cycle whose id list was fetched successfully.
    pub fn apply_entities(&mut self, ids: &[String], snapshots: &[TelemetrySnapshot]) {
        self.table = render_table(snapshots);

        let Some(map) = self.map.as_mut() else {
            warn!("No map yet, skipping {} marker updates", snapshots.len());
            return;
        };

        let created = snapshots
            .iter()
            .filter(|snapshot| self.registry.upsert(map, snapshot))
            .count();

        if self.evict_stale_markers {
            self.registry.evict_absent(map, ids);
        }

        debug!(
            "Applied {} snapshots ({} new markers, {} total)",
            snapshots.len(),
            created,
            self.registry.len()
        );
    }

    pub fn apply_alerts(&mut self, feed: AlertFeed) {
        self.alerts = feed;
    }

    pub fn mark_cycle(&mut self, at: DateTime<Utc>) {
        self.last_cycle = Some(at);
    }
}

/// Serializable view of a headless session.
#[derive(Debug, Serialize)]
pub struct SceneSnapshot<'a> {
    pub phase: Phase,
    pub map: Option<&'a SceneMap>,
    pub geofence: Option<&'a GeofenceConfig>,
    pub table: &'a [TableRow],
    pub alerts: &'a AlertFeed,
    pub last_cycle: Option<DateTime<Utc>>,
}

impl Session<SceneMap> {
    pub fn scene(&self) -> SceneSnapshot<'_> {
        SceneSnapshot {
            phase: self.phase(),
            map: self.map.as_ref(),
            geofence: self.geofence.as_ref(),
            table: &self.table,
            alerts: &self.alerts,
            last_cycle: self.last_cycle,
        }
    }
}
