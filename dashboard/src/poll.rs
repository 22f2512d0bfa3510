use crate::api;
use crate::bootstrap::{bootstrap, settle};
use crate::config::{OverlapPolicy, PollConfig};
use crate::fetch::DataSource;
use crate::map::MapSurface;
use crate::metrics::{CYCLES_SKIPPED_TOTAL, CYCLES_TOTAL, CYCLE_LATENCY_SECONDS};
use crate::render::render_alerts;
use crate::session::{Session, SharedSession};
use chrono::Utc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::time::{interval, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

/// Fetches the id list and each entity's latest reading, then applies the
/// table and markers. Returns the number of entities rendered, or `None`
/// when the id list was unavailable and nothing was touched.
pub async fn refresh_entities<D, M>(source: &D, session: &RwLock<Session<M>>) -> Option<usize>
where
    D: DataSource,
    M: MapSurface,
{
    let Some(ids) = api::entity_ids(source).await else {
        debug!("Entity ids unavailable, keeping previous table and markers");
        return None;
    };

    let mut snapshots = Vec::with_capacity(ids.len());
    for id in &ids {
        match api::latest(source, id).await {
            Some(snapshot) => snapshots.push(snapshot),
            None => debug!("No latest reading for {}, omitted this cycle", id),
        }
    }

    let rendered = snapshots.len();
    session.write().await.apply_entities(&ids, &snapshots);
    Some(rendered)
}

pub async fn refresh_alerts<D, M>(source: &D, session: &RwLock<Session<M>>)
where
    D: DataSource,
    M: MapSurface,
{
    let alerts = api::alerts(source).await;
    let feed = render_alerts(alerts.as_deref());
    session.write().await.apply_alerts(feed);
}

/// Drives a session on a fixed cadence.
pub struct Poller<D, M> {
    source: D,
    session: SharedSession<M>,
    config: PollConfig,
    in_flight: Arc<AtomicBool>,
}

impl<D: Clone, M> Clone for Poller<D, M> {
    fn clone(&self) -> Self {
        Self {
            source: self.source.clone(),
            session: Arc::clone(&self.session),
            config: self.config.clone(),
            in_flight: Arc::clone(&self.in_flight),
        }
    }
}

impl<D, M> Poller<D, M>
where
    D: DataSource + Clone + 'static,
    M: MapSurface + 'static,
{
    pub fn new(source: D, session: SharedSession<M>, config: PollConfig) -> Self {
        Self {
            source,
            session,
            config,
            in_flight: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn session(&self) -> &SharedSession<M> {
        &self.session
    }

    /// One tick: bootstrap the map on first use, then refresh entities and
    /// alerts concurrently.
    pub async fn run_cycle(&self) {
        let start = Instant::now();
        CYCLES_TOTAL.inc();

        if bootstrap(&self.source, &self.session).await {
            let source = self.source.clone();
            let session = Arc::clone(&self.session);
            let delay = self.config.settle_delay;
            tokio::spawn(async move {
                settle(&source, &session, delay).await;
            });
        }

        let (rendered, ()) = tokio::join!(
            refresh_entities(&self.source, &self.session),
            refresh_alerts(&self.source, &self.session)
        );

        self.session.write().await.mark_cycle(Utc::now());

        let elapsed = start.elapsed().as_secs_f64();
        CYCLE_LATENCY_SECONDS.observe(elapsed);
        match rendered {
            Some(count) => debug!("Cycle rendered {} entities in {:.3}s", count, elapsed),
            None => debug!("Cycle skipped entity pass after {:.3}s", elapsed),
        }
    }

    /// Starts a cycle in the background. Under the single-flight policy the
    /// tick is dropped while a previous cycle is running; returns whether a
    /// cycle was started.
    pub fn tick(&self) -> bool {
        let single_flight = self.config.overlap == OverlapPolicy::SingleFlight;
        if single_flight && self.in_flight.swap(true, Ordering::AcqRel) {
            CYCLES_SKIPPED_TOTAL.inc();
            warn!("Previous cycle still running, skipping tick");
            return false;
        }

        let poller = self.clone();
        tokio::spawn(async move {
            poller.run_cycle().await;
            if single_flight {
                poller.in_flight.store(false, Ordering::Release);
            }
        });
        true
    }

    /// Ticks immediately, then every `interval`, regardless of how long each
    /// cycle takes.
    pub async fn run(self) {
        info!(
            "Starting poll loop with interval={:?}, policy={:?}, evict_stale_markers={}",
            self.config.interval, self.config.overlap, self.config.evict_stale_markers
        );

        let mut ticker = interval(self.config.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            ticker.tick().await;
            self.tick();
        }
    }
}
