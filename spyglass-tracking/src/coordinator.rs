//! Per-server coordinator: seeding, loss handoff, resume routing

use crate::tracker::{DimensionTracker, HitSender, TrackLoss};
use spyglass_core::{Dimension, TrackId, TrackResume, WorldPos};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};

// Startup search patterns. The nether gets one wide, sparse corridor
// scan out to the scaled-down equivalent of the far overworld plus a
// dense near-spawn pass; the overworld gets the dense pass only. Both
// dimensions get one expanding-grid scan around the origin.
const NETHER_FAR_CORRIDOR: (u32, i32, i32) = (1_000, 250_000, 400_000);
const NEAR_CORRIDOR: (u32, i32, i32) = (100, 25_000, 40_000);
const GRID_SEED: (u32, i32, i32) = (10_000, 9, 250);

/// Coordinates the two dimension trackers of one world server.
pub struct TrackingCoordinator {
    hostname: String,
    overworld: Arc<dyn DimensionTracker>,
    nether: Arc<dyn DimensionTracker>,
}

impl TrackingCoordinator {
    pub fn new(
        hostname: impl Into<String>,
        overworld: Arc<dyn DimensionTracker>,
        nether: Arc<dyn DimensionTracker>,
    ) -> Self {
        Self {
            hostname: hostname.into(),
            overworld,
            nether,
        }
    }

    /// Hostname of the world server this coordinator manages.
    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    fn tracker_for(&self, dimension: Dimension) -> &Arc<dyn DimensionTracker> {
        match dimension {
            Dimension::Overworld => &self.overworld,
            Dimension::Nether => &self.nether,
        }
    }

    /// Install the startup search patterns on both trackers.
    ///
    /// Hits discovered by these patterns have no prior track to extend;
    /// each dimension's pattern hits are fed back to its own tracker as
    /// already-known sightings.
    pub async fn seed_patterns(&self) {
        let overworld_hits = self.spawn_known_hit_forwarder(Arc::clone(&self.overworld));
        let nether_hits = self.spawn_known_hit_forwarder(Arc::clone(&self.nether));

        let (budget, step, radius) = NETHER_FAR_CORRIDOR;
        self.nether
            .seed_corridor_search(budget, step, radius, nether_hits.clone())
            .await;
        let (budget, step, radius) = NEAR_CORRIDOR;
        self.nether
            .seed_corridor_search(budget, step, radius, nether_hits.clone())
            .await;
        self.overworld
            .seed_corridor_search(budget, step, radius, overworld_hits.clone())
            .await;

        let (budget, step, radius) = GRID_SEED;
        self.overworld
            .seed_grid_search(budget, step, radius, WorldPos::ORIGIN, overworld_hits)
            .await;
        self.nether
            .seed_grid_search(budget, step, radius, WorldPos::ORIGIN, nether_hits)
            .await;

        tracing::info!(hostname = %self.hostname, "seeded startup search patterns");
    }

    /// Forward pattern hits back into the owning tracker as known
    /// sightings with no prior track. The task drains until every
    /// pattern holding the sender has been torn down.
    fn spawn_known_hit_forwarder(&self, tracker: Arc<dyn DimensionTracker>) -> HitSender {
        let (tx, mut rx) = mpsc::unbounded_channel();
        tokio::spawn(async move {
            while let Some(hit) = rx.recv().await {
                if let Err(e) = tracker.ingest_known_hit(hit, None).await {
                    tracing::error!(
                        dimension = %tracker.dimension(),
                        error = %e,
                        "dropping pattern hit"
                    );
                }
            }
        });
        tx
    }

    /// Drain loss events until shutdown is signalled or every tracker
    /// has dropped its sender.
    pub async fn run(
        self: Arc<Self>,
        mut losses: mpsc::UnboundedReceiver<TrackLoss>,
        mut shutdown: watch::Receiver<bool>,
    ) {
        tracing::info!(hostname = %self.hostname, "tracking coordinator started");
        loop {
            tokio::select! {
                changed = shutdown.changed() => {
                    // A dropped shutdown sender counts as shutdown.
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
                loss = losses.recv() => {
                    match loss {
                        Some(loss) => self.handle_loss(loss).await,
                        None => break,
                    }
                }
            }
        }
        tracing::info!(hostname = %self.hostname, "tracking coordinator stopped");
    }

    /// React to a loss: compute the search origin in the partner
    /// dimension (8:1 integer rescale) and start an approximate search
    /// there, tagged with the original track identity so re-acquisition
    /// continues the same track.
    pub async fn handle_loss(&self, loss: TrackLoss) {
        let target = loss.dimension.counterpart();
        let origin = loss.dimension.project_loss(loss.last_pos);
        tracing::info!(
            hostname = %self.hostname,
            track_id = loss.track_id,
            from = %loss.dimension,
            to = %target,
            last_pos = %loss.last_pos,
            origin = %origin,
            "lost track, reflecting search into partner dimension"
        );
        if let Err(e) = self
            .tracker_for(target)
            .ingest_approx(origin, Some(loss.track_id))
            .await
        {
            tracing::error!(
                track_id = loss.track_id,
                error = %e,
                "handoff ingest failed; track will not be resumed"
            );
        }
    }

    /// Resume a track from durable state: start an approximate search
    /// at the recorded position in the recorded dimension, tagged with
    /// the previous track identity. Unsupported dimension tags are
    /// logged and dropped.
    pub async fn resume_track(&self, resume: &TrackResume) {
        let Some(dimension) = Dimension::from_tag(resume.dimension_tag) else {
            tracing::warn!(
                hostname = %self.hostname,
                dimension_tag = resume.dimension_tag,
                prev_track_id = resume.prev_track_id,
                "unsupported dimension in resume request, dropping"
            );
            return;
        };
        tracing::info!(
            hostname = %self.hostname,
            pos = %resume.pos,
            dimension = %dimension,
            prev_track_id = resume.prev_track_id,
            "attempting to resume tracking"
        );
        if let Err(e) = self
            .tracker_for(dimension)
            .ingest_approx(resume.pos, Some(resume.prev_track_id))
            .await
        {
            tracing::error!(
                prev_track_id = resume.prev_track_id,
                error = %e,
                "resume ingest failed; track will not be resumed"
            );
        }
    }

    /// Whether either dimension tracker currently has a live search
    /// attached to `track_id`. Callers use this to avoid issuing
    /// duplicate resume requests for a track already being searched.
    pub fn has_active_filter(&self, track_id: TrackId) -> bool {
        self.overworld.has_active_filter(track_id) || self.nether.has_active_filter(track_id)
    }
}
