//! The dimension-tracker seam and the loss event type

use async_trait::async_trait;
use spyglass_core::{Dimension, Hit, TrackId, WorldPos};
use thiserror::Error;
use tokio::sync::mpsc;

/// Errors a tracker may report on ingest.
///
/// The coordinator never retries a failed ingest: the affected track
/// simply gets no resume attempt, which is accepted degradation, not a
/// crash.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TrackingError {
    #[error("tracker is shutting down")]
    TrackerUnavailable,

    #[error("ingest failed: {reason}")]
    IngestFailed { reason: String },
}

/// Channel over which a tracker reports hits discovered by a seeded
/// search pattern.
pub type HitSender = mpsc::UnboundedSender<Hit>;

/// Channel over which a tracker delivers loss notifications to the
/// coordinator.
pub type LossSender = mpsc::UnboundedSender<TrackLoss>;

/// Notification that a tracker can no longer correlate further hits
/// onto a track.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackLoss {
    /// Dimension the track was lost in.
    pub dimension: Dimension,
    /// Last position the entity was known at.
    pub last_pos: WorldPos,
    /// Identity of the lost track.
    pub track_id: TrackId,
}

/// A per-dimension correlation tracker, as seen by the coordinator.
///
/// Implementations own the scanning probes and filter lifecycle for one
/// dimension of one world server. The tracker holding the active search
/// for a track is that track's sole appender; the coordinator relies on
/// this when it tags a cross-dimension search with a prior track
/// identity.
#[async_trait]
pub trait DimensionTracker: Send + Sync {
    /// The dimension this tracker operates in.
    fn dimension(&self) -> Dimension;

    /// Report a sighting with no ambiguity about its track.
    async fn ingest_known_hit(
        &self,
        hit: Hit,
        prev_track: Option<TrackId>,
    ) -> Result<(), TrackingError>;

    /// Begin an approximate search centered at `pos`, optionally
    /// continuing a prior track identity instead of allocating a new
    /// track on re-acquisition.
    async fn ingest_approx(
        &self,
        pos: WorldPos,
        prev_track: Option<TrackId>,
    ) -> Result<(), TrackingError>;

    /// Install a long-running expanding-grid search centered at
    /// `origin`. Discovered hits are reported over `hits`.
    async fn seed_grid_search(
        &self,
        total_budget: u32,
        step: i32,
        radius: i32,
        origin: WorldPos,
        hits: HitSender,
    );

    /// Install a long-running linear-corridor search along the cardinal
    /// directions. Discovered hits are reported over `hits`.
    async fn seed_corridor_search(&self, total_budget: u32, step: i32, radius: i32, hits: HitSender);

    /// Whether a live search is currently attached to `track_id`.
    fn has_active_filter(&self, track_id: TrackId) -> bool;
}
