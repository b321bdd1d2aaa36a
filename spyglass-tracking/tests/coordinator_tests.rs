//! Coordinator behavior against a scripted mock tracker: loss handoff
//! with 8:1 rescale, resume routing, startup seeding, and the run loop.

use async_trait::async_trait;
use spyglass_core::{Dimension, Hit, TrackId, TrackResume, WorldPos};
use spyglass_tracking::{
    DimensionTracker, HitSender, TrackLoss, TrackingCoordinator, TrackingError,
};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Default)]
struct Calls {
    known: Vec<(Hit, Option<TrackId>)>,
    approx: Vec<(WorldPos, Option<TrackId>)>,
    corridors: Vec<(u32, i32, i32)>,
    grids: Vec<(u32, i32, i32, WorldPos)>,
}

struct MockTracker {
    dimension: Dimension,
    calls: Mutex<Calls>,
    active: Mutex<HashSet<TrackId>>,
    fail_ingest: bool,
    /// Hit each seeded pattern reports immediately, if any.
    pattern_hit: Option<Hit>,
}

impl MockTracker {
    fn new(dimension: Dimension) -> Arc<Self> {
        Arc::new(Self::new_inner(dimension))
    }

    fn failing(dimension: Dimension) -> Arc<Self> {
        Arc::new(Self {
            fail_ingest: true,
            ..Self::new_inner(dimension)
        })
    }

    fn with_pattern_hit(dimension: Dimension, hit: Hit) -> Arc<Self> {
        Arc::new(Self {
            pattern_hit: Some(hit),
            ..Self::new_inner(dimension)
        })
    }

    fn new_inner(dimension: Dimension) -> Self {
        Self {
            dimension,
            calls: Mutex::new(Calls::default()),
            active: Mutex::new(HashSet::new()),
            fail_ingest: false,
            pattern_hit: None,
        }
    }

    fn mark_active(&self, track_id: TrackId) {
        self.active.lock().unwrap().insert(track_id);
    }

    fn approx_calls(&self) -> Vec<(WorldPos, Option<TrackId>)> {
        self.calls.lock().unwrap().approx.clone()
    }

    fn known_calls(&self) -> Vec<(Hit, Option<TrackId>)> {
        self.calls.lock().unwrap().known.clone()
    }
}

#[async_trait]
impl DimensionTracker for MockTracker {
    fn dimension(&self) -> Dimension {
        self.dimension
    }

    async fn ingest_known_hit(
        &self,
        hit: Hit,
        prev_track: Option<TrackId>,
    ) -> Result<(), TrackingError> {
        if self.fail_ingest {
            return Err(TrackingError::TrackerUnavailable);
        }
        self.calls.lock().unwrap().known.push((hit, prev_track));
        Ok(())
    }

    async fn ingest_approx(
        &self,
        pos: WorldPos,
        prev_track: Option<TrackId>,
    ) -> Result<(), TrackingError> {
        if self.fail_ingest {
            return Err(TrackingError::TrackerUnavailable);
        }
        self.calls.lock().unwrap().approx.push((pos, prev_track));
        Ok(())
    }

    async fn seed_grid_search(
        &self,
        total_budget: u32,
        step: i32,
        radius: i32,
        origin: WorldPos,
        hits: HitSender,
    ) {
        self.calls
            .lock()
            .unwrap()
            .grids
            .push((total_budget, step, radius, origin));
        if let Some(hit) = self.pattern_hit {
            let _ = hits.send(hit);
        }
    }

    async fn seed_corridor_search(
        &self,
        total_budget: u32,
        step: i32,
        radius: i32,
        hits: HitSender,
    ) {
        self.calls
            .lock()
            .unwrap()
            .corridors
            .push((total_budget, step, radius));
        if let Some(hit) = self.pattern_hit {
            let _ = hits.send(hit);
        }
    }

    fn has_active_filter(&self, track_id: TrackId) -> bool {
        self.active.lock().unwrap().contains(&track_id)
    }
}

fn coordinator(
    overworld: &Arc<MockTracker>,
    nether: &Arc<MockTracker>,
) -> TrackingCoordinator {
    TrackingCoordinator::new(
        "test.example.invalid",
        Arc::clone(overworld) as Arc<dyn DimensionTracker>,
        Arc::clone(nether) as Arc<dyn DimensionTracker>,
    )
}

/// Poll until `check` passes or a short deadline expires.
async fn wait_for(mut check: impl FnMut() -> bool) {
    for _ in 0..200 {
        if check() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("condition not reached in time");
}

// ============================================================================
// LOSS HANDOFF
// ============================================================================

#[tokio::test]
async fn overworld_loss_searches_nether_at_eighth_scale() {
    let overworld = MockTracker::new(Dimension::Overworld);
    let nether = MockTracker::new(Dimension::Nether);
    let coordinator = coordinator(&overworld, &nether);

    coordinator
        .handle_loss(TrackLoss {
            dimension: Dimension::Overworld,
            last_pos: WorldPos::new(108, 205),
            track_id: 1,
        })
        .await;

    assert_eq!(nether.approx_calls(), vec![(WorldPos::new(13, 25), Some(1))]);
    assert!(overworld.approx_calls().is_empty());
}

#[tokio::test]
async fn nether_loss_searches_overworld_at_eight_scale() {
    let overworld = MockTracker::new(Dimension::Overworld);
    let nether = MockTracker::new(Dimension::Nether);
    let coordinator = coordinator(&overworld, &nether);

    coordinator
        .handle_loss(TrackLoss {
            dimension: Dimension::Nether,
            last_pos: WorldPos::new(13, 25),
            track_id: 42,
        })
        .await;

    assert_eq!(
        overworld.approx_calls(),
        vec![(WorldPos::new(104, 200), Some(42))]
    );
    assert!(nether.approx_calls().is_empty());
}

#[tokio::test]
async fn failed_handoff_ingest_is_dropped_not_retried() {
    let overworld = MockTracker::new(Dimension::Overworld);
    let nether = MockTracker::failing(Dimension::Nether);
    let coordinator = coordinator(&overworld, &nether);

    coordinator
        .handle_loss(TrackLoss {
            dimension: Dimension::Overworld,
            last_pos: WorldPos::new(800, -800),
            track_id: 7,
        })
        .await;

    // Rejected and not redirected anywhere else.
    assert!(nether.approx_calls().is_empty());
    assert!(overworld.approx_calls().is_empty());
}

// ============================================================================
// RESUME ROUTING
// ============================================================================

#[tokio::test]
async fn resume_routes_by_dimension_tag() {
    let overworld = MockTracker::new(Dimension::Overworld);
    let nether = MockTracker::new(Dimension::Nether);
    let coordinator = coordinator(&overworld, &nether);

    coordinator
        .resume_track(&TrackResume {
            dimension_tag: 0,
            pos: WorldPos::new(-38, -70),
            prev_track_id: 3,
        })
        .await;
    coordinator
        .resume_track(&TrackResume {
            dimension_tag: -1,
            pos: WorldPos::new(5, 9),
            prev_track_id: 4,
        })
        .await;

    assert_eq!(
        overworld.approx_calls(),
        vec![(WorldPos::new(-38, -70), Some(3))]
    );
    assert_eq!(nether.approx_calls(), vec![(WorldPos::new(5, 9), Some(4))]);
}

#[tokio::test]
async fn resume_drops_unsupported_dimension() {
    let overworld = MockTracker::new(Dimension::Overworld);
    let nether = MockTracker::new(Dimension::Nether);
    let coordinator = coordinator(&overworld, &nether);

    coordinator
        .resume_track(&TrackResume {
            dimension_tag: 1,
            pos: WorldPos::new(0, 0),
            prev_track_id: 9,
        })
        .await;

    assert!(overworld.approx_calls().is_empty());
    assert!(nether.approx_calls().is_empty());
}

#[tokio::test]
async fn has_active_filter_consults_both_trackers() {
    let overworld = MockTracker::new(Dimension::Overworld);
    let nether = MockTracker::new(Dimension::Nether);
    let coordinator = coordinator(&overworld, &nether);

    assert!(!coordinator.has_active_filter(11));
    overworld.mark_active(11);
    assert!(coordinator.has_active_filter(11));

    nether.mark_active(12);
    assert!(coordinator.has_active_filter(12));
}

// ============================================================================
// STARTUP SEEDING
// ============================================================================

#[tokio::test]
async fn seeding_installs_corridors_and_grids() {
    let overworld = MockTracker::new(Dimension::Overworld);
    let nether = MockTracker::new(Dimension::Nether);
    let coordinator = coordinator(&overworld, &nether);

    coordinator.seed_patterns().await;

    // Nether: far sparse corridor plus the near dense pass; overworld:
    // near pass only. One grid around the origin each.
    assert_eq!(
        nether.calls.lock().unwrap().corridors,
        vec![(1_000, 250_000, 400_000), (100, 25_000, 40_000)]
    );
    assert_eq!(
        overworld.calls.lock().unwrap().corridors,
        vec![(100, 25_000, 40_000)]
    );
    assert_eq!(
        overworld.calls.lock().unwrap().grids,
        vec![(10_000, 9, 250, WorldPos::ORIGIN)]
    );
    assert_eq!(
        nether.calls.lock().unwrap().grids,
        vec![(10_000, 9, 250, WorldPos::ORIGIN)]
    );
}

#[tokio::test]
async fn pattern_hits_are_reingested_as_known_with_no_prior_track() {
    let hit = Hit::new(WorldPos::new(1_024, -2_048), Dimension::Overworld, 5);
    let overworld = MockTracker::with_pattern_hit(Dimension::Overworld, hit);
    let nether = MockTracker::new(Dimension::Nether);
    let coordinator = coordinator(&overworld, &nether);

    coordinator.seed_patterns().await;

    // Overworld seeds twice (corridor + grid), each reporting one hit;
    // both come back as known sightings with no prior track.
    wait_for(|| overworld.known_calls().len() == 2).await;
    for (known, prev) in overworld.known_calls() {
        assert_eq!(known, hit);
        assert_eq!(prev, None);
    }
    assert!(nether.known_calls().is_empty());
}

// ============================================================================
// RUN LOOP
// ============================================================================

#[tokio::test]
async fn run_loop_drains_losses_until_shutdown() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init()
        .ok();

    let overworld = MockTracker::new(Dimension::Overworld);
    let nether = MockTracker::new(Dimension::Nether);
    let coordinator = Arc::new(coordinator(&overworld, &nether));

    let (loss_tx, loss_rx) = tokio::sync::mpsc::unbounded_channel();
    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    let handle = tokio::spawn(Arc::clone(&coordinator).run(loss_rx, shutdown_rx));

    loss_tx
        .send(TrackLoss {
            dimension: Dimension::Overworld,
            last_pos: WorldPos::new(160, 160),
            track_id: 2,
        })
        .unwrap();

    wait_for(|| !nether.approx_calls().is_empty()).await;
    assert_eq!(nether.approx_calls(), vec![(WorldPos::new(20, 20), Some(2))]);

    shutdown_tx.send(true).unwrap();
    handle.await.unwrap();
}

#[tokio::test]
async fn run_loop_stops_when_all_loss_senders_drop() {
    let overworld = MockTracker::new(Dimension::Overworld);
    let nether = MockTracker::new(Dimension::Nether);
    let coordinator = Arc::new(coordinator(&overworld, &nether));

    let (loss_tx, loss_rx) = tokio::sync::mpsc::unbounded_channel::<TrackLoss>();
    let (_shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    let handle = tokio::spawn(Arc::clone(&coordinator).run(loss_rx, shutdown_rx));

    drop(loss_tx);
    handle.await.unwrap();
}
