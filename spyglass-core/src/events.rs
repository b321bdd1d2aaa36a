//! Sighting, track, and resume records

use crate::{Dimension, HitId, ServerId, TimestampMs, TrackId, WorldPos};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// External reference to a player, as reported by a world server.
///
/// The uuid is the stable account identifier; the username is a display
/// attribute that may be absent (e.g. tab-list entries seen before the
/// profile resolves) and is last-write-wins on re-sighting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerRef {
    pub uuid: Uuid,
    pub username: Option<String>,
}

impl PlayerRef {
    pub fn new(uuid: Uuid) -> Self {
        Self {
            uuid,
            username: None,
        }
    }

    pub fn named(uuid: Uuid, username: impl Into<String>) -> Self {
        Self {
            uuid,
            username: Some(username.into()),
        }
    }
}

/// A single timestamped sighting of an entity, not yet persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hit {
    pub created_at: TimestampMs,
    pub pos: WorldPos,
    pub dimension: Dimension,
    pub server_id: ServerId,
}

impl Hit {
    /// A sighting stamped with the current wall clock.
    pub fn new(pos: WorldPos, dimension: Dimension, server_id: ServerId) -> Self {
        Self {
            created_at: crate::now_ms(),
            pos,
            dimension,
            server_id,
        }
    }

    /// A sighting with an explicit timestamp.
    pub fn at(
        created_at: TimestampMs,
        pos: WorldPos,
        dimension: Dimension,
        server_id: ServerId,
    ) -> Self {
        Self {
            created_at,
            pos,
            dimension,
            server_id,
        }
    }
}

/// A sighting whose identity assignment has resolved.
///
/// Track creation and appending require the hit's store identity, so
/// they take this type rather than [`Hit`]: the precondition holds by
/// construction instead of by blocking on a pending assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordedHit {
    pub id: HitId,
    pub hit: Hit,
}

/// Durable state needed to reattach search effort to a pre-existing
/// track, read back from storage after a restart.
///
/// Carries the raw dimension tag rather than [`Dimension`]: tags outside
/// the modeled set must reach the coordinator, which logs and drops them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackResume {
    pub dimension_tag: i32,
    pub pos: WorldPos,
    pub prev_track_id: TrackId,
}
