//! Event store: immutable hits and append-only track aggregates

use crate::{Database, DbResult};
use spyglass_core::{Hit, RecordedHit, ServerId, TimestampMs, TrackId, TrackResume, WorldPos};

impl Database {
    /// Persist an immutable hit event and return it with its assigned
    /// identity. Safe to call concurrently for unrelated hits.
    pub async fn record_hit(&self, hit: &Hit) -> DbResult<RecordedHit> {
        let conn = self.get_conn().await?;
        let dimension = hit.dimension.tag();
        let row = conn
            .query_one(
                "INSERT INTO hits (created_at, x, z, dimension, server_id) \
                 VALUES ($1, $2, $3, $4, $5) RETURNING id",
                &[
                    &hit.created_at,
                    &hit.pos.x,
                    &hit.pos.z,
                    &dimension,
                    &hit.server_id,
                ],
            )
            .await?;
        Ok(RecordedHit {
            id: row.get(0),
            hit: *hit,
        })
    }

    /// Create a track whose first and last hit both point at `initial`,
    /// with `updated_at` initialized to that hit's timestamp.
    pub async fn create_track(&self, initial: &RecordedHit) -> DbResult<TrackId> {
        let conn = self.get_conn().await?;
        let dimension = initial.hit.dimension.tag();
        let row = conn
            .query_one(
                "INSERT INTO tracks (first_hit_id, last_hit_id, updated_at, dimension, server_id) \
                 VALUES ($1, $1, $2, $3, $4) RETURNING id",
                &[
                    &initial.id,
                    &initial.hit.created_at,
                    &dimension,
                    &initial.hit.server_id,
                ],
            )
            .await?;
        Ok(row.get(0))
    }

    /// Append a hit to an existing track: insert the join row, then
    /// advance the track's `last_hit_id` and `updated_at`.
    ///
    /// The two statements share one pooled connection but are not
    /// atomic with each other. Monotonic advancement of `updated_at`
    /// relies on the tracker holding the active search being the sole
    /// appender for its track.
    pub async fn append_hit_to_track(&self, hit: &RecordedHit, track_id: TrackId) -> DbResult<()> {
        let conn = self.get_conn().await?;
        conn.execute(
            "INSERT INTO track_hits (track_id, hit_id) VALUES ($1, $2)",
            &[&track_id, &hit.id],
        )
        .await?;
        conn.execute(
            "UPDATE tracks SET last_hit_id = $1, updated_at = $2 WHERE id = $3",
            &[&hit.id, &hit.hit.created_at, &track_id],
        )
        .await?;
        Ok(())
    }

    /// Current head of a track: its last hit identity and `updated_at`.
    /// Read-only, for recovery tooling and tests.
    pub async fn track_head(
        &self,
        track_id: TrackId,
    ) -> DbResult<Option<(spyglass_core::HitId, TimestampMs)>> {
        let conn = self.get_conn().await?;
        let rows = conn
            .query(
                "SELECT last_hit_id, updated_at FROM tracks WHERE id = $1",
                &[&track_id],
            )
            .await?;
        Ok(rows.first().map(|row| (row.get(0), row.get(1))))
    }

    /// Tracks on `server_id` fresh as of `since`, as resume records:
    /// the dimension tag, the last hit's position, and the track
    /// identity. Feeds the coordinator's resume path at startup so
    /// tracking reattaches to existing track identities instead of
    /// allocating new ones.
    pub async fn resumable_tracks(
        &self,
        server_id: ServerId,
        since: TimestampMs,
    ) -> DbResult<Vec<TrackResume>> {
        let conn = self.get_conn().await?;
        let rows = conn
            .query(
                "SELECT tracks.dimension, hits.x, hits.z, tracks.id \
                 FROM tracks \
                 INNER JOIN hits ON hits.id = tracks.last_hit_id \
                 WHERE tracks.server_id = $1 AND tracks.updated_at >= $2",
                &[&server_id, &since],
            )
            .await?;
        Ok(rows
            .iter()
            .map(|row| TrackResume {
                dimension_tag: row.get(0),
                pos: WorldPos::new(row.get(1), row.get(2)),
                prev_track_id: row.get(3),
            })
            .collect())
    }
}
