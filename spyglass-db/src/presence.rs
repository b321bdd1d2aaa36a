//! Presence store: player online/offline intervals per server
//!
//! Intervals are half-open [join, leave); `leave IS NULL` means the
//! player is currently present. At most one open row may exist per
//! (player, server) pair at a time — that is a caller contract (close
//! before re-opening), not a storage constraint.

use crate::{Database, DbError, DbResult};
use spyglass_core::{now_ms, PlayerId, ServerId, TimestampMs};

/// Compute the recovery close point, refusing when it would not be
/// strictly in the past. A close point at or after the wall clock means
/// the server clock went backwards or the server is already live again;
/// silently closing would corrupt sessions that are still open.
fn recovery_close_point(
    most_recent_event: TimestampMs,
    now: TimestampMs,
) -> Result<TimestampMs, DbError> {
    let close_point = most_recent_event + 1;
    if close_point >= now {
        return Err(DbError::ClockSkew { close_point, now });
    }
    Ok(close_point)
}

impl Database {
    /// Open a presence interval starting at `now` for every given
    /// player on the server. One statement, one connection, regardless
    /// of player count.
    pub async fn open_sessions(
        &self,
        server_id: ServerId,
        player_ids: &[PlayerId],
        now: TimestampMs,
    ) -> DbResult<()> {
        if player_ids.is_empty() {
            return Ok(());
        }
        let conn = self.get_conn().await?;
        conn.execute(
            "INSERT INTO player_sessions (player_id, server_id, \"join\", leave) \
             SELECT player_id, $1, $2, NULL FROM unnest($3::int4[]) AS player_id",
            &[&server_id, &now, &player_ids],
        )
        .await?;
        Ok(())
    }

    /// Close the open interval for every given player on the server by
    /// setting its upper bound to `now`. Bulk, like [`Self::open_sessions`].
    pub async fn close_sessions(
        &self,
        server_id: ServerId,
        player_ids: &[PlayerId],
        now: TimestampMs,
    ) -> DbResult<()> {
        if player_ids.is_empty() {
            return Ok(());
        }
        let conn = self.get_conn().await?;
        conn.execute(
            "UPDATE player_sessions SET leave = $1 \
             WHERE leave IS NULL AND server_id = $2 AND player_id = ANY($3)",
            &[&now, &server_id, &player_ids],
        )
        .await?;
        Ok(())
    }

    /// Recovery path: close every still-open interval on the server to
    /// one time-unit past the latest recorded event (across hits and
    /// session joins).
    ///
    /// Refuses with [`DbError::ClockSkew`] when the computed close
    /// point is not strictly in the past.
    pub async fn close_all_open_sessions(&self, server_id: ServerId) -> DbResult<()> {
        let conn = self.get_conn().await?;
        let most_recent = Self::most_recent_event(&conn, server_id).await?;
        let close_point = match recovery_close_point(most_recent, now_ms()) {
            Ok(point) => point,
            Err(e) => {
                tracing::error!(server_id, error = %e, "refusing presence recovery close");
                return Err(e);
            }
        };
        let closed = conn
            .execute(
                "UPDATE player_sessions SET leave = $1 \
                 WHERE leave IS NULL AND server_id = $2",
                &[&close_point, &server_id],
            )
            .await?;
        if closed > 0 {
            tracing::info!(server_id, closed, close_point, "closed stale presence intervals");
        }
        Ok(())
    }

    /// Number of open intervals for a (player, server) pair. Read-only,
    /// for recovery tooling and tests; a well-behaved caller sequence
    /// never leaves this above 1.
    pub async fn open_session_count(
        &self,
        server_id: ServerId,
        player_id: PlayerId,
    ) -> DbResult<i64> {
        let conn = self.get_conn().await?;
        let row = conn
            .query_one(
                "SELECT COUNT(*) FROM player_sessions \
                 WHERE leave IS NULL AND server_id = $1 AND player_id = $2",
                &[&server_id, &player_id],
            )
            .await?;
        Ok(row.get(0))
    }

    /// Latest event timestamp on the server across hits and open
    /// session joins. Empty tables count as the epoch.
    async fn most_recent_event(
        conn: &deadpool_postgres::Object,
        server_id: ServerId,
    ) -> DbResult<TimestampMs> {
        let hits: Option<i64> = conn
            .query_one(
                "SELECT MAX(created_at) FROM hits WHERE server_id = $1",
                &[&server_id],
            )
            .await?
            .get(0);
        let joins: Option<i64> = conn
            .query_one(
                "SELECT MAX(\"join\") FROM player_sessions \
                 WHERE leave IS NULL AND server_id = $1",
                &[&server_id],
            )
            .await?
            .get(0);
        Ok(hits.unwrap_or(0).max(joins.unwrap_or(0)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_close_point_is_one_past_latest_event() {
        let point = recovery_close_point(1_000, 5_000).unwrap();
        assert_eq!(point, 1_001);
    }

    #[test]
    fn test_close_point_refuses_present_and_future() {
        // Exactly now: refused (>= comparison is deliberate).
        let err = recovery_close_point(999, 1_000).unwrap_err();
        match err {
            DbError::ClockSkew { close_point, now } => {
                assert_eq!(close_point, 1_000);
                assert_eq!(now, 1_000);
            }
            other => panic!("expected ClockSkew, got {other:?}"),
        }
        // Clock went backwards: refused.
        assert!(recovery_close_point(10_000, 1_000).is_err());
    }

    #[test]
    fn test_close_point_on_empty_server() {
        // No events ever recorded: close point is just past the epoch,
        // trivially in the past, closing nothing.
        assert_eq!(recovery_close_point(0, now_ms()).unwrap(), 1);
    }
}
