//! Identity store: race-safe player and server resolution
//!
//! Resolution is lookup-then-insert with a fallback read: at most one of
//! N concurrent first-time resolutions wins the insert, and every loser
//! reads the winner's row instead of failing. No locks; the unique
//! constraint on the external key is the arbiter.

use crate::error::classify_insert;
use crate::{Database, DbError, DbResult, InsertOutcome};
use spyglass_core::{PlayerId, PlayerRef, ServerId};

impl Database {
    /// Resolve a player reference to its stable identity, creating the
    /// row on first sighting.
    ///
    /// When the reference carries a username, the lookup doubles as the
    /// display-name refresh (`UPDATE ... RETURNING`), so re-sightings
    /// keep the name current without an extra round trip. A loser of a
    /// concurrent first-insertion race does not retry its name update;
    /// the winner's write stands until the next sighting.
    pub async fn resolve_player(&self, player: &PlayerRef) -> DbResult<PlayerId> {
        if let Some(id) = self.lookup_player(player).await? {
            return Ok(id);
        }
        let insert = {
            let conn = self.get_conn().await?;
            classify_insert(
                conn.query_one(
                    "INSERT INTO players (uuid, username) VALUES ($1, $2) RETURNING id",
                    &[&player.uuid, &player.username],
                )
                .await,
            )?
        };
        match insert {
            InsertOutcome::Inserted(row) => Ok(row.get(0)),
            InsertOutcome::AlreadyExists => {
                tracing::debug!(uuid = %player.uuid, "lost player first-insertion race, re-reading");
                self.lookup_player(player)
                    .await?
                    .ok_or(DbError::Inconsistent { table: "players" })
            }
        }
    }

    async fn lookup_player(&self, player: &PlayerRef) -> DbResult<Option<PlayerId>> {
        let conn = self.get_conn().await?;
        let rows = match &player.username {
            Some(username) => {
                conn.query(
                    "UPDATE players SET username = $1 WHERE uuid = $2 RETURNING id",
                    &[username, &player.uuid],
                )
                .await?
            }
            None => {
                conn.query("SELECT id FROM players WHERE uuid = $1", &[&player.uuid])
                    .await?
            }
        };
        Ok(rows.first().map(|row| row.get(0)))
    }

    /// Resolve a server hostname to its stable identity, creating the
    /// row on first reference.
    pub async fn resolve_server(&self, hostname: &str) -> DbResult<ServerId> {
        if let Some(id) = self.lookup_server(hostname).await? {
            return Ok(id);
        }
        let insert = {
            let conn = self.get_conn().await?;
            classify_insert(
                conn.query_one(
                    "INSERT INTO servers (hostname) VALUES ($1) RETURNING id",
                    &[&hostname],
                )
                .await,
            )?
        };
        match insert {
            InsertOutcome::Inserted(row) => Ok(row.get(0)),
            InsertOutcome::AlreadyExists => {
                tracing::debug!(hostname, "lost server first-insertion race, re-reading");
                self.lookup_server(hostname)
                    .await?
                    .ok_or(DbError::Inconsistent { table: "servers" })
            }
        }
    }

    async fn lookup_server(&self, hostname: &str) -> DbResult<Option<ServerId>> {
        let conn = self.get_conn().await?;
        let rows = conn
            .query("SELECT id FROM servers WHERE hostname = $1", &[&hostname])
            .await?;
        Ok(rows.first().map(|row| row.get(0)))
    }
}
