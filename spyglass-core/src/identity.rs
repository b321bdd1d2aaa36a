//! Identity and timestamp aliases for Spyglass entities

use chrono::Utc;

/// Player identity, assigned by the store on first sighting.
pub type PlayerId = i32;

/// Server identity, assigned by the store on first reference.
pub type ServerId = i32;

/// Hit identity, assigned by the store. Never reused.
pub type HitId = i64;

/// Track identity, assigned by the store. Never reused.
pub type TrackId = i64;

/// Milliseconds since the Unix epoch, as persisted in the schema.
pub type TimestampMs = i64;

/// Current wall-clock time in milliseconds since the Unix epoch.
pub fn now_ms() -> TimestampMs {
    Utc::now().timestamp_millis()
}
