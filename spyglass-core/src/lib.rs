//! Spyglass Core - Entity Types
//!
//! Pure data structures with no I/O. All other crates depend on this.
//! This crate contains the identity aliases, world geometry, and the
//! hit/track/resume records shared between the persistence layer and the
//! tracking coordinator.

mod events;
mod geometry;
mod identity;

pub use events::{Hit, PlayerRef, RecordedHit, TrackResume};
pub use geometry::{Dimension, WorldPos, SCALE_FACTOR};
pub use identity::{now_ms, HitId, PlayerId, ServerId, TimestampMs, TrackId};
