//! World geometry: positions, dimensions, and the cross-space transform

use serde::{Deserialize, Serialize};
use std::fmt;

/// Fixed ratio between overworld and nether coordinates.
pub const SCALE_FACTOR: i32 = 8;

/// 2-D integer position in one dimension's coordinate space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WorldPos {
    pub x: i32,
    pub z: i32,
}

impl WorldPos {
    pub const ORIGIN: WorldPos = WorldPos { x: 0, z: 0 };

    pub fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    /// Divide both coordinates by `scale`, truncating toward zero.
    pub fn scaled_down(self, scale: i32) -> Self {
        Self {
            x: self.x / scale,
            z: self.z / scale,
        }
    }

    /// Multiply both coordinates by `scale`.
    pub fn scaled_up(self, scale: i32) -> Self {
        Self {
            x: self.x * scale,
            z: self.z * scale,
        }
    }
}

impl fmt::Display for WorldPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.z)
    }
}

/// One of the two coordinate spaces of a world server.
///
/// The raw tags (`0` and `-1`) are what the schema stores in the
/// `dimension` column; resume records read back from storage may carry
/// tags outside this set, which is why [`Dimension::from_tag`] is
/// fallible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Dimension {
    Overworld,
    Nether,
}

impl Dimension {
    /// Raw storage tag for this dimension.
    pub fn tag(self) -> i32 {
        match self {
            Dimension::Overworld => 0,
            Dimension::Nether => -1,
        }
    }

    /// Decode a raw storage tag. Unknown tags are data, not panics.
    pub fn from_tag(tag: i32) -> Option<Self> {
        match tag {
            0 => Some(Dimension::Overworld),
            -1 => Some(Dimension::Nether),
            _ => None,
        }
    }

    /// The paired dimension search effort is reflected into on a loss.
    pub fn counterpart(self) -> Self {
        match self {
            Dimension::Overworld => Dimension::Nether,
            Dimension::Nether => Dimension::Overworld,
        }
    }

    /// Project a last-known position in this dimension into the
    /// counterpart dimension's coordinate space.
    ///
    /// Overworld coordinates divide by [`SCALE_FACTOR`]; nether
    /// coordinates multiply. Integer, truncating toward zero, so a
    /// round trip is exact only for multiples of the scale factor.
    pub fn project_loss(self, pos: WorldPos) -> WorldPos {
        match self {
            Dimension::Overworld => pos.scaled_down(SCALE_FACTOR),
            Dimension::Nether => pos.scaled_up(SCALE_FACTOR),
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dimension::Overworld => write!(f, "overworld"),
            Dimension::Nether => write!(f, "nether"),
        }
    }
}
