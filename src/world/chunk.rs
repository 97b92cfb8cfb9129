//! # Chunk Module
//!
//! Chunk positions and the reference chunk type.
//!
//! A [`Chunk`] here is a 16x16 column height map. Heights are stored row-major
//! (x first, then z) so the serialized form stays a flat array.

use cgmath::Point2;
use serde::{Deserialize, Serialize};

/// The (x, z) coordinate pair identifying a chunk.
///
/// `Point2::y` carries the z coordinate; use [`chunk_position`] to build one
/// from an (x, z) pair without mixing the two up.
pub type ChunkPosition = Point2<i32>;

/// Builds the position of the chunk at (x, z).
pub fn chunk_position(x: i32, z: i32) -> ChunkPosition {
    Point2::new(x, z)
}

/// The only thing the provider needs to know about a chunk.
pub trait WorldChunk: Send + Sync + 'static {
    fn position(&self) -> ChunkPosition;
}

/// The width and depth of a chunk in columns.
pub const CHUNK_DIMENSION: usize = 16;
/// The number of columns in a chunk (CHUNK_DIMENSION²).
pub const CHUNK_AREA: usize = CHUNK_DIMENSION * CHUNK_DIMENSION;

/// A 16x16 column height map at a fixed chunk position.
///
/// The position is set on construction and cannot change afterwards, so a
/// chunk always stays reachable under the key it was cached with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    x: i32,
    z: i32,
    /// Terrain height of every column, `CHUNK_AREA` entries.
    heights: Vec<u8>,
}

impl Chunk {
    /// Creates a flat chunk where every column has the same height.
    pub fn flat(position: ChunkPosition, height: u8) -> Self {
        Chunk {
            x: position.x,
            z: position.y,
            heights: vec![height; CHUNK_AREA],
        }
    }

    /// Creates a chunk from a full height map.
    ///
    /// Returns `None` unless `heights` has exactly `CHUNK_AREA` entries.
    pub fn from_heights(position: ChunkPosition, heights: Vec<u8>) -> Option<Self> {
        if heights.len() != CHUNK_AREA {
            return None;
        }
        Some(Chunk {
            x: position.x,
            z: position.y,
            heights,
        })
    }

    pub fn x(&self) -> i32 {
        self.x
    }

    pub fn z(&self) -> i32 {
        self.z
    }

    /// Height of the column at chunk-relative (cx, cz).
    ///
    /// # Panics
    /// Panics if either coordinate is `>= CHUNK_DIMENSION`.
    pub fn height_at(&self, cx: usize, cz: usize) -> u8 {
        self.heights[Self::column_index(cx, cz)]
    }

    /// # Panics
    /// Panics if either coordinate is `>= CHUNK_DIMENSION`.
    pub fn set_height(&mut self, cx: usize, cz: usize, height: u8) {
        let index = Self::column_index(cx, cz);
        self.heights[index] = height;
    }

    /// Checks that the height map still has the expected size.
    ///
    /// Deserialized chunks bypass `from_heights`, so loaders call this before
    /// handing a chunk to the provider.
    pub fn is_well_formed(&self) -> bool {
        self.heights.len() == CHUNK_AREA
    }

    fn column_index(cx: usize, cz: usize) -> usize {
        assert!(
            cx < CHUNK_DIMENSION && cz < CHUNK_DIMENSION,
            "column ({}, {}) is outside the chunk",
            cx,
            cz
        );
        cx + CHUNK_DIMENSION * cz
    }
}

impl WorldChunk for Chunk {
    fn position(&self) -> ChunkPosition {
        chunk_position(self.x, self.z)
    }
}
