use noise::{NoiseFn, Perlin};

use super::chunk::{Chunk, ChunkPosition, CHUNK_AREA, CHUNK_DIMENSION};

/// Creates brand new chunks.
///
/// The provider keeps a generator around for the surrounding system but never
/// calls it on its own load or save paths; loaders decide when a chunk has to
/// be generated instead of read.
pub trait ChunkGenerator: Send + Sync + 'static {
    type Chunk;

    fn generate_chunk(&self, position: ChunkPosition) -> Self::Chunk;
}

/// Scaling factor applied to world coordinates when sampling Perlin noise.
pub const PERLIN_SCALE_FACTOR: f64 = 0.02;
/// Column height where the noise sample is zero.
pub const BASE_HEIGHT: f64 = 64.0;
/// How far the terrain can rise above or sink below `BASE_HEIGHT`.
pub const HEIGHT_AMPLITUDE: f64 = 32.0;

/// Height-map terrain from 2D Perlin noise.
///
/// The same seed and position always produce the same chunk.
pub struct PerlinChunkGenerator {
    perlin: Perlin,
    seed: u32,
}

impl PerlinChunkGenerator {
    pub fn new(seed: u32) -> Self {
        PerlinChunkGenerator {
            perlin: Perlin::new(seed),
            seed,
        }
    }

    pub fn seed(&self) -> u32 {
        self.seed
    }

    fn sample_height(&self, world_x: i64, world_z: i64) -> u8 {
        let sample = self.perlin.get([
            world_x as f64 * PERLIN_SCALE_FACTOR,
            world_z as f64 * PERLIN_SCALE_FACTOR,
        ]);
        (BASE_HEIGHT + sample.clamp(-1.0, 1.0) * HEIGHT_AMPLITUDE) as u8
    }
}

impl ChunkGenerator for PerlinChunkGenerator {
    type Chunk = Chunk;

    fn generate_chunk(&self, position: ChunkPosition) -> Chunk {
        let mut heights = Vec::with_capacity(CHUNK_AREA);
        let origin_x = position.x as i64 * CHUNK_DIMENSION as i64;
        let origin_z = position.y as i64 * CHUNK_DIMENSION as i64;

        for cz in 0..CHUNK_DIMENSION as i64 {
            for cx in 0..CHUNK_DIMENSION as i64 {
                heights.push(self.sample_height(origin_x + cx, origin_z + cz));
            }
        }

        Chunk::from_heights(position, heights)
            .unwrap_or_else(|| Chunk::flat(position, BASE_HEIGHT as u8))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::chunk::{chunk_position, WorldChunk};

    #[test]
    fn generation_is_deterministic() {
        let generator = PerlinChunkGenerator::new(42);

        let a = generator.generate_chunk(chunk_position(5, -3));
        let b = generator.generate_chunk(chunk_position(5, -3));

        assert_eq!(a, b);
        assert_eq!(a.position(), chunk_position(5, -3));
    }

    #[test]
    fn heights_stay_within_the_amplitude() {
        let generator = PerlinChunkGenerator::new(7);
        let chunk = generator.generate_chunk(chunk_position(-20, 11));

        for cz in 0..CHUNK_DIMENSION {
            for cx in 0..CHUNK_DIMENSION {
                let height = chunk.height_at(cx, cz) as f64;
                assert!(height >= BASE_HEIGHT - HEIGHT_AMPLITUDE);
                assert!(height <= BASE_HEIGHT + HEIGHT_AMPLITUDE);
            }
        }
    }
}
