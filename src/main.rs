//! # Chunk Provider Demo
//!
//! Drives a `ChunkProvider` the way a tick loop would: request a square of
//! chunks around the origin, poll until they are cached, edit a few, queue
//! saves and shut down.
//!
//! ## Usage
//!
//! ```bash
//! RUST_LOG=debug cargo run -- [config.json] [save-dir]
//! ```

use std::path::PathBuf;
use std::time::Duration;

use chunk_provider::world::{ChunkLoader, JsonFileChunkLoader, PerlinChunkGenerator, WorldInfo};
use chunk_provider::{ChunkIoError, ChunkProvider, ProviderConfig};
use log::{error, info, warn};

/// Chunks loaded in every direction from the origin.
const VIEW_RADIUS: i32 = 4;
const TICK: Duration = Duration::from_millis(50);
const MAX_TICKS: usize = 200;

fn main() {
    let mut log_builder = env_logger::Builder::new();
    log_builder
        .target(env_logger::Target::Stdout)
        .parse_env("RUST_LOG")
        .init();

    if let Err(e) = run() {
        error!("{}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<(), ChunkIoError> {
    let mut args = std::env::args().skip(1);
    let config = match args.next() {
        Some(path) => ProviderConfig::from_json_file(path)?,
        None => ProviderConfig::default(),
    };
    let save_dir = args
        .next()
        .map(PathBuf::from)
        .unwrap_or_else(|| std::env::temp_dir().join("chunk-provider-demo"));

    let seed = fastrand::u32(..);
    info!("Saving to {:?} with seed {}", save_dir, seed);

    let loader = JsonFileChunkLoader::new(&save_dir, PerlinChunkGenerator::new(seed));
    let provider = ChunkProvider::new(loader, WorldInfo::new("demo"), config)?
        .with_generator(PerlinChunkGenerator::new(seed));

    let mut wanted = Vec::new();
    for x in -VIEW_RADIUS..=VIEW_RADIUS {
        for z in -VIEW_RADIUS..=VIEW_RADIUS {
            // Fire and forget: the tick loop only polls the cache.
            provider.load_chunk_at(x, z);
            wanted.push((x, z));
        }
    }

    let missing = wait_for_chunks(&provider, wanted);
    if !missing.is_empty() {
        warn!("{} chunks never made it into the cache", missing.len());
    }

    for position in provider.cache().positions() {
        if let Some(chunk) = provider.get_chunk_at(position.x, position.y) {
            let mut chunk = chunk.get_mut();
            let (cx, cz) = (fastrand::usize(..16), fastrand::usize(..16));
            let height = chunk.height_at(cx, cz).saturating_add(1);
            chunk.set_height(cx, cz, height);
        }
        if !provider.save_chunk_at(position.x, position.y) {
            warn!("Save of chunk ({}, {}) was rejected", position.x, position.y);
        }
    }

    let report = provider.shutdown();
    info!(
        "Done: {} loads, {} saves, {} dropped, save worker {:?}",
        report.loads_completed, report.saves_persisted, report.saves_dropped, report.save_worker
    );
    Ok(())
}

/// Polls the cache once per tick until every wanted chunk is cached or no
/// loads are left, and returns the positions that are still missing.
fn wait_for_chunks<L: ChunkLoader>(
    provider: &ChunkProvider<L>,
    mut wanted: Vec<(i32, i32)>,
) -> Vec<(i32, i32)> {
    for _ in 0..MAX_TICKS {
        wanted.retain(|&(x, z)| provider.get_chunk_at(x, z).is_none());
        if wanted.is_empty() || provider.pending_loads() == 0 {
            break;
        }
        std::thread::sleep(TICK);
    }
    // Loads may have finished since the last check.
    wanted.retain(|&(x, z)| provider.get_chunk_at(x, z).is_none());
    wanted
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_requested_chunk_is_reported_cached() {
        let dir = tempfile::tempdir().unwrap();
        let loader = JsonFileChunkLoader::new(dir.path(), PerlinChunkGenerator::new(1));
        let provider =
            ChunkProvider::new(loader, WorldInfo::new("demo"), ProviderConfig::default()).unwrap();

        let mut wanted = Vec::new();
        for x in -1..=1 {
            for z in -1..=1 {
                provider.load_chunk_at(x, z);
                wanted.push((x, z));
            }
        }

        assert!(wait_for_chunks(&provider, wanted).is_empty());
        assert_eq!(provider.cache().len(), 9);
    }
}
