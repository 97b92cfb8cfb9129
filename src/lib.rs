#![warn(rustdoc::missing_crate_level_docs)]
#![warn(rustdoc::invalid_rust_codeblocks)]

//! # Chunk Provider
//!
//! Asynchronous loading and saving of world chunks for a simulation loop that
//! must never wait on storage.
//!
//! ## Key Modules
//!
//! * `core` - Shared primitives: resource handles, errors, configuration
//! * `provider` - The `ChunkProvider` façade with its cache, load worker pool
//!   and save worker
//! * `world` - The collaborator traits (`ChunkLoader`, `ChunkGenerator`,
//!   `WorldChunk`) and a JSON-file implementation of them
//!
//! ## Usage
//!
//! ```rust
//! use chunk_provider::{ChunkProvider, ProviderConfig};
//! use chunk_provider::world::{JsonFileChunkLoader, PerlinChunkGenerator, WorldInfo};
//!
//! let dir = tempfile::tempdir().unwrap();
//! let loader = JsonFileChunkLoader::new(dir.path(), PerlinChunkGenerator::new(7));
//! let provider = ChunkProvider::new(loader, WorldInfo::new("world"), ProviderConfig::default())
//!     .unwrap()
//!     .with_generator(PerlinChunkGenerator::new(7));
//!
//! // In the tick loop: request, poll, save. None of these block on I/O.
//! let ticket = provider.load_chunk_at(0, 0);
//! ticket.wait().unwrap();
//! assert!(provider.get_chunk_at(0, 0).is_some());
//! assert!(provider.save_chunk_at(0, 0));
//!
//! provider.shutdown();
//! ```

pub mod core;
pub mod provider;
pub mod world;

pub use crate::core::{ChunkIoError, MtResource, ProviderConfig};
pub use crate::provider::{load_ticket::LoadTicket, ChunkProvider, ShutdownReport};
