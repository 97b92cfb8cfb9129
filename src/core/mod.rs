//! # Core Module
//!
//! Building blocks shared by the provider and the world collaborators.
//!
//! ## Key Components
//! - `MtResource`: thread-safe reference-counted resource with read-write locking
//! - `ChunkIoError`: the error type of every loader and saver
//! - `ProviderConfig`: worker counts, queue capacity and failure policies

pub mod config;
pub mod error;
pub mod mt_resource;

pub use config::{
    DuplicatePolicy, ProviderConfig, SaveFailurePolicy, DEFAULT_LOAD_WORKERS,
    DEFAULT_SAVE_QUEUE_CAPACITY,
};
pub use error::ChunkIoError;
pub use mt_resource::MtResource;
