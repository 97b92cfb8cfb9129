//! # Provider Tasks
//!
//! Work the provider hands to its load worker pool.

pub mod chunk_load_task;
