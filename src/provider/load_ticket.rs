use std::sync::mpsc::{Receiver, RecvTimeoutError, TryRecvError};
use std::time::Duration;

use crate::core::ChunkIoError;
use crate::world::ChunkPosition;

pub type LoadResult = Result<ChunkPosition, ChunkIoError>;

/// Completion handle for one `load_chunk_at` call.
///
/// Dropping the ticket is always fine: the load still runs and its result only
/// shows up in the cache (or in the log, if it failed).
#[derive(Debug)]
pub struct LoadTicket {
    position: ChunkPosition,
    result_receiver: Receiver<LoadResult>,
}

impl LoadTicket {
    pub(crate) fn new(position: ChunkPosition, result_receiver: Receiver<LoadResult>) -> Self {
        LoadTicket {
            position,
            result_receiver,
        }
    }

    /// The position this load was requested for.
    pub fn position(&self) -> ChunkPosition {
        self.position
    }

    /// Blocks until the load has finished.
    ///
    /// Returns `Err(WorkerInterrupted)` if the load was dropped without running,
    /// for example because the provider was already shutting down.
    pub fn wait(self) -> LoadResult {
        self.result_receiver
            .recv()
            .unwrap_or(Err(ChunkIoError::WorkerInterrupted))
    }

    /// Like `wait`, but gives up after `timeout` and hands the ticket back.
    pub fn wait_timeout(self, timeout: Duration) -> Result<LoadResult, LoadTicket> {
        match self.result_receiver.recv_timeout(timeout) {
            Ok(result) => Ok(result),
            Err(RecvTimeoutError::Timeout) => Err(self),
            Err(RecvTimeoutError::Disconnected) => Ok(Err(ChunkIoError::WorkerInterrupted)),
        }
    }

    /// Returns the result if the load has finished, without blocking.
    ///
    /// The result is handed out once; polling again afterwards reports
    /// `WorkerInterrupted`.
    pub fn try_result(&self) -> Option<LoadResult> {
        match self.result_receiver.try_recv() {
            Ok(result) => Some(result),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(Err(ChunkIoError::WorkerInterrupted)),
        }
    }
}
