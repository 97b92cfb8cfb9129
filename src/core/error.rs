use std::fmt;

/// Errors raised by chunk loaders and savers.
///
/// Loaders report storage failures as `Io`, malformed stored data as
/// `Serialization`, and data that contradicts the request (for example a chunk
/// file whose stored coordinates differ from the requested ones) as
/// `IllegalState`. `WorkerInterrupted` is produced by the provider itself when
/// a worker thread disappears before it could report a result.
#[derive(Debug)]
pub enum ChunkIoError {
    Io(std::io::Error),
    IllegalState(String),
    Serialization(String),
    WorkerInterrupted,
}

impl fmt::Display for ChunkIoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChunkIoError::Io(e) => write!(f, "chunk I/O error: {}", e),
            ChunkIoError::IllegalState(message) => write!(f, "illegal chunk state: {}", message),
            ChunkIoError::Serialization(message) => {
                write!(f, "chunk serialization error: {}", message)
            }
            ChunkIoError::WorkerInterrupted => write!(f, "chunk worker was interrupted"),
        }
    }
}

impl std::error::Error for ChunkIoError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ChunkIoError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ChunkIoError {
    fn from(e: std::io::Error) -> Self {
        ChunkIoError::Io(e)
    }
}

impl From<serde_json::Error> for ChunkIoError {
    fn from(e: serde_json::Error) -> Self {
        if e.is_io() {
            ChunkIoError::Io(e.into())
        } else {
            ChunkIoError::Serialization(e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn io_errors_keep_their_source() {
        let err: ChunkIoError =
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only").into();

        assert!(matches!(err, ChunkIoError::Io(_)));
        assert!(err.source().is_some());
        assert!(err.to_string().contains("read-only"));
    }

    #[test]
    fn malformed_json_is_a_serialization_error() {
        let parse: Result<u32, _> = serde_json::from_str("{ not json");
        let err: ChunkIoError = parse.unwrap_err().into();

        assert!(matches!(err, ChunkIoError::Serialization(_)));
    }
}
