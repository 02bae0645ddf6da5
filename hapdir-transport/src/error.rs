use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("transport i/o failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("actuator link is disconnected")]
    Disconnected,
    #[error("transport worker has stopped")]
    WorkerGone,
}

impl TransportError {
    /// Classifies an I/O failure, treating a dropped link as a disconnect.
    pub fn from_io(err: std::io::Error) -> Self {
        use std::io::ErrorKind::*;
        match err.kind() {
            BrokenPipe | NotConnected | ConnectionReset | ConnectionAborted => {
                TransportError::Disconnected
            }
            _ => TransportError::Io(err),
        }
    }
}
