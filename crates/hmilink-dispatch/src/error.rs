/// Errors returned by registry operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    /// Every slot is occupied.
    #[error("registry full ({slots} slots in use)")]
    Full { slots: usize },

    /// The consumer already occupies a slot.
    #[error("consumer already registered in slot {slot}")]
    AlreadyRegistered { slot: usize },

    /// The consumer or id does not match any current registration.
    #[error("consumer not registered")]
    NotRegistered,

    /// The registry lock was poisoned and cannot be used.
    #[error("registry lock poisoned")]
    Poisoned,
}

impl RegistryError {
    /// Whether the caller can log this and carry on.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, RegistryError::Poisoned)
    }
}

/// Errors from the ingest side of dispatch.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// Registry failure.
    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),

    /// Frame-level error.
    #[error("frame error: {0}")]
    Frame(#[from] hmilink_frame::FrameError),

    /// Transport-level error.
    #[error("transport error: {0}")]
    Transport(#[from] hmilink_transport::TransportError),

    /// The ingest thread could not be started.
    #[error("failed to spawn ingest thread: {0}")]
    Spawn(std::io::Error),

    /// The ingest thread was already joined.
    #[error("ingest thread not running")]
    NotRunning,

    /// The ingest thread panicked.
    #[error("ingest thread panicked")]
    IngestPanicked,
}

pub type Result<T> = std::result::Result<T, DispatchError>;
