use thiserror::Error;

/// Errors from the configuration, event registration and driver surfaces.
/// Stepping itself never fails.
#[derive(Debug, Error)]
pub enum PhysicsError {
    #[error("invalid engine options: {0}")]
    InvalidOptions(#[from] serde_json::Error),
    #[error("unknown event `{0}`")]
    UnknownEvent(String),
    #[error("no listener registered with id {0}")]
    UnknownListener(u64),
    #[error("engine driver thread panicked")]
    RunnerPanicked,
}
