use thiserror::Error;

/// Errors crossing the broker seam.
#[derive(Debug, Error)]
pub enum BrokerError {
    /// The transport rejected or failed the publish.
    #[error("Publish failed: {0}")]
    PublishFailed(String),

    /// The publish did not complete within its bounded timeout.
    #[error("Publish timed out")]
    Timeout,

    /// The broker is shut down.
    #[error("Broker closed")]
    Closed,
}
