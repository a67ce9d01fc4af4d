use thiserror::Error;

/// Error raised at one of the three pipeline boundaries.
///
/// The variant identifies which collaborator failed; the payload carries the
/// underlying error message. Reader and writer errors are always fatal for the
/// run. Processor errors are handled according to the configured
/// [`ProcessErrorPolicy`](crate::core::pipeline::ProcessErrorPolicy).
#[derive(Error, Debug)]
pub enum BatchError {
    /// A record could not be pulled from the item reader.
    #[error("ItemReader error: {0}")]
    ItemReader(String),

    /// An item could not be processed.
    #[error("ItemProcessor error: {0}")]
    ItemProcessor(String),

    /// A chunk could not be written, or its transaction could not be resolved.
    #[error("ChunkWriter error: {0}")]
    ChunkWriter(String),
}
