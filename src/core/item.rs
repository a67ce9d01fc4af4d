use crate::error::BatchError;

/// Result of one [`ItemReader::read`] call.
///
/// `Ok(Some(item))` is the next record, `Ok(None)` is end of stream.
pub type ItemReaderResult<I> = Result<Option<I>, BatchError>;

/// Result of one [`ItemProcessor::process`] call.
pub type ItemProcessorResult<O> = Result<Processed<O>, BatchError>;

/// Result of the [`ChunkWriter`] operations.
pub type ChunkWriterResult = Result<(), BatchError>;

/// Reads items one at a time from a bounded, ordered source.
///
/// Implementations must preserve input order and must not duplicate or
/// silently drop records. Once `read` has returned `Ok(None)`, every further
/// call returns `Ok(None)` as well.
pub trait ItemReader<I> {
    /// Pulls the next item, `Ok(None)` on exhaustion.
    ///
    /// A returned error aborts the whole run; there is no per-record recovery
    /// on the read side.
    fn read(&self) -> ItemReaderResult<I>;
}

/// Outcome of processing a single item.
///
/// Filtering is an explicit, successful outcome. It is not an error, and it
/// is distinct from an absent value.
#[derive(Debug, Clone, PartialEq)]
pub enum Processed<O> {
    /// The transformed item, to be appended to the current chunk.
    Item(O),
    /// The item is intentionally dropped and never reaches the writer.
    Filtered,
}

/// Transforms or filters one item.
///
/// Implementations are expected to be pure functions of the input item and
/// their own configuration, with no side effect observable outside the
/// returned value. Business rules live here, swappable without touching the
/// pipeline:
///
/// ```
/// use chunkflow::core::item::{ItemProcessor, ItemProcessorResult, Processed};
///
/// /// Keeps amounts above a cutoff, scaled; filters the rest.
/// struct Surcharge {
///     cutoff: f64,
///     scale: f64,
/// }
///
/// impl ItemProcessor<f64, f64> for Surcharge {
///     fn process(&self, amount: f64) -> ItemProcessorResult<f64> {
///         if amount > self.cutoff {
///             Ok(Processed::Item(amount * self.scale))
///         } else {
///             Ok(Processed::Filtered)
///         }
///     }
/// }
///
/// let policy = Surcharge { cutoff: 50.0, scale: 1.2 };
/// assert_eq!(policy.process(100.0).unwrap(), Processed::Item(120.0));
/// assert_eq!(policy.process(30.0).unwrap(), Processed::Filtered);
/// ```
pub trait ItemProcessor<I, O> {
    /// Consumes one item and decides whether it survives.
    fn process(&self, item: I) -> ItemProcessorResult<O>;
}

/// Persists whole chunks of items atomically.
///
/// The pipeline calls `write` exactly once per chunk, always between a
/// `begin` and a matching `commit` or `rollback`. The three transaction
/// methods default to no-ops so that writers without a transactional resource
/// (logging, in-memory collection) only implement `write`; transactional
/// writers override them to map onto their store's transaction scope.
pub trait ChunkWriter<O> {
    /// Opens the transaction scope for the next chunk.
    fn begin(&self) -> ChunkWriterResult {
        Ok(())
    }

    /// Writes one full chunk. The chunk is moved in; the writer owns the
    /// items from here on.
    fn write(&self, items: Vec<O>) -> ChunkWriterResult;

    /// Makes everything written since `begin` durable.
    fn commit(&self) -> ChunkWriterResult {
        Ok(())
    }

    /// Discards everything written since `begin`.
    fn rollback(&self) -> ChunkWriterResult {
        Ok(())
    }
}

/// Processor that forwards every item unchanged.
///
/// Used by the pipeline builder when no processor is configured.
#[derive(Default)]
pub struct PassthroughProcessor;

impl<I> ItemProcessor<I, I> for PassthroughProcessor {
    fn process(&self, item: I) -> ItemProcessorResult<I> {
        Ok(Processed::Item(item))
    }
}
