//! The chunk-oriented pipeline engine.
//!
//! A [`Pipeline`] drives one run: it pulls items from an
//! [`ItemReader`], routes each through an [`ItemProcessor`], accumulates the
//! surviving items into a [`Chunk`], and hands every full chunk to a
//! [`ChunkWriter`] inside its own transaction scope. The final partial chunk,
//! if any, is committed when the reader is exhausted.
//!
//! A `Pipeline` value is a single run. [`Pipeline::run`] consumes the value,
//! so a finished run can never be driven again; build a new pipeline for the
//! next run.

use std::time::{Duration, Instant};

use log::{debug, error, info, warn};
use uuid::Uuid;

use crate::BatchError;

use super::build_name;
use super::chunk::Chunk;
use super::item::{
    ChunkWriter, ChunkWriterResult, ItemProcessor, ItemReader, PassthroughProcessor, Processed,
};

/// Number of transformed items grouped into one transactional commit when the
/// builder is not told otherwise.
const DEFAULT_CHUNK_SIZE: usize = 10;

/// Terminal status of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    /// The reader was exhausted and every chunk committed.
    Completed,
    /// The run was aborted by a fatal error.
    Failed,
}

/// What to do when the processor fails on one item.
///
/// Reader and writer errors are always fatal; this policy only governs the
/// processing step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProcessErrorPolicy {
    /// The first processor error aborts the run.
    #[default]
    Fatal,
    /// The offending item is discarded, counted as skipped, and the run
    /// continues with the next item.
    Skip,
}

/// Outcome of one run.
///
/// Counters reflect the work that actually completed: a chunk whose
/// transaction rolled back contributes nothing to `items_written` or
/// `chunks_committed`, while chunks committed before a failure stand.
#[derive(Debug)]
pub struct RunResult {
    /// Unique identifier of the run.
    pub id: Uuid,
    /// Human-readable run name, generated when not configured.
    pub name: String,
    pub status: RunStatus,
    pub start: Instant,
    pub end: Instant,
    pub duration: Duration,
    /// Items pulled from the reader, including ones later filtered or skipped.
    pub items_read: usize,
    /// Items intentionally dropped by the processor.
    pub items_filtered: usize,
    /// Items dropped after a processor error under [`ProcessErrorPolicy::Skip`].
    pub items_skipped: usize,
    /// Items durably committed through the writer.
    pub items_written: usize,
    /// Chunks whose transaction committed.
    pub chunks_committed: usize,
    /// First fatal error, when `status` is [`RunStatus::Failed`].
    pub error: Option<BatchError>,
}

#[derive(Default)]
struct RunCounters {
    read: usize,
    filtered: usize,
    skipped: usize,
    written: usize,
    committed: usize,
}

/// Transaction scope for one chunk commit.
///
/// Opened right before the chunk is handed to the writer and resolved on
/// every exit path: dropping the scope before a successful `commit` rolls the
/// writer back, so a failed write or a failed commit can never leave a chunk
/// half-visible.
struct TransactionScope<'w, O> {
    writer: &'w dyn ChunkWriter<O>,
    committed: bool,
}

impl<'w, O> TransactionScope<'w, O> {
    fn open(writer: &'w dyn ChunkWriter<O>) -> Result<TransactionScope<'w, O>, BatchError> {
        writer.begin()?;
        Ok(TransactionScope {
            writer,
            committed: false,
        })
    }

    fn commit(mut self) -> ChunkWriterResult {
        self.writer.commit()?;
        self.committed = true;
        Ok(())
    }
}

impl<O> Drop for TransactionScope<'_, O> {
    fn drop(&mut self) {
        if !self.committed {
            if let Err(err) = self.writer.rollback() {
                error!("Chunk rollback failed: {}", err);
            }
        }
    }
}

/// One configured run over a reader, a processor and a writer.
///
/// Built with [`PipelineBuilder`]; see the crate-level documentation for a
/// complete wiring example.
pub struct Pipeline<'a, I, O> {
    id: Uuid,
    name: String,
    reader: &'a dyn ItemReader<I>,
    processor: &'a dyn ItemProcessor<I, O>,
    writer: &'a dyn ChunkWriter<O>,
    chunk_size: usize,
    on_process_error: ProcessErrorPolicy,
}

impl<I, O> Pipeline<'_, I, O> {
    /// Executes the run to its terminal state and reports the outcome.
    ///
    /// Never panics on collaborator errors: failures surface as
    /// [`RunStatus::Failed`] with the first fatal error in
    /// [`RunResult::error`].
    pub fn run(self) -> RunResult {
        let start = Instant::now();
        info!("Run {} ({}) started", self.name, self.id);

        let mut counters = RunCounters::default();
        let outcome = self.drive(&mut counters);

        let end = Instant::now();
        let status = match &outcome {
            Ok(()) => {
                info!(
                    "Run {} completed: {} items written in {} chunks",
                    self.name, counters.written, counters.committed
                );
                RunStatus::Completed
            }
            Err(err) => {
                error!("Run {} failed: {}", self.name, err);
                RunStatus::Failed
            }
        };

        RunResult {
            id: self.id,
            name: self.name,
            status,
            start,
            end,
            duration: end.duration_since(start),
            items_read: counters.read,
            items_filtered: counters.filtered,
            items_skipped: counters.skipped,
            items_written: counters.written,
            chunks_committed: counters.committed,
            error: outcome.err(),
        }
    }

    /// The read/process/accumulate loop. Returns the first fatal error.
    fn drive(&self, counters: &mut RunCounters) -> Result<(), BatchError> {
        let mut chunk = Chunk::new(self.chunk_size);

        loop {
            match self.reader.read()? {
                None => {
                    // Reader exhausted: drain the trailing partial chunk.
                    if !chunk.is_empty() {
                        self.commit_chunk(&mut chunk, counters)?;
                    }
                    return Ok(());
                }
                Some(item) => {
                    counters.read += 1;

                    match self.processor.process(item) {
                        Ok(Processed::Item(output)) => {
                            chunk.push(output);
                            if chunk.is_full() {
                                self.commit_chunk(&mut chunk, counters)?;
                            }
                        }
                        Ok(Processed::Filtered) => {
                            counters.filtered += 1;
                        }
                        Err(err) => match self.on_process_error {
                            ProcessErrorPolicy::Fatal => return Err(err),
                            ProcessErrorPolicy::Skip => {
                                counters.skipped += 1;
                                warn!("Run {}: item skipped: {}", self.name, err);
                            }
                        },
                    }
                }
            }
        }
    }

    /// Commits one chunk boundary: the whole buffer is moved to the writer
    /// inside a fresh transaction scope, and the counters advance only after
    /// the commit resolves.
    fn commit_chunk(
        &self,
        chunk: &mut Chunk<O>,
        counters: &mut RunCounters,
    ) -> Result<(), BatchError> {
        let items = chunk.take();
        let count = items.len();

        let tx = TransactionScope::open(self.writer)?;
        self.writer.write(items)?;
        tx.commit()?;

        counters.written += count;
        counters.committed += 1;
        debug!(
            "Run {}: committed chunk {} ({} items)",
            self.name, counters.committed, count
        );
        Ok(())
    }
}

/// Builder for a [`Pipeline`].
///
/// The reader and the writer are mandatory; the processor defaults to
/// [`PassthroughProcessor`], the chunk size to 10 and the process error
/// policy to [`ProcessErrorPolicy::Fatal`].
pub struct PipelineBuilder<'a, I, O> {
    name: Option<String>,
    reader: Option<&'a dyn ItemReader<I>>,
    processor: Option<&'a dyn ItemProcessor<I, O>>,
    writer: Option<&'a dyn ChunkWriter<O>>,
    chunk_size: usize,
    on_process_error: ProcessErrorPolicy,
}

impl<'a, I, O> PipelineBuilder<'a, I, O> {
    pub fn new() -> PipelineBuilder<'a, I, O> {
        Self {
            name: None,
            reader: None,
            processor: None,
            writer: None,
            chunk_size: DEFAULT_CHUNK_SIZE,
            on_process_error: ProcessErrorPolicy::default(),
        }
    }

    /// Sets the run name used in logs and in the [`RunResult`].
    pub fn name(mut self, name: String) -> PipelineBuilder<'a, I, O> {
        self.name = Some(name);
        self
    }

    pub fn reader(mut self, reader: &'a impl ItemReader<I>) -> PipelineBuilder<'a, I, O> {
        self.reader = Some(reader);
        self
    }

    pub fn processor(mut self, processor: &'a impl ItemProcessor<I, O>) -> PipelineBuilder<'a, I, O> {
        self.processor = Some(processor);
        self
    }

    pub fn writer(mut self, writer: &'a impl ChunkWriter<O>) -> PipelineBuilder<'a, I, O> {
        self.writer = Some(writer);
        self
    }

    /// Sets the commit interval.
    ///
    /// # Panics
    ///
    /// Panics when `chunk_size` is zero; a run cannot make progress with an
    /// empty commit interval.
    pub fn chunk_size(mut self, chunk_size: usize) -> PipelineBuilder<'a, I, O> {
        assert!(chunk_size >= 1, "chunk size must be at least 1");
        self.chunk_size = chunk_size;
        self
    }

    pub fn on_process_error(mut self, policy: ProcessErrorPolicy) -> PipelineBuilder<'a, I, O> {
        self.on_process_error = policy;
        self
    }

    /// Builds the pipeline.
    ///
    /// # Panics
    ///
    /// Panics when no reader or no writer has been configured.
    pub fn build(self) -> Pipeline<'a, I, O>
    where
        PassthroughProcessor: ItemProcessor<I, O>,
    {
        Pipeline {
            id: Uuid::new_v4(),
            name: self.name.unwrap_or_else(build_name),
            reader: self.reader.expect("an item reader is required"),
            processor: self.processor.unwrap_or(&PassthroughProcessor),
            writer: self.writer.expect("a chunk writer is required"),
            chunk_size: self.chunk_size,
            on_process_error: self.on_process_error,
        }
    }
}

impl<I, O> Default for PipelineBuilder<'_, I, O> {
    fn default() -> Self {
        Self::new()
    }
}
