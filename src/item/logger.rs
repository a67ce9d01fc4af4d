use std::fmt::Debug;

use log::info;

use crate::core::item::{ChunkWriter, ChunkWriterResult};

/// Chunk writer that logs every item through the `log` facade instead of
/// persisting it.
///
/// Non-transactional: the `begin`/`commit`/`rollback` defaults apply. Useful
/// as a stand-in sink while wiring a pipeline, or chained into tests to
/// watch chunks flow.
#[derive(Default)]
pub struct LoggerWriter;

impl<O> ChunkWriter<O> for LoggerWriter
where
    O: Debug,
{
    fn write(&self, items: Vec<O>) -> ChunkWriterResult {
        info!("Chunk of {} item(s)", items.len());
        items.iter().for_each(|item| info!("Record: {:?}", item));
        Ok(())
    }
}
