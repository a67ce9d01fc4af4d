#![cfg_attr(docsrs, feature(doc_cfg))]

/*!
 # Chunkflow

 A chunk-oriented batch processing engine: read records from a bounded
 source, transform or filter each one, and persist the survivors in
 fixed-size, transactional chunks.

 ## Core Concepts

 - **Pipeline:** one run of the engine, from its first read to a terminal
   `Completed` or `Failed` status. Built with `PipelineBuilder`, consumed by
   `Pipeline::run`.
 - **ItemReader:** retrieval of input, one item at a time, in stable order.
 - **ItemProcessor:** the business logic applied to each item. A processor
   either returns a transformed item or explicitly filters it out.
 - **ChunkWriter:** the output boundary. Receives whole chunks and persists
   each one as a single atomic unit inside a transaction scope driven by the
   pipeline.

 The engine groups transformed items into chunks of a configured size
 (default 10) and commits each chunk exactly once; the trailing partial
 chunk is committed when the reader is exhausted. Items are committed in the
 order they were read, and a chunk never becomes partially visible: a failed
 write or commit rolls the whole chunk back and fails the run, while
 previously committed chunks stand.

 ## Features

 The crate is modular; the engine itself has no optional dependency:

 | **Feature**   | **Description**                                          |
 |---------------|----------------------------------------------------------|
 | csv           | `ItemReader` deserializing delimited text with Serde     |
 | rdbc-sqlite   | `ChunkWriter` batching inserts into SQLite, one transaction per chunk |
 | logger        | `ChunkWriter` logging each item, for debugging wiring    |
 | fake          | `ItemReader` generating random products for demos        |
 | full          | Enables all of the above                                 |

 ## Getting Started

```rust
use std::cell::{Cell, RefCell};

use chunkflow::core::item::{
    ChunkWriter, ChunkWriterResult, ItemProcessor, ItemProcessorResult, ItemReader,
    ItemReaderResult, Processed,
};
use chunkflow::core::pipeline::{PipelineBuilder, RunStatus};

/// Counts down from a fixed sequence of amounts.
struct AmountReader {
    amounts: Vec<f64>,
    next: Cell<usize>,
}

impl ItemReader<f64> for AmountReader {
    fn read(&self) -> ItemReaderResult<f64> {
        let index = self.next.get();
        if index < self.amounts.len() {
            self.next.set(index + 1);
            Ok(Some(self.amounts[index]))
        } else {
            Ok(None)
        }
    }
}

/// Keeps amounts above 50, with a 20% surcharge; filters the rest.
struct Surcharge;

impl ItemProcessor<f64, f64> for Surcharge {
    fn process(&self, amount: f64) -> ItemProcessorResult<f64> {
        if amount > 50.0 {
            Ok(Processed::Item(amount * 1.2))
        } else {
            Ok(Processed::Filtered)
        }
    }
}

/// Collects committed chunks in memory.
#[derive(Default)]
struct CollectingWriter {
    items: RefCell<Vec<f64>>,
}

impl ChunkWriter<f64> for CollectingWriter {
    fn write(&self, items: Vec<f64>) -> ChunkWriterResult {
        self.items.borrow_mut().extend(items);
        Ok(())
    }
}

let reader = AmountReader {
    amounts: vec![100.0, 30.0, 60.0],
    next: Cell::new(0),
};
let processor = Surcharge;
let writer = CollectingWriter::default();

let result = PipelineBuilder::new()
    .name("surcharge".to_string())
    .reader(&reader)
    .processor(&processor)
    .writer(&writer)
    .chunk_size(10)
    .build()
    .run();

assert_eq!(result.status, RunStatus::Completed);
assert_eq!(result.items_read, 3);
assert_eq!(result.items_filtered, 1);
assert_eq!(result.items_written, 2);
assert_eq!(result.chunks_committed, 1);
assert_eq!(writer.items.into_inner(), vec![120.0, 72.0]);
```

 ## License

 Licensed under either of

 -   Apache License, Version 2.0
     ([LICENSE-APACHE](LICENSE-APACHE) or <http://www.apache.org/licenses/LICENSE-2.0>)
 -   MIT license
     ([LICENSE-MIT](LICENSE-MIT) or <http://opensource.org/licenses/MIT>)

 at your option.
 */

/// Core module: traits, chunk buffer and the pipeline engine.
pub mod core;

/// Error types for pipeline runs.
pub mod error;

#[doc(inline)]
pub use error::*;

/// Ready-made readers and writers (CSV, SQLite, logging, fake data).
pub mod item;
