#![cfg(feature = "csv")]

use std::cell::RefCell;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use chunkflow::BatchError;
use chunkflow::core::item::{
    ChunkWriter, ChunkWriterResult, ItemProcessor, ItemProcessorResult, Processed,
};
use chunkflow::core::pipeline::{PipelineBuilder, ProcessErrorPolicy, RunStatus};
use chunkflow::item::csv::csv_reader::CsvItemReaderBuilder;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
struct Product {
    id: i64,
    name: String,
    price: f64,
}

#[derive(Default)]
struct CollectingWriter {
    items: RefCell<Vec<Product>>,
}

impl ChunkWriter<Product> for CollectingWriter {
    fn write(&self, items: Vec<Product>) -> ChunkWriterResult {
        self.items.borrow_mut().extend(items);
        Ok(())
    }
}

/// Fails on products carrying a negative price.
#[derive(Default)]
struct StrictProcessor;

impl ItemProcessor<Product, Product> for StrictProcessor {
    fn process(&self, item: Product) -> ItemProcessorResult<Product> {
        if item.price.is_sign_negative() {
            Err(BatchError::ItemProcessor(format!(
                "negative price on product {}",
                item.id
            )))
        } else {
            Ok(Processed::Item(item))
        }
    }
}

#[test]
fn malformed_record_aborts_the_run_and_keeps_committed_chunks() -> Result<()> {
    // The fifth row does not parse; the first four commit as two chunks.
    let csv = "id,name,price
    1,Keyboard,100.0
    2,Cable,30.0
    3,Monitor,60.0
    4,Webcam,80.0
    oops,Speaker,20.0
    6,Headset,90.0";

    let reader = CsvItemReaderBuilder::<Product>::new()
        .has_headers(true)
        .from_reader(csv.as_bytes());
    let writer = CollectingWriter::default();

    let result = PipelineBuilder::new()
        .reader(&reader)
        .writer(&writer)
        .chunk_size(2)
        .build()
        .run();

    assert_eq!(result.status, RunStatus::Failed);
    assert!(matches!(result.error, Some(BatchError::ItemReader(_))));
    assert_eq!(result.items_read, 4);
    assert_eq!(result.items_written, 4);
    assert_eq!(result.chunks_committed, 2);

    let ids: Vec<i64> = writer.items.into_inner().iter().map(|p| p.id).collect();
    assert_eq!(ids, vec![1, 2, 3, 4]);

    Ok(())
}

#[test]
fn process_errors_are_fatal_by_default() -> Result<()> {
    let csv = "id,name,price
    1,Keyboard,100.0
    2,Refund,-5.0
    3,Monitor,60.0";

    let reader = CsvItemReaderBuilder::<Product>::new()
        .has_headers(true)
        .from_reader(csv.as_bytes());
    let processor = StrictProcessor;
    let writer = CollectingWriter::default();

    let result = PipelineBuilder::new()
        .reader(&reader)
        .processor(&processor)
        .writer(&writer)
        .chunk_size(10)
        .build()
        .run();

    assert_eq!(result.status, RunStatus::Failed);
    assert!(matches!(result.error, Some(BatchError::ItemProcessor(_))));
    assert_eq!(result.items_read, 2);
    assert_eq!(result.items_written, 0);

    Ok(())
}

#[test]
fn skip_policy_rides_over_process_errors() -> Result<()> {
    let csv = "id,name,price
    1,Keyboard,100.0
    2,Refund,-5.0
    3,Monitor,60.0
    4,Refund,-1.0
    5,Webcam,80.0";

    let reader = CsvItemReaderBuilder::<Product>::new()
        .has_headers(true)
        .from_reader(csv.as_bytes());
    let processor = StrictProcessor;
    let writer = CollectingWriter::default();

    let result = PipelineBuilder::new()
        .reader(&reader)
        .processor(&processor)
        .writer(&writer)
        .chunk_size(2)
        .on_process_error(ProcessErrorPolicy::Skip)
        .build()
        .run();

    assert_eq!(result.status, RunStatus::Completed);
    assert_eq!(result.items_read, 5);
    assert_eq!(result.items_skipped, 2);
    assert_eq!(result.items_written, 3);
    assert_eq!(result.chunks_committed, 2);

    let ids: Vec<i64> = writer.items.into_inner().iter().map(|p| p.id).collect();
    assert_eq!(ids, vec![1, 3, 5]);

    Ok(())
}
