#![cfg(all(feature = "csv", feature = "rdbc-sqlite"))]

use anyhow::Result;
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Sqlite, SqlitePool, query_builder::Separated};

use chunkflow::BatchError;
use chunkflow::core::item::{ItemProcessor, ItemProcessorResult, Processed};
use chunkflow::core::pipeline::{PipelineBuilder, RunStatus};
use chunkflow::item::csv::csv_reader::CsvItemReaderBuilder;
use chunkflow::item::rdbc::{SqlItemBinder, sqlite_writer::SqliteChunkWriter};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
struct Product {
    id: i64,
    name: String,
    price: f64,
}

/// Keeps products priced above 50 with a 20% surcharge; filters the rest.
#[derive(Default)]
struct SurchargeProcessor;

impl ItemProcessor<Product, Product> for SurchargeProcessor {
    fn process(&self, item: Product) -> ItemProcessorResult<Product> {
        if item.price > 50.0 {
            Ok(Processed::Item(Product {
                price: item.price * 1.2,
                ..item
            }))
        } else {
            Ok(Processed::Filtered)
        }
    }
}

struct ProductBinder;

impl SqlItemBinder<Product, Sqlite> for ProductBinder {
    fn bind(&self, item: &Product, mut query_builder: Separated<Sqlite, &str>) {
        query_builder.push_bind(item.id);
        query_builder.push_bind(item.name.clone());
        query_builder.push_bind(item.price);
    }
}

// A single connection keeps every operation on the same in-memory database.
async fn setup_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();

    sqlx::query(
        r#"
        CREATE TABLE products (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            price REAL NOT NULL
        )
        "#,
    )
    .execute(&pool)
    .await
    .unwrap();

    pool
}

fn product_writer<'a>(
    pool: &'a SqlitePool,
    binder: &'a ProductBinder,
) -> SqliteChunkWriter<'a, Product> {
    SqliteChunkWriter::new()
        .pool(pool)
        .table("products")
        .add_column("id")
        .add_column("name")
        .add_column("price")
        .item_binder(binder)
}

#[tokio::test(flavor = "multi_thread")]
async fn imports_csv_products_into_sqlite() -> Result<()> {
    let pool = setup_pool().await;
    let binder = ProductBinder;

    let csv = "id,name,price
    1,Keyboard,100.0
    2,Cable,30.0
    3,Monitor,60.0";

    let reader = CsvItemReaderBuilder::<Product>::new()
        .has_headers(true)
        .from_reader(csv.as_bytes());
    let processor = SurchargeProcessor;
    let writer = product_writer(&pool, &binder);

    let result = PipelineBuilder::new()
        .name("import-products".to_string())
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

    let rows: Vec<(i64, String, f64)> =
        sqlx::query_as("SELECT id, name, price FROM products ORDER BY id")
            .fetch_all(&pool)
            .await?;

    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].0, 1);
    assert_eq!(rows[0].1, "Keyboard");
    assert!((rows[0].2 - 120.0).abs() < 1e-9);
    assert_eq!(rows[1].0, 3);
    assert_eq!(rows[1].1, "Monitor");
    assert!((rows[1].2 - 72.0).abs() < 1e-9);

    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn failed_chunk_rolls_back_without_touching_committed_chunks() -> Result<()> {
    let pool = setup_pool().await;
    let binder = ProductBinder;

    // Collides with id 15 of the second chunk.
    sqlx::query("INSERT INTO products (id, name, price) VALUES (15, 'Blocker', 1.0)")
        .execute(&pool)
        .await?;

    let mut csv = String::from("id,name,price\n");
    for id in 1..=25 {
        csv.push_str(&format!("{},Product {},100.0\n", id, id));
    }

    let reader = CsvItemReaderBuilder::<Product>::new()
        .has_headers(true)
        .from_reader(csv.as_bytes());
    let writer = product_writer(&pool, &binder);

    let result = PipelineBuilder::new()
        .reader(&reader)
        .writer(&writer)
        .chunk_size(10)
        .build()
        .run();

    assert_eq!(result.status, RunStatus::Failed);
    assert!(matches!(result.error, Some(BatchError::ChunkWriter(_))));
    assert_eq!(result.items_written, 10);
    assert_eq!(result.chunks_committed, 1);

    // The first chunk and the pre-existing row stand; nothing of the second
    // chunk is visible.
    let ids: Vec<i64> = sqlx::query_scalar("SELECT id FROM products ORDER BY id")
        .fetch_all(&pool)
        .await?;
    let mut expected: Vec<i64> = (1..=10).collect();
    expected.push(15);
    assert_eq!(ids, expected);

    Ok(())
}
