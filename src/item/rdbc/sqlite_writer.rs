use std::cell::RefCell;
use std::future::Future;

use log::debug;
use sqlx::{Pool, QueryBuilder, Sqlite, Transaction};

use crate::BatchError;
use crate::core::item::{ChunkWriter, ChunkWriterResult};
use crate::item::rdbc::SqlItemBinder;

// SQLite caps host parameters per statement (SQLITE_MAX_VARIABLE_NUMBER). A
// chunk that would exceed it is rejected instead of silently truncated.
const BIND_LIMIT: usize = 32766;

/// Bridges the synchronous `ChunkWriter` contract onto SQLx's async API.
/// Requires a multi-threaded Tokio runtime.
fn block_on<F: Future>(future: F) -> F::Output {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
}

/// Chunk writer batching items into a SQLite table, one transaction per
/// chunk.
///
/// Each chunk becomes a single multi-row
/// `INSERT INTO <table> (<columns>) VALUES ...` statement, executed on a
/// transaction opened by [`ChunkWriter::begin`] and resolved by
/// [`ChunkWriter::commit`] or [`ChunkWriter::rollback`]. A failed chunk
/// therefore leaves no rows behind, and chunks committed earlier stand.
///
/// The writer is configured in place, builder-style; the pool, table and
/// item binder are mandatory, and at least one column must be added.
///
/// # Examples
///
/// ```no_run
/// use chunkflow::core::item::ChunkWriter;
/// use chunkflow::item::rdbc::{SqlItemBinder, sqlite_writer::SqliteChunkWriter};
/// use sqlx::{Sqlite, SqlitePool, query_builder::Separated};
///
/// #[derive(Clone)]
/// struct Product {
///     id: i64,
///     name: String,
///     price: f64,
/// }
///
/// struct ProductBinder;
///
/// impl SqlItemBinder<Product, Sqlite> for ProductBinder {
///     fn bind(&self, item: &Product, mut query_builder: Separated<Sqlite, &str>) {
///         query_builder.push_bind(item.id);
///         query_builder.push_bind(item.name.clone());
///         query_builder.push_bind(item.price);
///     }
/// }
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = SqlitePool::connect("sqlite://products.db").await?;
/// let binder = ProductBinder;
///
/// let writer = SqliteChunkWriter::new()
///     .pool(&pool)
///     .table("products")
///     .add_column("id")
///     .add_column("name")
///     .add_column("price")
///     .item_binder(&binder);
///
/// writer.begin()?;
/// writer.write(vec![Product { id: 1, name: "Keyboard".into(), price: 120.0 }])?;
/// writer.commit()?;
/// # Ok(())
/// # }
/// ```
pub struct SqliteChunkWriter<'a, O> {
    pool: Option<&'a Pool<Sqlite>>,
    table: Option<&'a str>,
    columns: Vec<&'a str>,
    item_binder: Option<&'a dyn SqlItemBinder<O, Sqlite>>,
    // Transaction of the chunk currently being written, if any.
    tx: RefCell<Option<Transaction<'static, Sqlite>>>,
}

impl<'a, O> SqliteChunkWriter<'a, O> {
    pub fn new() -> Self {
        Self {
            pool: None,
            table: None,
            columns: Vec::new(),
            item_binder: None,
            tx: RefCell::new(None),
        }
    }

    pub fn pool(mut self, pool: &'a Pool<Sqlite>) -> Self {
        self.pool = Some(pool);
        self
    }

    pub fn table(mut self, table: &'a str) -> Self {
        self.table = Some(table);
        self
    }

    /// Adds one column to the insert statement; call once per bound field,
    /// in the order the binder pushes values.
    pub fn add_column(mut self, column: &'a str) -> Self {
        self.columns.push(column);
        self
    }

    pub fn item_binder(mut self, item_binder: &'a dyn SqlItemBinder<O, Sqlite>) -> Self {
        self.item_binder = Some(item_binder);
        self
    }
}

impl<O> ChunkWriter<O> for SqliteChunkWriter<'_, O> {
    /// Opens the transaction for the next chunk.
    fn begin(&self) -> ChunkWriterResult {
        let pool = self.pool.expect("pool is required");

        let tx = block_on(pool.begin())
            .map_err(|e| BatchError::ChunkWriter(format!("failed to open transaction: {}", e)))?;
        *self.tx.borrow_mut() = Some(tx);

        debug!(
            "Transaction opened on table {}",
            self.table.unwrap_or("<unset>")
        );
        Ok(())
    }

    /// Executes the batched insert on the open transaction.
    ///
    /// Fails when no transaction is open or when the chunk would exceed the
    /// SQLite bind-parameter limit.
    fn write(&self, items: Vec<O>) -> ChunkWriterResult {
        if items.is_empty() {
            return Ok(());
        }

        let table = self.table.expect("table is required");
        let binder = self.item_binder.expect("item binder is required");
        assert!(!self.columns.is_empty(), "one or more columns are required");

        if items.len().saturating_mul(self.columns.len()) > BIND_LIMIT {
            return Err(BatchError::ChunkWriter(format!(
                "chunk of {} items exceeds the SQLite bind limit",
                items.len()
            )));
        }

        let mut query_builder = QueryBuilder::new("INSERT INTO ");
        query_builder.push(table);
        query_builder.push(" (");
        query_builder.push(self.columns.join(","));
        query_builder.push(") ");
        query_builder.push_values(items.iter(), |b, item| {
            binder.bind(item, b);
        });

        let query = query_builder.build();

        let mut tx_slot = self.tx.borrow_mut();
        let tx = tx_slot
            .as_mut()
            .ok_or_else(|| BatchError::ChunkWriter("write outside of a transaction".to_string()))?;

        match block_on(query.execute(&mut **tx)) {
            Ok(result) => {
                debug!("Inserted {} row(s) into {}", result.rows_affected(), table);
                Ok(())
            }
            Err(e) => Err(BatchError::ChunkWriter(format!("SQLite write failed: {}", e))),
        }
    }

    /// Makes the chunk durable.
    fn commit(&self) -> ChunkWriterResult {
        let tx = self
            .tx
            .borrow_mut()
            .take()
            .ok_or_else(|| BatchError::ChunkWriter("commit outside of a transaction".to_string()))?;

        block_on(tx.commit())
            .map_err(|e| BatchError::ChunkWriter(format!("commit failed: {}", e)))
    }

    /// Discards the chunk. A rollback without an open transaction is a
    /// no-op: after a failed commit the transaction is already gone.
    fn rollback(&self) -> ChunkWriterResult {
        match self.tx.borrow_mut().take() {
            Some(tx) => block_on(tx.rollback())
                .map_err(|e| BatchError::ChunkWriter(format!("rollback failed: {}", e))),
            None => Ok(()),
        }
    }
}

impl<O> Default for SqliteChunkWriter<'_, O> {
    fn default() -> Self {
        Self::new()
    }
}
