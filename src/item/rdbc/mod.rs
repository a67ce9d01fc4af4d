use sqlx::{Database, query_builder::Separated};

/// SQLite chunk writer.
pub mod sqlite_writer;

/// Maps one item's fields onto the bind parameters of a batched `INSERT`.
///
/// Implementations push one value per configured column, in column order:
///
/// ```
/// use chunkflow::item::rdbc::SqlItemBinder;
/// use sqlx::{Sqlite, query_builder::Separated};
///
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
/// ```
pub trait SqlItemBinder<O, DB: Database> {
    fn bind(&self, item: &O, query_builder: Separated<DB, &str>);
}
