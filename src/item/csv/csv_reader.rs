use std::{cell::RefCell, fs::File, io::Read, marker::PhantomData, path::Path};

use csv::{DeserializeRecordsIntoIter, ReaderBuilder, Trim};
use serde::de::DeserializeOwned;

use crate::{
    core::item::{ItemReader, ItemReaderResult},
    error::BatchError,
};

/// Item reader deserializing delimited text into typed records, one row per
/// item.
///
/// Rows come back in file order. A malformed row (wrong field count, value
/// that does not parse into the target type) surfaces as
/// [`BatchError::ItemReader`], which aborts the run. Reading past the last
/// row keeps returning `Ok(None)`.
///
/// # Examples
///
/// ```
/// use chunkflow::core::item::ItemReader;
/// use chunkflow::item::csv::csv_reader::CsvItemReaderBuilder;
/// use serde::Deserialize;
///
/// #[derive(Debug, Deserialize)]
/// struct Product {
///     id: u32,
///     name: String,
///     price: f64,
/// }
///
/// let data = "id,name,price
/// 1,Keyboard,100.0
/// 2,Cable,30.0";
///
/// let reader = CsvItemReaderBuilder::<Product>::new()
///     .has_headers(true)
///     .from_reader(data.as_bytes());
///
/// let first: Product = reader.read().unwrap().unwrap();
/// assert_eq!(first.id, 1);
/// assert_eq!(first.name, "Keyboard");
///
/// let second: Product = reader.read().unwrap().unwrap();
/// assert_eq!(second.price, 30.0);
///
/// assert!(reader.read().unwrap().is_none());
/// assert!(reader.read().unwrap().is_none());
/// ```
pub struct CsvItemReader<R, T> {
    // Interior mutability keeps `read(&self)` compatible with the trait while
    // the underlying iterator advances.
    records: RefCell<DeserializeRecordsIntoIter<R, T>>,
}

impl<R: Read, T: DeserializeOwned> ItemReader<T> for CsvItemReader<R, T> {
    fn read(&self) -> ItemReaderResult<T> {
        match self.records.borrow_mut().next() {
            Some(Ok(record)) => Ok(Some(record)),
            Some(Err(error)) => Err(BatchError::ItemReader(error.to_string())),
            None => Ok(None),
        }
    }
}

/// Builder for [`CsvItemReader`].
///
/// Defaults: comma delimiter, no header row, all fields trimmed, strict
/// field counts.
pub struct CsvItemReaderBuilder<T> {
    delimiter: u8,
    has_headers: bool,
    _item: PhantomData<T>,
}

impl<T: DeserializeOwned> CsvItemReaderBuilder<T> {
    pub fn new() -> Self {
        Self {
            delimiter: b',',
            has_headers: false,
            _item: PhantomData,
        }
    }

    pub fn delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// When enabled, the first row is consumed as column names and used to
    /// match fields during deserialization instead of column order.
    pub fn has_headers(mut self, yes: bool) -> Self {
        self.has_headers = yes;
        self
    }

    /// Creates a reader over any [`Read`] source (file, string, socket).
    pub fn from_reader<R: Read>(self, rdr: R) -> CsvItemReader<R, T> {
        let rdr = ReaderBuilder::new()
            .trim(Trim::All)
            .delimiter(self.delimiter)
            .has_headers(self.has_headers)
            .flexible(false)
            .from_reader(rdr);

        CsvItemReader {
            records: RefCell::new(rdr.into_deserialize()),
        }
    }

    /// Creates a reader over a file.
    ///
    /// # Panics
    ///
    /// Panics when the file cannot be opened; a missing input file is a
    /// wiring mistake, not a per-record failure.
    pub fn from_path<P: AsRef<Path>>(self, path: P) -> CsvItemReader<File, T> {
        let rdr = ReaderBuilder::new()
            .trim(Trim::All)
            .delimiter(self.delimiter)
            .has_headers(self.has_headers)
            .flexible(false)
            .from_path(path)
            .expect("Unable to open file");

        CsvItemReader {
            records: RefCell::new(rdr.into_deserialize()),
        }
    }
}

impl<T: DeserializeOwned> Default for CsvItemReaderBuilder<T> {
    fn default() -> Self {
        Self::new()
    }
}
