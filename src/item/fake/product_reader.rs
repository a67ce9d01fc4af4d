use std::cell::Cell;
use std::fmt;

use fake::Fake;
use fake::faker::company::en::CompanyName;
use log::debug;
use rand::RngExt;
use serde::{Deserialize, Serialize};

use crate::core::item::{ItemReader, ItemReaderResult};

/// A catalog product with a price, the shape of record the CSV reader and
/// the SQLite writer move around.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub price: f64,
}

impl fmt::Display for Product {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "id:{}, name:{}, price:{}", self.id, self.name, self.price)
    }
}

/// Item reader producing a bounded stream of random products.
///
/// Ids are sequential starting at 1; names and prices are random. Handy for
/// demos and for exercising a pipeline without an input file.
pub struct ProductReader {
    remaining: Cell<usize>,
    next_id: Cell<i64>,
}

impl ItemReader<Product> for ProductReader {
    fn read(&self) -> ItemReaderResult<Product> {
        if self.remaining.get() == 0 {
            return Ok(None);
        }
        self.remaining.set(self.remaining.get() - 1);

        let id = self.next_id.get();
        self.next_id.set(id + 1);

        let product = Product {
            id,
            name: CompanyName().fake(),
            price: (rand::rng().random_range(500..20_000) as f64) / 100.0,
        };
        debug!("Product: {}", product);
        Ok(Some(product))
    }
}

#[derive(Default)]
pub struct ProductReaderBuilder {
    number_of_items: usize,
}

impl ProductReaderBuilder {
    pub fn new() -> ProductReaderBuilder {
        ProductReaderBuilder { number_of_items: 0 }
    }

    pub fn number_of_items(mut self, number_of_items: usize) -> ProductReaderBuilder {
        self.number_of_items = number_of_items;
        self
    }

    pub fn build(self) -> ProductReader {
        ProductReader {
            remaining: Cell::new(self.number_of_items),
            next_id: Cell::new(1),
        }
    }
}
