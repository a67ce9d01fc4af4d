/// CSV item reader built on the `csv` crate and Serde.
pub mod csv_reader;
