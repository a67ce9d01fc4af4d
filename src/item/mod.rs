#[cfg(feature = "csv")]
/// CSV item reader.
pub mod csv;

#[cfg(feature = "logger")]
/// Logging chunk writer, useful for debugging pipeline wiring.
pub mod logger;

#[cfg(feature = "fake")]
/// Fake item reader generating random products.
pub mod fake;

#[cfg(feature = "rdbc-sqlite")]
/// SQLite chunk writer with one transaction per chunk.
pub mod rdbc;
