use rand::distr::{Alphanumeric, SampleString};

/// Reader, processor and writer contracts.
pub mod item;

/// The chunk buffer.
pub mod chunk;

/// The pipeline engine and its builder.
pub mod pipeline;

/// Generates a random 8-character alphanumeric run name.
fn build_name() -> String {
    Alphanumeric.sample_string(&mut rand::rng(), 8)
}
