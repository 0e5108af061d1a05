pub mod dataset;
pub mod file;

use crate::error::Error;
use ndarray::ArrayView2;
use std::path::Path;

pub use dataset::{DatasetBuilder, Element};
pub use file::FileWriter;

/// Creates a container at `path` holding a single named dataset, truncating
/// any existing file. Chunking and deflate compression are optional;
/// requesting compression without a chunk shape fails before anything is
/// written.
pub fn create_and_write<T: Element>(
    path: impl AsRef<Path>,
    name: &str,
    data: ArrayView2<'_, T>,
    chunk_shape: Option<[u32; 2]>,
    deflate_level: Option<u32>,
) -> Result<(), Error> {
    let mut writer = FileWriter::new();
    let dataset = writer.dataset(name);
    dataset.with_data(data);
    if let Some(chunk_shape) = chunk_shape {
        dataset.with_chunks(chunk_shape);
    }
    if let Some(level) = deflate_level {
        dataset.with_deflate(level);
    }
    writer.write(path)
}
