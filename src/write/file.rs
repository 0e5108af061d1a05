use crate::error::Error;
use crate::format::{DATASPACE_VERSION, FILTER_ID_DEFLATE, FORMAT_VERSION, SIGNATURE};
use crate::padding::padded_size;
use crate::write::dataset::DatasetBuilder;
use byteorder::{LittleEndian, WriteBytesExt};
use std::path::Path;

/// Builder for a new container file. Datasets are accumulated in memory and
/// serialized as a whole by `finish`/`write`, so a failed write never leaves
/// a partially valid container behind.
pub struct FileWriter {
    datasets: Vec<DatasetBuilder>,
}

enum Placement {
    Contiguous { address: u64, size: u64 },
    Chunked { index_address: u64 },
}

struct ChunkPayload {
    offsets: [u64; 2],
    address: u64,
    bytes: Vec<u8>,
}

impl FileWriter {
    pub fn new() -> Self {
        Self { datasets: vec![] }
    }

    /// Starts (or restarts) a dataset with the given name and returns its
    /// builder for configuring data, chunking, and compression.
    pub fn dataset(&mut self, name: &str) -> &mut DatasetBuilder {
        if let Some(index) = self.datasets.iter().position(|dataset| dataset.name == name) {
            self.datasets[index] = DatasetBuilder::new(name);
            return &mut self.datasets[index];
        }
        self.datasets.push(DatasetBuilder::new(name));
        let index = self.datasets.len() - 1;
        &mut self.datasets[index]
    }

    /// Serializes the container to bytes. Validation runs first, so no
    /// output is produced for an inconsistent configuration.
    pub fn finish(self) -> Result<Vec<u8>, Error> {
        for dataset in &self.datasets {
            dataset.validate()?;
        }

        // Chunk payloads first: compressed sizes must be known before any
        // address can be assigned.
        let mut payloads: Vec<Option<Vec<ChunkPayload>>> = vec![];
        for dataset in &self.datasets {
            payloads.push(match dataset.chunk_shape {
                Some(chunk_shape) => Some(chunk_payloads(dataset, chunk_shape)?),
                None => None,
            });
        }

        // The header section has a fixed size regardless of the addresses
        // it carries, so a first pass with placeholders measures it.
        let mut header_section = vec![];
        for dataset in &self.datasets {
            let placement = match dataset.chunk_shape {
                Some(_) => Placement::Chunked { index_address: 0 },
                None => Placement::Contiguous {
                    address: 0,
                    size: dataset.data.len() as u64,
                },
            };
            encode_dataset_header(&mut header_section, dataset, &placement)?;
        }
        let superblock_size = SIGNATURE.len() + 1 + 3 + 4 + 8;
        let header_size = (superblock_size + header_section.len()) as u64;

        // Assign placements in file order: contiguous data directly, chunked
        // data as index followed by chunk bytes.
        let mut placements = vec![];
        let mut cursor = header_size;
        for (dataset, payload) in self.datasets.iter().zip(payloads.iter_mut()) {
            match payload {
                None => {
                    placements.push(Placement::Contiguous {
                        address: cursor,
                        size: dataset.data.len() as u64,
                    });
                    cursor += dataset.data.len() as u64;
                }
                Some(chunks) => {
                    placements.push(Placement::Chunked {
                        index_address: cursor,
                    });
                    cursor += 4 + chunks.len() as u64 * 32;
                    for chunk in chunks.iter_mut() {
                        chunk.address = cursor;
                        cursor += chunk.bytes.len() as u64;
                    }
                }
            }
        }
        let end_of_file_address = cursor;

        let mut output = Vec::with_capacity(end_of_file_address as usize);
        output.extend_from_slice(&SIGNATURE);
        output.write_u8(FORMAT_VERSION)?;
        output.extend_from_slice(&[0; 3]);
        output.write_u32::<LittleEndian>(self.datasets.len() as u32)?;
        output.write_u64::<LittleEndian>(end_of_file_address)?;
        for (dataset, placement) in self.datasets.iter().zip(placements.iter()) {
            encode_dataset_header(&mut output, dataset, placement)?;
        }
        for (dataset, payload) in self.datasets.iter().zip(payloads.iter()) {
            match payload {
                None => output.extend_from_slice(&dataset.data),
                Some(chunks) => {
                    output.write_u32::<LittleEndian>(chunks.len() as u32)?;
                    for chunk in chunks {
                        output.write_u64::<LittleEndian>(chunk.offsets[0])?;
                        output.write_u64::<LittleEndian>(chunk.offsets[1])?;
                        output.write_u64::<LittleEndian>(chunk.bytes.len() as u64)?;
                        output.write_u64::<LittleEndian>(chunk.address)?;
                    }
                    for chunk in chunks {
                        output.extend_from_slice(&chunk.bytes);
                    }
                }
            }
        }

        log::debug!(
            "Serialized container: {} datasets, {} bytes",
            self.datasets.len(),
            output.len()
        );
        if output.len() as u64 != end_of_file_address {
            return Err(Error::FormatError(format!(
                "Serialized {} bytes but planned {}",
                output.len(),
                end_of_file_address
            )));
        }
        Ok(output)
    }

    /// Serializes the container and writes it to `path`, truncating any
    /// existing file.
    pub fn write(self, path: impl AsRef<Path>) -> Result<(), Error> {
        let bytes = self.finish()?;
        std::fs::write(path, bytes)?;
        Ok(())
    }
}

impl Default for FileWriter {
    fn default() -> Self {
        Self::new()
    }
}

fn encode_dataset_header(
    output: &mut Vec<u8>,
    dataset: &DatasetBuilder,
    placement: &Placement,
) -> Result<(), Error> {
    let name_length = dataset.name.len();
    if name_length > u16::MAX as usize {
        return Err(Error::FormatError(format!(
            "Dataset name of {} bytes is too long",
            name_length
        )));
    }
    output.write_u16::<LittleEndian>(name_length as u16)?;
    output.extend_from_slice(dataset.name.as_bytes());
    // NUL terminator plus zero padding to an 8-byte boundary
    let name_length_padded = padded_size(name_length + 1);
    output.extend(std::iter::repeat(0).take(name_length_padded - name_length));

    output.write_u8(dataset.encoding as u8)?;
    output.write_u8(if dataset.signed { 1 } else { 0 })?;
    output.write_u32::<LittleEndian>(dataset.item_size as u32)?;

    output.write_u8(DATASPACE_VERSION)?;
    output.write_u8(2)?;
    output.write_u16::<LittleEndian>(0)?;
    output.write_u64::<LittleEndian>(dataset.shape[0] as u64)?;
    output.write_u64::<LittleEndian>(dataset.shape[1] as u64)?;

    match dataset.deflate_level {
        Some(level) => {
            output.write_u8(1)?;
            output.write_u16::<LittleEndian>(FILTER_ID_DEFLATE)?;
            output.write_u32::<LittleEndian>(level)?;
        }
        None => output.write_u8(0)?,
    }

    match placement {
        Placement::Contiguous { address, size } => {
            output.write_u8(1)?;
            output.write_u64::<LittleEndian>(*address)?;
            output.write_u64::<LittleEndian>(*size)?;
        }
        Placement::Chunked { index_address } => {
            output.write_u8(2)?;
            output.write_u8(2)?;
            output.write_u64::<LittleEndian>(*index_address)?;
            let chunk_shape = dataset.chunk_shape.unwrap_or([0, 0]);
            output.write_u32::<LittleEndian>(chunk_shape[0])?;
            output.write_u32::<LittleEndian>(chunk_shape[1])?;
        }
    }
    Ok(())
}

fn chunk_payloads(
    dataset: &DatasetBuilder,
    chunk_shape: [u32; 2],
) -> Result<Vec<ChunkPayload>, Error> {
    let [rows, cols] = dataset.shape;
    let chunk_rows = chunk_shape[0] as usize;
    let chunk_cols = chunk_shape[1] as usize;
    let item_size = dataset.item_size;

    let mut chunks = vec![];
    let mut row_start = 0;
    while row_start < rows {
        let mut col_start = 0;
        while col_start < cols {
            // Edge chunks are stored at full chunk size, zero-padded past
            // the dataset boundary.
            let mut buffer = vec![0; chunk_rows * chunk_cols * item_size];
            let copy_rows = chunk_rows.min(rows - row_start);
            let copy_cols = chunk_cols.min(cols - col_start);
            for row in 0..copy_rows {
                let source = ((row_start + row) * cols + col_start) * item_size;
                let target = row * chunk_cols * item_size;
                buffer[target..target + copy_cols * item_size]
                    .copy_from_slice(&dataset.data[source..source + copy_cols * item_size]);
            }
            let bytes = match dataset.deflate_level {
                #[cfg(feature = "deflate")]
                Some(level) => deflate(&buffer, level)?,
                #[cfg(not(feature = "deflate"))]
                Some(_) => {
                    return Err(Error::UnavailableFilter(
                        "deflate support was not compiled in".to_string(),
                    ));
                }
                None => buffer,
            };
            chunks.push(ChunkPayload {
                offsets: [row_start as u64, col_start as u64],
                address: 0,
                bytes,
            });
            col_start += chunk_cols;
        }
        row_start += chunk_rows;
    }

    Ok(chunks)
}

#[cfg(feature = "deflate")]
fn deflate(buffer: &[u8], level: u32) -> Result<Vec<u8>, Error> {
    use std::io::Write;

    let mut encoder = flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::new(level));
    encoder.write_all(buffer)?;
    Ok(encoder.finish()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::read::file::FileReader;
    use ndarray::Array2;
    use std::io::Cursor;

    fn reference_grid() -> Array2<i32> {
        Array2::from_shape_fn((4, 6), |(i, j)| (i * 6 + j) as i32)
    }

    fn reader_for(bytes: Vec<u8>) -> FileReader {
        FileReader::read(Box::new(Cursor::new(bytes))).unwrap()
    }

    #[test]
    fn output_starts_with_signature() {
        let mut writer = FileWriter::new();
        writer.dataset("dset").with_data(reference_grid().view());
        let bytes = writer.finish().unwrap();
        assert_eq!(&bytes[..8], &SIGNATURE);
    }

    #[test]
    fn contiguous_roundtrip_in_memory() {
        let data = reference_grid();
        let mut writer = FileWriter::new();
        writer.dataset("dset").with_data(data.view());
        let mut file = reader_for(writer.finish().unwrap());
        let dataset = file.dataset("dset").unwrap();
        assert_eq!(dataset.shape(), vec![4, 6]);
        assert!(!dataset.is_chunked());
        assert_eq!(dataset.read::<i32>(&mut file).unwrap(), data);
    }

    #[cfg(feature = "deflate")]
    #[test]
    fn chunked_deflate_roundtrip_in_memory() {
        let data = reference_grid();
        let mut writer = FileWriter::new();
        writer
            .dataset("compressed_dset")
            .with_data(data.view())
            .with_chunks([2, 3])
            .with_deflate(6);
        let mut file = reader_for(writer.finish().unwrap());
        let dataset = file.dataset("compressed_dset").unwrap();
        assert!(dataset.is_chunked());
        assert_eq!(dataset.read::<i32>(&mut file).unwrap(), data);
    }

    #[test]
    fn chunked_edge_chunks_roundtrip() {
        // 5x7 is not divisible by 2x3, so the right and bottom chunks are
        // stored padded and clamped on read.
        let data = Array2::from_shape_fn((5, 7), |(i, j)| (i * 7 + j) as i32);
        let mut writer = FileWriter::new();
        writer
            .dataset("edges")
            .with_data(data.view())
            .with_chunks([2, 3]);
        let mut file = reader_for(writer.finish().unwrap());
        let dataset = file.dataset("edges").unwrap();
        assert_eq!(dataset.read::<i32>(&mut file).unwrap(), data);
    }

    #[test]
    fn multiple_datasets_roundtrip() {
        let first = reference_grid();
        let second = Array2::from_shape_fn((3, 3), |(i, j)| (i * 3 + j) as i64);
        let mut writer = FileWriter::new();
        writer.dataset("first").with_data(first.view());
        writer
            .dataset("second")
            .with_data(second.view())
            .with_chunks([2, 2]);
        let mut file = reader_for(writer.finish().unwrap());
        assert_eq!(file.dataset_names(), vec!["first", "second"]);
        let dataset = file.dataset("first").unwrap();
        assert_eq!(dataset.read::<i32>(&mut file).unwrap(), first);
        let dataset = file.dataset("second").unwrap();
        assert_eq!(dataset.read::<i64>(&mut file).unwrap(), second);
    }

    #[test]
    fn redefining_a_dataset_replaces_it() {
        let stale = Array2::from_elem((2, 2), -1i32);
        let fresh = reference_grid();
        let mut writer = FileWriter::new();
        writer.dataset("dset").with_data(stale.view());
        writer.dataset("dset").with_data(fresh.view());
        let mut file = reader_for(writer.finish().unwrap());
        assert_eq!(file.dataset_names(), vec!["dset"]);
        let dataset = file.dataset("dset").unwrap();
        assert_eq!(dataset.read::<i32>(&mut file).unwrap(), fresh);
    }

    #[test]
    fn invalid_configuration_produces_no_output() {
        let mut writer = FileWriter::new();
        writer
            .dataset("dset")
            .with_data(reference_grid().view())
            .with_deflate(6);
        assert!(matches!(
            writer.finish(),
            Err(Error::InvalidChunkShape(_))
        ));
    }

    #[test]
    fn wrong_element_type_is_rejected_on_read() {
        let mut writer = FileWriter::new();
        writer.dataset("dset").with_data(reference_grid().view());
        let mut file = reader_for(writer.finish().unwrap());
        let dataset = file.dataset("dset").unwrap();
        assert!(matches!(
            dataset.read::<i64>(&mut file),
            Err(Error::FormatError(_))
        ));
    }

    #[test]
    fn missing_dataset_name_is_not_found() {
        let mut writer = FileWriter::new();
        writer.dataset("dset").with_data(reference_grid().view());
        let file = reader_for(writer.finish().unwrap());
        assert!(matches!(
            file.dataset("absent"),
            Err(Error::NotFound(_))
        ));
    }
}
