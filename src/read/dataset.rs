use crate::error::Error;
use crate::read::{
    chunk_index::parse_chunk_index,
    data_storage::DataStorage,
    dataspace::Dataspace,
    datatype::{Datatype, DatatypeEncoding},
    file::{DatasetHeader, FileReader},
    filter_pipeline::{FilterPipeline, FilterType},
};
use byteorder::{ByteOrder, LittleEndian};
use ndarray::{s, Array2};
use num_traits::identities::Zero;
use std::fmt::Debug;
use std::io::{Read, Seek, SeekFrom};

#[derive(Clone, Debug)]
pub struct Dataset {
    pub header: DatasetHeader,
}

pub trait DatatypeVerifiable: Sized {
    fn verify(datatype: &Datatype) -> Result<(), Error>;
    fn decode(buffer: &[u8]) -> Vec<Self>;
}

macro_rules! add_verifiable_type {
    ($rust_type:ty, $encoding:expr, $size:expr, $signed:expr, $read_into:ident) => {
        impl DatatypeVerifiable for $rust_type {
            fn verify(datatype: &Datatype) -> Result<(), Error> {
                if datatype.encoding != $encoding
                    || datatype.size != $size
                    || datatype.signed() != $signed
                {
                    return Err(Error::FormatError(format!(
                        "Wrong datatype found for {}: {:?}",
                        stringify!($rust_type),
                        datatype
                    )));
                }
                Ok(())
            }

            fn decode(buffer: &[u8]) -> Vec<$rust_type> {
                let mut values = vec![0; buffer.len() / $size as usize];
                LittleEndian::$read_into(buffer, &mut values);
                values
            }
        }
    };
}

add_verifiable_type!(i32, DatatypeEncoding::FixedPoint, 4, true, read_i32_into);
add_verifiable_type!(i64, DatatypeEncoding::FixedPoint, 8, true, read_i64_into);

impl Dataset {
    pub fn name(&self) -> &str {
        &self.header.name
    }

    pub fn shape(&self) -> Vec<u64> {
        self.header.dataspace.shape.clone()
    }

    pub fn datatype(&self) -> Datatype {
        self.header.datatype.clone()
    }

    pub fn is_chunked(&self) -> bool {
        matches!(self.header.storage, DataStorage::Chunked { .. })
    }

    pub fn read<T>(&self, file: &mut FileReader) -> Result<Array2<T>, Error>
    where
        T: Clone + Copy + Debug + DatatypeVerifiable + Zero,
    {
        let datatype = self.header.datatype.clone();
        let dataspace = self.header.dataspace.clone();
        log::info!("Datatype {:#?}", datatype);
        log::info!("Shape {:#?}", dataspace.shape);
        if dataspace.shape.len() != 2 {
            return Err(Error::FormatError(format!(
                "Only 2-D datasets are supported, found shape {:?}",
                dataspace.shape
            )));
        }
        match self.header.storage.clone() {
            DataStorage::Chunked {
                chunk_shape,
                index_address,
            } => self.read_chunked(
                file,
                &chunk_shape,
                index_address,
                &datatype,
                &dataspace,
                &self.header.filter_pipelines,
            ),
            DataStorage::Contiguous { address, size } => {
                if !self.header.filter_pipelines.is_empty() {
                    return Err(Error::FormatError(
                        "Contiguous storage cannot carry a filter pipeline".to_string(),
                    ));
                }
                self.read_contiguous(file, address, size, &datatype, &dataspace)
            }
        }
    }

    fn read_contiguous<T>(
        &self,
        file: &mut FileReader,
        address: u64,
        size: u64,
        datatype: &Datatype,
        dataspace: &Dataspace,
    ) -> Result<Array2<T>, Error>
    where
        T: Clone + Copy + Debug + DatatypeVerifiable + Zero,
    {
        T::verify(datatype)?;

        let rows = dataspace.shape[0] as usize;
        let cols = dataspace.shape[1] as usize;
        let expected_size = rows * cols * datatype.size as usize;
        if size as usize != expected_size {
            return Err(Error::FormatError(format!(
                "Contiguous storage of {} bytes does not match shape {:?} with item size {}",
                size, dataspace.shape, datatype.size
            )));
        }

        let mut buffer = vec![0; size as usize];
        file.input.seek(SeekFrom::Start(address))?;
        file.input.read_exact(&mut buffer)?;

        let values = T::decode(&buffer);
        log::info!(
            "Contiguous len {:?} and shape {:?}",
            values.len(),
            dataspace.shape
        );

        Ok(Array2::from_shape_vec((rows, cols), values)?)
    }

    fn read_chunked<T>(
        &self,
        file: &mut FileReader,
        chunk_shape: &[u32],
        index_address: u64,
        datatype: &Datatype,
        dataspace: &Dataspace,
        filter_pipelines: &[FilterPipeline],
    ) -> Result<Array2<T>, Error>
    where
        T: Clone + Copy + Debug + DatatypeVerifiable + Zero,
    {
        T::verify(datatype)?;

        log::info!("Data chunk shape {:#?}", chunk_shape);
        if chunk_shape.len() != 2 {
            return Err(Error::FormatError(format!(
                "Chunk shape rank {} does not match dataset rank 2",
                chunk_shape.len()
            )));
        }

        let entries = parse_chunk_index(&mut file.input, index_address, chunk_shape.len())?;
        log::info!("Chunk index {:#?}", entries);

        let rows = dataspace.shape[0] as usize;
        let cols = dataspace.shape[1] as usize;
        let chunk_rows = chunk_shape[0] as usize;
        let chunk_cols = chunk_shape[1] as usize;
        let item_size = datatype.size as usize;
        let chunk_buffer_size = chunk_rows * chunk_cols * item_size;

        for filter in filter_pipelines {
            log::info!("Found filter {:#?}", filter);
        }

        let mut array = Array2::<T>::zeros((rows, cols));
        for entry in &entries {
            file.input.seek(SeekFrom::Start(entry.chunk_address))?;
            let byte_buffer = if filter_pipelines.is_empty() {
                let mut buffer = vec![0; chunk_buffer_size];
                file.input.read_exact(&mut buffer)?;
                buffer
            } else {
                let mut buffer = vec![0; entry.chunk_size as usize];
                file.input.read_exact(&mut buffer)?;
                for filter in filter_pipelines.iter().rev() {
                    log::info!("Running filter {:#?}", filter);
                    match filter.filter_type {
                        FilterType::GzipDeflateFilter => {
                            buffer = inflate(&buffer)?;
                        }
                        _ => {
                            return Err(Error::FormatError(format!(
                                "Unsupported filter type: {:#?}",
                                filter
                            )));
                        }
                    }
                }
                buffer
            };

            if byte_buffer.len() != chunk_buffer_size {
                return Err(Error::FormatError(format!(
                    "Chunk at {:?} holds {} bytes, expected {}",
                    entry.chunk_offsets,
                    byte_buffer.len(),
                    chunk_buffer_size
                )));
            }

            let chunk_values = T::decode(&byte_buffer);
            let chunk_array = Array2::from_shape_vec((chunk_rows, chunk_cols), chunk_values)?;

            // Edge chunks are stored at full chunk size, zero-padded past
            // the dataset boundary; the overhang is discarded here.
            let row_start = entry.chunk_offsets[0] as usize;
            let col_start = entry.chunk_offsets[1] as usize;
            let row_end = (row_start + chunk_rows).min(rows);
            let col_end = (col_start + chunk_cols).min(cols);
            if row_start >= rows || col_start >= cols {
                return Err(Error::FormatError(format!(
                    "Chunk offset {:?} lies outside dataset shape {:?}",
                    entry.chunk_offsets, dataspace.shape
                )));
            }
            array
                .slice_mut(s![row_start..row_end, col_start..col_end])
                .assign(&chunk_array.slice(s![..row_end - row_start, ..col_end - col_start]));
        }

        Ok(array)
    }
}

#[cfg(feature = "deflate")]
fn inflate(buffer: &[u8]) -> Result<Vec<u8>, Error> {
    use std::io::Cursor;

    let mut reader = Cursor::new(buffer);
    let mut decoder = flate2::read::ZlibDecoder::new(&mut reader);
    let mut decompressed = vec![];
    decoder.read_to_end(&mut decompressed)?;
    log::info!("Decompressed into {}", decompressed.len());
    Ok(decompressed)
}

#[cfg(not(feature = "deflate"))]
fn inflate(_buffer: &[u8]) -> Result<Vec<u8>, Error> {
    Err(Error::UnavailableFilter(
        "deflate support was not compiled in".to_string(),
    ))
}
