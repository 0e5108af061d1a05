use crate::error::Error;
use crate::format;
use crate::read::datatype::DatatypeEncoding;
use byteorder::{ByteOrder, LittleEndian};
use ndarray::ArrayView2;

/// Element types that can be stored in a dataset.
pub trait Element: Copy {
    const ENCODING: DatatypeEncoding;
    const SIZE: u32;
    const SIGNED: bool;

    fn encode(values: &[Self], buffer: &mut [u8]);
}

macro_rules! add_element_type {
    ($rust_type:ty, $encoding:expr, $size:expr, $signed:expr, $write_into:ident) => {
        impl Element for $rust_type {
            const ENCODING: DatatypeEncoding = $encoding;
            const SIZE: u32 = $size;
            const SIGNED: bool = $signed;

            fn encode(values: &[Self], buffer: &mut [u8]) {
                LittleEndian::$write_into(values, buffer);
            }
        }
    };
}

add_element_type!(i32, DatatypeEncoding::FixedPoint, 4, true, write_i32_into);
add_element_type!(i64, DatatypeEncoding::FixedPoint, 8, true, write_i64_into);

/// Pending dataset inside a `FileWriter`: a name, a row-major little-endian
/// byte buffer, and the optional chunking/compression configuration.
pub struct DatasetBuilder {
    pub(crate) name: String,
    pub(crate) shape: [usize; 2],
    pub(crate) item_size: usize,
    pub(crate) encoding: DatatypeEncoding,
    pub(crate) signed: bool,
    pub(crate) data: Vec<u8>,
    pub(crate) chunk_shape: Option<[u32; 2]>,
    pub(crate) deflate_level: Option<u32>,
}

impl DatasetBuilder {
    pub(crate) fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            shape: [0, 0],
            item_size: 0,
            encoding: DatatypeEncoding::FixedPoint,
            signed: true,
            data: vec![],
            chunk_shape: None,
            deflate_level: None,
        }
    }

    pub fn with_data<T: Element>(&mut self, data: ArrayView2<'_, T>) -> &mut Self {
        let (rows, cols) = data.dim();
        self.shape = [rows, cols];
        self.item_size = T::SIZE as usize;
        self.encoding = T::ENCODING;
        self.signed = T::SIGNED;
        let values: Vec<T> = data.iter().copied().collect();
        let mut buffer = vec![0; values.len() * self.item_size];
        T::encode(&values, &mut buffer);
        self.data = buffer;
        self
    }

    pub fn with_chunks(&mut self, chunk_shape: [u32; 2]) -> &mut Self {
        self.chunk_shape = Some(chunk_shape);
        self
    }

    pub fn with_deflate(&mut self, level: u32) -> &mut Self {
        self.deflate_level = Some(level);
        self
    }

    /// Fail-fast validation, run before any byte reaches disk.
    pub(crate) fn validate(&self) -> Result<(), Error> {
        if self.shape[0] == 0 || self.shape[1] == 0 {
            return Err(Error::FormatError(format!(
                "Dataset `{}` must have two positive dimensions, found {:?}",
                self.name, self.shape
            )));
        }
        if let Some(level) = self.deflate_level {
            if level > 9 {
                return Err(Error::FormatError(format!(
                    "Dataset `{}`: deflate level {} is outside 0..=9",
                    self.name, level
                )));
            }
            if self.chunk_shape.is_none() {
                return Err(Error::InvalidChunkShape(format!(
                    "Dataset `{}`: compression requires chunked storage",
                    self.name
                )));
            }
            if !format::deflate_available() {
                return Err(Error::UnavailableFilter(
                    "deflate support was not compiled in".to_string(),
                ));
            }
        }
        if let Some(chunk_shape) = self.chunk_shape {
            for axis in 0..2 {
                let extent = chunk_shape[axis] as usize;
                if extent == 0 || extent > self.shape[axis] {
                    return Err(Error::InvalidChunkShape(format!(
                        "Dataset `{}`: chunk extent {} does not fit axis {} of length {}",
                        self.name, extent, axis, self.shape[axis]
                    )));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn builder_with_data() -> DatasetBuilder {
        let mut builder = DatasetBuilder::new("data");
        builder.with_data(array![[1i32, 2], [3, 4]].view());
        builder
    }

    #[test]
    fn encodes_row_major_little_endian() {
        let builder = builder_with_data();
        assert_eq!(builder.shape, [2, 2]);
        assert_eq!(
            builder.data,
            vec![1, 0, 0, 0, 2, 0, 0, 0, 3, 0, 0, 0, 4, 0, 0, 0]
        );
    }

    #[test]
    fn deflate_without_chunks_is_rejected() {
        let mut builder = builder_with_data();
        builder.with_deflate(6);
        assert!(matches!(
            builder.validate(),
            Err(Error::InvalidChunkShape(_))
        ));
    }

    #[test]
    fn oversized_chunk_extent_is_rejected() {
        let mut builder = builder_with_data();
        builder.with_chunks([3, 1]);
        assert!(matches!(
            builder.validate(),
            Err(Error::InvalidChunkShape(_))
        ));
    }

    #[test]
    fn zero_chunk_extent_is_rejected() {
        let mut builder = builder_with_data();
        builder.with_chunks([0, 1]);
        assert!(matches!(
            builder.validate(),
            Err(Error::InvalidChunkShape(_))
        ));
    }

    #[test]
    fn deflate_level_out_of_range_is_rejected() {
        let mut builder = builder_with_data();
        builder.with_chunks([1, 1]);
        builder.with_deflate(10);
        assert!(matches!(builder.validate(), Err(Error::FormatError(_))));
    }

    #[test]
    fn chunked_uncompressed_is_accepted() {
        let mut builder = builder_with_data();
        builder.with_chunks([2, 1]);
        assert!(builder.validate().is_ok());
    }
}
