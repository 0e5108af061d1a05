use crate::error::Error;
use crate::padding::padded_size;
use crate::read::{
    data_storage::{self, DataStorage},
    dataset::Dataset,
    dataspace::{self, Dataspace},
    datatype::{self, Datatype},
    filter_pipeline::{self, FilterPipeline},
    io::ReadSeek,
    superblock::{self, SuperBlock},
};
use byteorder::{LittleEndian, ReadBytesExt};
use std::io::Read;
use std::path::Path;

/// Everything the container header records about one dataset.
#[derive(Clone, Debug)]
pub struct DatasetHeader {
    pub name: String,
    pub datatype: Datatype,
    pub dataspace: Dataspace,
    pub filter_pipelines: Vec<FilterPipeline>,
    pub storage: DataStorage,
}

pub struct FileReader {
    pub superblock: SuperBlock,
    pub headers: Vec<DatasetHeader>,
    pub input: Box<dyn ReadSeek>,
}

fn parse_dataset_header(input: &mut (impl Read + ?Sized)) -> Result<DatasetHeader, Error> {
    let name_length = input.read_u16::<LittleEndian>()? as usize;
    let name_length_padded = padded_size(name_length + 1);
    let mut name_bytes_padded = vec![0; name_length_padded];
    input.read_exact(&mut name_bytes_padded)?;
    if name_bytes_padded[name_length] != 0 {
        return Err(Error::FormatError(format!(
            "Dataset name of length {} is not NUL-terminated",
            name_length
        )));
    }
    let name = String::from_utf8(name_bytes_padded[..name_length].to_vec())?;

    Ok(DatasetHeader {
        name,
        datatype: datatype::parse_datatype_message(input)?,
        dataspace: dataspace::parse_dataspace_message(input)?,
        filter_pipelines: filter_pipeline::parse_filter_pipeline_message(input)?,
        storage: data_storage::parse_data_storage_message(input)?,
    })
}

impl FileReader {
    /// Opens a container file read-only. A missing file is reported as
    /// `NotFound` rather than a bare I/O failure.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let file = match std::fs::File::open(path) {
            Ok(file) => file,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Err(Error::NotFound(format!(
                    "No container at `{}`",
                    path.display()
                )));
            }
            Err(err) => return Err(err.into()),
        };
        Self::read(Box::new(std::io::BufReader::new(file)))
    }

    pub fn read(mut input: Box<dyn ReadSeek>) -> Result<Self, Error> {
        let superblock = superblock::parse_superblock(&mut input)?;
        log::info!("{:#?}", superblock);
        let mut headers = Vec::with_capacity(superblock.dataset_count as usize);
        for _ in 0..superblock.dataset_count {
            let header = parse_dataset_header(&mut input)?;
            log::info!("{:#?}", header);
            headers.push(header);
        }
        Ok(Self {
            superblock,
            headers,
            input,
        })
    }

    pub fn dataset_names(&self) -> Vec<String> {
        self.headers.iter().map(|header| header.name.clone()).collect()
    }

    pub fn dataset(&self, name: &str) -> Result<Dataset, Error> {
        match self.headers.iter().find(|header| header.name == name) {
            Some(header) => Ok(Dataset {
                header: header.clone(),
            }),
            None => Err(Error::NotFound(format!("Unknown dataset name '{name}'"))),
        }
    }
}
