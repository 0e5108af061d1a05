use byteorder::{LittleEndian, ReadBytesExt};
use std::io::Read;

use crate::error::Error;
use crate::format::{FORMAT_VERSION, SIGNATURE};

#[derive(Clone, Debug)]
pub struct SuperBlock {
    pub format_signature: [u8; 8],
    pub format_version: u8,
    pub dataset_count: u32,
    pub end_of_file_address: u64,
}

pub fn parse_superblock(input: &mut (impl Read + ?Sized)) -> Result<SuperBlock, Error> {
    let mut format_signature = [0; 8];
    input.read_exact(&mut format_signature)?;
    if format_signature != SIGNATURE {
        return Err(Error::FormatError(format!(
            "Wrong header, found {:#?}",
            format_signature
        )));
    }

    let format_version = input.read_u8()?;
    if format_version != FORMAT_VERSION {
        return Err(Error::FormatError(format!(
            "Only format version 0 is supported, but found {}",
            format_version
        )));
    }

    let mut reserved = [0; 3];
    input.read_exact(&mut reserved)?;

    Ok(SuperBlock {
        format_signature,
        format_version,
        dataset_count: input.read_u32::<LittleEndian>()?,
        end_of_file_address: input.read_u64::<LittleEndian>()?,
    })
}
