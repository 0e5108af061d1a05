use crate::error::Error;
use crate::format::DATASPACE_VERSION;
use byteorder::{LittleEndian, ReadBytesExt};
use std::io::Read;

#[derive(Clone, Debug)]
pub struct Dataspace {
    pub shape: Vec<u64>,
}

pub fn parse_dataspace_message(input: &mut (impl Read + ?Sized)) -> Result<Dataspace, Error> {
    let version = input.read_u8()?;
    if version != DATASPACE_VERSION {
        return Err(Error::FormatError(format!(
            "Unsupported dataspace version: {}",
            version
        )));
    }
    let dimensionality = input.read_u8()?;
    let _reserved = input.read_u16::<LittleEndian>()?;
    let mut shape = Vec::new();
    for _ in 0..dimensionality {
        shape.push(input.read_u64::<LittleEndian>()?);
    }
    Ok(Dataspace { shape })
}
