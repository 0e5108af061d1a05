use crate::error::Error;
use byteorder::{LittleEndian, ReadBytesExt};
use num_enum::TryFromPrimitive;
use std::convert::TryFrom;
use std::io::Read;

#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, TryFromPrimitive)]
pub enum DatatypeEncoding {
    FixedPoint = 0,
    FloatingPoint = 1,
}

#[derive(Clone, Debug)]
pub struct Datatype {
    pub class_and_version: u8,
    pub bit_field: u8,
    pub size: u32,
    pub encoding: DatatypeEncoding,
}

impl Datatype {
    /// Bit 0 of the bit field marks a signed fixed-point type.
    pub fn signed(&self) -> bool {
        self.bit_field & 0x01 != 0
    }
}

pub fn parse_datatype_message(input: &mut (impl Read + ?Sized)) -> Result<Datatype, Error> {
    let class_and_version = input.read_u8()?;
    let datatype = Datatype {
        class_and_version,
        bit_field: input.read_u8()?,
        size: input.read_u32::<LittleEndian>()?,
        encoding: DatatypeEncoding::try_from(class_and_version & 0x0F)?,
    };

    Ok(datatype)
}
