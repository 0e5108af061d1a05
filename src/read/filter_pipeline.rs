use crate::error::Error;
use byteorder::{LittleEndian, ReadBytesExt};
use num_enum::TryFromPrimitive;
use std::convert::TryFrom;
use std::io::Read;

#[repr(u16)]
#[derive(Clone, Debug, Eq, PartialEq, TryFromPrimitive)]
pub enum FilterType {
    ReservedFilter = 0,
    GzipDeflateFilter = 1,
}

#[derive(Clone, Debug)]
pub struct FilterPipeline {
    pub filter_type: FilterType,
    pub level: u32,
}

pub fn parse_filter_pipeline_message(
    input: &mut (impl Read + ?Sized),
) -> Result<Vec<FilterPipeline>, Error> {
    let filter_count = input.read_u8()? as usize;
    let mut filters = vec![];
    for _ in 0..filter_count {
        let filter_id = input.read_u16::<LittleEndian>()?;
        let filter_type = FilterType::try_from(filter_id)?;
        let level = input.read_u32::<LittleEndian>()?;
        filters.push(FilterPipeline { filter_type, level });
    }

    Ok(filters)
}
