use crate::error::Error;
use byteorder::{LittleEndian, ReadBytesExt};
use std::io::{Read, Seek, SeekFrom};

/// One entry in a dataset's chunk index: where the chunk sits in the element
/// grid, how many bytes are stored for it, and where those bytes start.
#[derive(Clone, Debug)]
pub struct ChunkEntry {
    pub chunk_offsets: Vec<u64>,
    pub chunk_size: u64,
    pub chunk_address: u64,
}

pub fn parse_chunk_index(
    input: &mut (impl Read + Seek + ?Sized),
    index_address: u64,
    dimensions: usize,
) -> Result<Vec<ChunkEntry>, Error> {
    input.seek(SeekFrom::Start(index_address))?;
    let chunk_count = input.read_u32::<LittleEndian>()? as usize;
    let mut entries = Vec::with_capacity(chunk_count);
    for _ in 0..chunk_count {
        let mut chunk_offsets = Vec::with_capacity(dimensions);
        for _ in 0..dimensions {
            chunk_offsets.push(input.read_u64::<LittleEndian>()?);
        }
        entries.push(ChunkEntry {
            chunk_offsets,
            chunk_size: input.read_u64::<LittleEndian>()?,
            chunk_address: input.read_u64::<LittleEndian>()?,
        });
    }

    Ok(entries)
}
