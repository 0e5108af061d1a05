pub mod chunk_index;
pub mod data_storage;
pub mod dataset;
pub mod dataspace;
pub mod datatype;
pub mod filter_pipeline;
pub mod io;
pub mod superblock;

pub mod file;
