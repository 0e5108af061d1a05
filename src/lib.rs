pub mod access;
pub mod error;
pub mod format;
pub mod padding;
pub mod read;
pub mod write;

pub use access::{open_with_policy, AccessConfig, Container};
pub use error::Error;
pub use read::file::FileReader;
pub use read::io::ReadSeek;
pub use write::create_and_write;
pub use write::file::FileWriter;
