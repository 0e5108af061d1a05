use std::io::{Read, Seek};

pub trait ReadSeek: Read + Seek {}

impl<T: Read + Seek> ReadSeek for T {}
