//! Constants shared by the write and read sides of the container format.

/// Leading signature of every container file, PNG-style:
/// `\x89GCK\r\n\x1a\n`.
pub const SIGNATURE: [u8; 8] = [137, 71, 67, 75, 13, 10, 26, 10];

/// Current container format version.
pub const FORMAT_VERSION: u8 = 0;

/// Versions of the individual header records.
pub const DATASPACE_VERSION: u8 = 1;

/// Identifier of the deflate (zlib) filter in a filter pipeline record.
pub const FILTER_ID_DEFLATE: u16 = 1;

/// Returns whether the deflate compression backend was compiled in.
///
/// Filter availability is a queryable capability rather than a hard
/// assumption; callers that want compression should check it first.
pub fn deflate_available() -> bool {
    cfg!(feature = "deflate")
}
