use num_enum::{TryFromPrimitive, TryFromPrimitiveError};

#[derive(Debug)]
pub enum Error {
    IoFailure(std::io::Error),
    ShapeError(ndarray::ShapeError),
    InvalidChunkShape(String),
    UnavailableFilter(String),
    UnsupportedPolicy(String),
    NotFound(String),
    FormatError(String),
}

impl std::fmt::Display for Error {
    fn fmt(&self, fmt: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Error::InvalidChunkShape(message) => write!(fmt, "invalid chunk shape: {message}"),
            Error::UnavailableFilter(message) => write!(fmt, "filter unavailable: {message}"),
            Error::UnsupportedPolicy(message) => write!(fmt, "unsupported locking policy: {message}"),
            Error::NotFound(message) => write!(fmt, "not found: {message}"),
            Error::FormatError(message) => write!(fmt, "gridcask::Error({:?})", message),
            x => std::fmt::Debug::fmt(&x, fmt),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::IoFailure(err) => Some(err),
            Error::ShapeError(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Error {
        Error::IoFailure(err)
    }
}

impl From<ndarray::ShapeError> for Error {
    fn from(err: ndarray::ShapeError) -> Error {
        Error::ShapeError(err)
    }
}

impl<T: TryFromPrimitive> From<TryFromPrimitiveError<T>> for Error {
    fn from(error: TryFromPrimitiveError<T>) -> Self {
        Error::FormatError(format!(
            "Unexpected data found for {:?}: {:?}",
            stringify!(T),
            error
        ))
    }
}

impl From<std::string::FromUtf8Error> for Error {
    fn from(_error: std::string::FromUtf8Error) -> Self {
        Error::FormatError("Could not convert string from UTF8 bytes".to_string())
    }
}
