use std::io;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug)]
pub enum Error {
    IoError(io::Error),
    InvalidHeader,
    ChecksumMismatch,
    Decode(&'static str, io::Error),
    InvalidConfig(String),
    RelationExists(String),
    RelationNotFound(String),
    LockError(io::Error),
    // A file could not be grown by one page
    Allocation(&'static str, io::Error),
    // The bit-slices have no room for another data page
    NoSpace(String),
    InvalidState(String),
    InvalidQuery(String),
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::IoError(err)
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::IoError(err) => write!(f, "I/O error: {}", err),
            Error::InvalidHeader => write!(f, "Invalid relation header"),
            Error::ChecksumMismatch => write!(f, "Checksum mismatch"),
            Error::Decode(field, err) => write!(f, "Failed to decode {}: {}", field, err),
            Error::InvalidConfig(msg) => write!(f, "Invalid configuration: {}", msg),
            Error::RelationExists(name) => write!(f, "Relation {} already exists", name),
            Error::RelationNotFound(name) => write!(f, "Relation {} does not exist", name),
            Error::LockError(err) => write!(f, "Lock error: {}", err),
            Error::Allocation(file, err) => {
                write!(f, "Failed to allocate page in {} file: {}", file, err)
            }
            Error::NoSpace(msg) => write!(f, "No space: {}", msg),
            Error::InvalidState(msg) => write!(f, "Invalid state: {}", msg),
            Error::InvalidQuery(msg) => write!(f, "Invalid query: {}", msg),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::IoError(err)
            | Error::Decode(_, err)
            | Error::LockError(err)
            | Error::Allocation(_, err) => Some(err),
            _ => None,
        }
    }
}
