use thiserror::Error;

#[derive(Debug, Error)]
pub enum HwError {
    #[error("frame encoding: {0}")]
    Encoding(String),
    #[error("frame decoding: {0}")]
    Decoding(String),
    #[error("`{program}` failed: {status}")]
    CommandFailed { program: String, status: String },
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, HwError>;
