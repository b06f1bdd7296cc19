use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("No tokio runtime is available to drive timers")]
    NoRuntime,
    #[error("Edit range {start}..{end} is out of bounds for text of length {len}")]
    RangeOutOfBounds { start: usize, end: usize, len: usize },
    #[error("Edit range {start}..{end} does not fall on a char boundary")]
    NotCharBoundary { start: usize, end: usize },
}

pub type Result<T> = std::result::Result<T, Error>;
