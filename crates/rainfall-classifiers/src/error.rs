use thiserror::Error;

pub type Result<T> = std::result::Result<T, PipelineError>;

/// Broad category of a pipeline failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Inputs do not agree with the configuration or with each other.
    Configuration,
    /// An operation was called before the component was fitted.
    Sequencing,
}

/// Errors raised by the feature extractor, the classifiers and the data helpers.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PipelineError {
    #[error("Variable '{0}' is not present in the supplied fields")]
    MissingVariable(String),

    #[error("{what}: expected {expected} rows, got {got}")]
    LengthMismatch {
        what: &'static str,
        expected: usize,
        got: usize,
    },

    #[error("Grid shape mismatch for '{variable}': expected {expected:?}, got {got:?}")]
    GridShapeMismatch {
        variable: String,
        expected: (usize, usize),
        got: (usize, usize),
    },

    #[error("Dimension mismatch: expected {expected} columns, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("Sample index {index} out of bounds for {len} samples")]
    IndexOutOfBounds { index: usize, len: usize },

    #[error("Empty input: {0}")]
    EmptyInput(&'static str),

    #[error("Label at index {index} must be 0 or 1, got {value}")]
    InvalidLabel { index: usize, value: u8 },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("{0} has not been fitted yet")]
    NotFitted(&'static str),
}

impl PipelineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PipelineError::NotFitted(_) => ErrorKind::Sequencing,
            _ => ErrorKind::Configuration,
        }
    }
}
