use thiserror::Error;

use cp_core::CoreError;

#[derive(Debug, Error)]
pub enum DataError {
    /// File missing, malformed, or schema violation. The message always
    /// names the offending file.
    #[error("loading error in file '{file}': {message}")]
    Load { file: String, message: String },

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl DataError {
    pub fn load(file: impl Into<String>, message: impl ToString) -> DataError {
        DataError::Load { file: file.into(), message: message.to_string() }
    }
}

pub type DataResult<T> = Result<T, DataError>;
