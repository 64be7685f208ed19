use thiserror::Error;

#[derive(Error, Debug)]
pub enum FootprintError {
    #[error("Data not loaded: {0}")]
    NotLoaded(String),

    #[error("Missing column '{column}' in {table} table")]
    MissingColumn { table: &'static str, column: String },

    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("InvalidData: {0}")]
    InvalidData(String),
}

pub type Result<T> = std::result::Result<T, FootprintError>;

#[cfg(feature = "python")]
impl From<FootprintError> for pyo3::PyErr {
    fn from(err: FootprintError) -> pyo3::PyErr {
        pyo3::exceptions::PyRuntimeError::new_err(err.to_string())
    }
}
