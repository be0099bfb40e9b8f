//! Errors of the outer, fallible operations: scene loading and building

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("scene file I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("scene JSON is invalid: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unknown effect kind '{0}'")]
    UnknownEffect(String),
    #[error("invalid matrix size {width}x{height}")]
    InvalidMatrixSize { width: u16, height: u16 },
    #[error("effect manager is full, '{0}' was not added")]
    ManagerFull(String),
    #[error("{effect}: invalid value for property '{property}'")]
    InvalidProperty { effect: String, property: String },
}

pub type Result<T> = std::result::Result<T, Error>;
