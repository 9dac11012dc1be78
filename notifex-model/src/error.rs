use thiserror::Error;

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Invalid event payload: {0}")]
    InvalidEvent(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

pub type Result<T> = std::result::Result<T, ModelError>;
