use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    // Value errors
    #[error("Duration must be greater than zero")]
    InvalidDuration,

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;
