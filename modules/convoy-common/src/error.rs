use thiserror::Error;

#[derive(Error, Debug)]
pub enum CommonError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("malformed resource: {0}")]
    MalformedResource(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}
