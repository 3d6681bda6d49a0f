use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("transport error talking to the control plane: {0}")]
    Transport(#[from] convoy_http::HttpError),

    #[error("migration cancelled by user")]
    Cancelled,
}
