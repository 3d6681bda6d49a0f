use thiserror::Error;

/// Truncate a response body to the first 200 bytes for error messages —
/// enough to diagnose a 4xx/5xx without dumping an entire HTML error page.
pub(crate) fn truncate_body(body: &str) -> String {
    if body.len() <= 200 {
        body.to_string()
    } else {
        let mut end = 200;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &body[..end])
    }
}

#[derive(Error, Debug)]
pub enum HttpError {
    #[error("request to {path} failed with status {status}: {body}")]
    Status {
        path: String,
        status: u16,
        body: String,
    },

    #[error("network error: {0}")]
    Network(String),

    #[error("failed to parse JSON response: {0}")]
    Parse(String),

    #[error("pagination 'next' URL points to a different host than the connection: {0}")]
    CrossHostPagination(String),

    #[error("too many redirects following {0}")]
    TooManyRedirects(String),
}

impl From<reqwest::Error> for HttpError {
    fn from(err: reqwest::Error) -> Self {
        HttpError::Network(err.to_string())
    }
}

impl From<url::ParseError> for HttpError {
    fn from(err: url::ParseError) -> Self {
        HttpError::Network(format!("invalid URL: {err}"))
    }
}
