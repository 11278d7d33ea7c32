/// Why a submission attempt ended without a result. Every variant renders as
/// plain status text.
#[derive(thiserror::Error, Debug)]
pub enum UploadError {
    /// Rejected locally, before any request was made
    #[error("{0}")]
    Validation(&'static str),
    /// The server answered with a non-success status
    #[error("{0}")]
    Server(String),
    /// The request never produced a usable answer
    #[error("{0}")]
    Transport(String),
}

impl From<reqwest::Error> for UploadError {
    fn from(err: reqwest::Error) -> Self {
        UploadError::Transport(err.to_string())
    }
}

impl From<std::io::Error> for UploadError {
    fn from(err: std::io::Error) -> Self {
        UploadError::Transport(err.to_string())
    }
}
