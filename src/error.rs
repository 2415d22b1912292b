use std::path::PathBuf;
use thiserror::Error;

/// Top-level failure of one invocation. Nothing is recovered locally;
/// `main` prints this once and exits with status 1.
#[derive(Error, Debug)]
pub enum Error {
    /// Missing credential or unusable configuration.
    #[error("config error: {0}")]
    Config(String),

    /// A local file could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Writing the relayed response to the output sink failed.
    #[error("failed to write output: {0}")]
    Output(#[from] std::io::Error),

    #[error(transparent)]
    Provider(#[from] ProviderError),
}

/// Anything that goes wrong on the remote side of a call.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("provider returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("prompt blocked: {0}")]
    Blocked(String),

    #[error("invalid response: {0}")]
    Decode(String),

    #[error("stream error: {0}")]
    Stream(String),
}

impl Error {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}
