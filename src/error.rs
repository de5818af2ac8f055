use crate::engine::unique_id::UniqueId;
use std::io;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum Error {
    #[error("malformed unique id `{input}`: {reason}")]
    MalformedId { input: String, reason: String },

    #[error("failed to build discovery request: {0}")]
    Request(String),

    #[error("engine `{0}` is not included by the discovery request")]
    EngineExcluded(String),

    #[error("test source `{0}` is not declared in the manifest")]
    UnknownSource(String),

    #[error("scope `{0}` does not match any test of the selected source")]
    UnknownScope(UniqueId),

    #[error("invalid manifest: {0}")]
    Manifest(String),

    #[error("failed to load manifest: {0}")]
    Config(#[from] config::ConfigError),

    #[error("no start time recorded for test `{0}`")]
    MissingStart(UniqueId),

    #[error("test `{0}` did not succeed but carries no failure")]
    MissingFailure(UniqueId),

    #[error("failed to write protocol message: {0}")]
    Sink(#[from] io::Error),

    #[error("failed to start worker pool: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),
}

impl Error {
    pub(crate) fn malformed<I, R>(input: I, reason: R) -> Self
    where
        I: Into<String>,
        R: Into<String>,
    {
        Error::MalformedId {
            input: input.into(),
            reason: reason.into(),
        }
    }
}
