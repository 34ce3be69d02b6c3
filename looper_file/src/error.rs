pub type Result<T> = std::result::Result<T, FileError>;

#[derive(Debug, thiserror::Error)]
pub enum FileError {
    #[error("invalid WAV file: {0}")]
    InvalidWavFile(String),

    #[error("WAV sample rate {actual} does not match the required {expected}")]
    SampleRateMismatch { expected: u32, actual: u32 },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("could not create session directory {0}")]
    SessionDirCreate(String),
}
