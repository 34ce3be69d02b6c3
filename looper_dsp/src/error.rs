pub type Result<T> = std::result::Result<T, DspError>;

#[derive(Debug, PartialEq, thiserror::Error)]
pub enum DspError {
    #[error("click sample (`{0}`) could not be loaded for the metronome")]
    ClickLoadFailed(String),

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("no committed takes to aggregate")]
    NoTakes,
}
