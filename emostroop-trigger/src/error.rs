use thiserror::Error;

#[derive(Error, Debug)]
pub enum TriggerError {
    #[error("trigger channel is not open")]
    Unavailable,

    #[error("trigger port not supported on this platform")]
    Unsupported,

    #[error("failed to write trigger {code}: {source}")]
    Write {
        code: u8,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
