pub type GlitchResult<T> = Result<T, GlitchError>;

#[derive(thiserror::Error, Debug)]
pub enum GlitchError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("frame error: {0}")]
    Frame(String),

    #[error("serialization error: {0}")]
    Serde(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl GlitchError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn frame(msg: impl Into<String>) -> Self {
        Self::Frame(msg.into())
    }

    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}
