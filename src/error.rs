//! Failures the bridge reports back over the method channel.
//!
//! Every variant maps to the short machine-readable code the host side
//! switches on; the `Display` text becomes the human-readable message.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BridgeError {
    /// `generateText` arrived before a model was initialized.
    #[error("Model not initialized")]
    ModelNotLoaded,

    #[error("Failed to initialize model: {0}")]
    Init(String),

    #[error("Failed to generate text: {0}")]
    Generation(String),

    #[error("Failed to dispose model: {0}")]
    Dispose(String),
}

impl BridgeError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::ModelNotLoaded => "MODEL_NOT_LOADED",
            Self::Init(_) => "INIT_ERROR",
            Self::Generation(_) => "GENERATION_ERROR",
            Self::Dispose(_) => "DISPOSE_ERROR",
        }
    }
}

/// Renders an error chain on one line, outermost cause first.
pub(crate) fn describe(err: &anyhow::Error) -> String {
    format!("{err:#}")
}
