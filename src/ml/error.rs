use thiserror::Error;

/// Errors raised while configuring a model.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ModelError {
    /// The architecture name is neither "cnn" nor "resnet"
    #[error("arch must be 'cnn' or 'resnet', got '{0}'")]
    UnknownArch(String),
}
