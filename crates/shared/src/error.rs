use thiserror::Error;

/// A parameter draft that cannot be submitted with a start command.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParamError {
    #[error("parameter '{name}' expects an integer, got '{input}'")]
    NotAnInteger { name: String, input: String },
    #[error("parameter '{name}' expects a number, got '{input}'")]
    NotANumber { name: String, input: String },
    #[error("parameter '{name}' must be >= {min}, got {value}")]
    BelowMinimum { name: String, min: f64, value: f64 },
    #[error("parameter '{name}' must be <= {max}, got {value}")]
    AboveMaximum { name: String, max: f64, value: f64 },
    #[error("unknown parameter '{0}'")]
    Unknown(String),
}
