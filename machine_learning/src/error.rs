use std::{
    error::Error,
    fmt::{self, Display},
};

/// The result type used in the entire machine learning module.
pub type Result<T> = std::result::Result<T, MlErr>;

/// The machine learning module's error type.
#[derive(Debug, Clone, PartialEq)]
pub enum MlErr {
    SizeMismatch {
        what: &'static str,
        got: usize,
        expected: usize,
    },
    InvalidInput(&'static str),
    InvalidConfig(String),
    NotInitialized {
        what: &'static str,
    },
    TokenOutOfRange {
        token: usize,
        vocab_size: usize,
    },
    Distribution(String),
}

impl Display for MlErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MlErr::SizeMismatch {
                what,
                got,
                expected,
            } => format!("There's a size mismatch in {what}, got {got} and expected {expected}"),
            MlErr::InvalidInput(msg) => format!("Invalid input: {msg}"),
            MlErr::InvalidConfig(msg) => format!("Invalid configuration: {msg}"),
            MlErr::NotInitialized { what } => {
                format!("Tried to use the {what} before it was initialized")
            }
            MlErr::TokenOutOfRange { token, vocab_size } => {
                format!("Token {token} is out of range for a vocabulary of size {vocab_size}")
            }
            MlErr::Distribution(msg) => format!("Failed to build a sampling distribution: {msg}"),
        };

        write!(f, "{s}")
    }
}

impl Error for MlErr {}

impl From<rand_distr::uniform::Error> for MlErr {
    fn from(value: rand_distr::uniform::Error) -> Self {
        Self::Distribution(value.to_string())
    }
}

impl From<rand_distr::NormalError> for MlErr {
    fn from(value: rand_distr::NormalError) -> Self {
        Self::Distribution(value.to_string())
    }
}

impl From<ndarray::ShapeError> for MlErr {
    fn from(value: ndarray::ShapeError) -> Self {
        Self::InvalidConfig(value.to_string())
    }
}
