use ndarray::ShapeError;
use thiserror::Error;

/// Errors raised while loading a decoder or running it.
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("Invalid decode configuration: {0}")]
    InvalidConfig(String),
    #[error("Invalid model: {0}")]
    InvalidModel(String),
    #[error("Invalid decoder input: {0}")]
    InvalidInput(String),
    #[error("ndarray shape error: {0}")]
    Shape(#[from] ShapeError),
    #[error("Weight shape mismatch for {name}: expected {expected:?}, got {actual:?}")]
    WeightShape {
        name: String,
        expected: Vec<usize>,
        actual: Vec<usize>,
    },
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Vocabulary error: {0}")]
    Vocab(String),
}

impl DecodeError {
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::InvalidConfig(_) => {
                "The decoding settings are invalid. Beam size and n-best must both be at least 1."
            }
            Self::InvalidModel(_) => {
                "The model weights declare invalid dimensions or the wrong number of layers."
            }
            Self::InvalidInput(_) => {
                "The encoder output could not be decoded. Check that it is non-empty and matches the model."
            }
            Self::Shape(_) | Self::WeightShape { .. } => {
                "The model weights do not match the declared model dimensions."
            }
            Self::Io(_) => "Could not read the model or input files. Check the paths and permissions.",
            Self::Json(_) => "A model or input file is not valid JSON.",
            Self::Vocab(_) => {
                "The dictionary is missing entries. It must list <sos> and <eos> symbols."
            }
        }
    }
}
