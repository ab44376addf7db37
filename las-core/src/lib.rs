pub mod config;
pub mod decoder;
pub mod error;
pub mod model;
pub mod training;
pub mod vocab;

pub use config::{DecodeConfig, ModelDims};
pub use decoder::{DecoderState, Hypothesis, LayerState, StepModel, StepOutput};
pub use error::DecodeError;
pub use model::{DecoderWeights, LasDecoder};
pub use vocab::{Transcript, Vocabulary};

/// Target padding id; positions carrying it are excluded from the loss.
pub const IGNORE_ID: i32 = -1;
