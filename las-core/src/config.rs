use serde::{Deserialize, Serialize};

use crate::error::DecodeError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeConfig {
    pub beam_size: usize,
    pub nbest: usize,
    /// Upper bound on decode steps; 0 caps decoding at the number of encoder frames.
    pub decode_max_len: usize,
}

impl Default for DecodeConfig {
    fn default() -> Self {
        Self {
            beam_size: 1,
            nbest: 1,
            decode_max_len: 0,
        }
    }
}

impl DecodeConfig {
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env_overrides("LAS_");
        config
    }

    fn apply_env_overrides(&mut self, prefix: &str) {
        let parse_env = |suffix: &str| {
            std::env::var(format!("{prefix}{suffix}"))
                .ok()
                .and_then(|s| s.trim().parse::<usize>().ok())
        };

        if let Some(v) = parse_env("BEAM_SIZE") {
            self.beam_size = v;
        }
        if let Some(v) = parse_env("NBEST") {
            self.nbest = v;
        }
        if let Some(v) = parse_env("DECODE_MAX_LEN") {
            self.decode_max_len = v;
        }
    }

    pub fn validate(&self) -> Result<(), DecodeError> {
        if self.beam_size == 0 {
            return Err(DecodeError::InvalidConfig(
                "beam_size must be at least 1".to_string(),
            ));
        }
        if self.nbest == 0 {
            return Err(DecodeError::InvalidConfig(
                "nbest must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Number of decode steps for an utterance with `frames` encoder rows.
    pub fn max_steps(&self, frames: usize) -> usize {
        if self.decode_max_len == 0 {
            frames
        } else {
            self.decode_max_len
        }
    }
}

/// Layer sizes of the decoder network. The encoder width must equal `hidden_size`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelDims {
    pub vocab_size: usize,
    pub embedding_dim: usize,
    pub hidden_size: usize,
    pub num_layers: usize,
}

impl ModelDims {
    pub fn encoder_dim(&self) -> usize {
        self.hidden_size
    }

    pub fn validate(&self) -> Result<(), DecodeError> {
        if self.vocab_size == 0
            || self.embedding_dim == 0
            || self.hidden_size == 0
            || self.num_layers == 0
        {
            return Err(DecodeError::InvalidModel(format!(
                "model dimensions must be non-zero: {self:?}"
            )));
        }
        Ok(())
    }
}
