use std::fs;
use std::path::Path;

use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

use super::layers::{Embedding, Linear, LstmCell};
use crate::config::ModelDims;
use crate::error::DecodeError;

/// Serialized parameters of the decoder network.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecoderWeights {
    pub dims: ModelDims,
    pub embedding: Embedding,
    /// Bottom layer first. Layer 0 reads `[embedding; context]`, the rest read the layer below.
    pub rnn: Vec<LstmCell>,
    pub mlp_hidden: Linear,
    pub mlp_out: Linear,
}

impl DecoderWeights {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, DecodeError> {
        let content = fs::read_to_string(path.as_ref())?;
        let weights: Self = serde_json::from_str(&content)?;
        weights.validate()?;
        Ok(weights)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), DecodeError> {
        fs::write(path, serde_json::to_string(self)?)?;
        Ok(())
    }

    /// Fills every parameter from `f(name, flat_index)`, useful for fixtures.
    pub fn from_fn<F>(dims: ModelDims, mut f: F) -> Self
    where
        F: FnMut(&str, usize) -> f32,
    {
        let mut matrix = |name: &str, rows: usize, cols: usize| {
            Array2::from_shape_fn((rows, cols), |(r, c)| f(name, r * cols + c))
        };
        let embedding = Embedding::new(matrix("embedding", dims.vocab_size, dims.embedding_dim));
        let h = dims.hidden_size;
        let rnn = (0..dims.num_layers)
            .map(|l| {
                let input = if l == 0 {
                    dims.embedding_dim + dims.encoder_dim()
                } else {
                    h
                };
                let w_ih = matrix(&format!("rnn.{l}.w_ih"), input, 4 * h);
                let w_hh = matrix(&format!("rnn.{l}.w_hh"), h, 4 * h);
                let bias = matrix(&format!("rnn.{l}.bias"), 1, 4 * h).row(0).to_owned();
                LstmCell::new(w_ih, w_hh, bias)
            })
            .collect();
        let hidden_w = matrix("mlp_hidden.weight", dims.encoder_dim() + h, h);
        let hidden_b = matrix("mlp_hidden.bias", 1, h).row(0).to_owned();
        let out_w = matrix("mlp_out.weight", h, dims.vocab_size);
        let out_b: Array1<f32> = matrix("mlp_out.bias", 1, dims.vocab_size).row(0).to_owned();

        Self {
            dims,
            embedding,
            rnn,
            mlp_hidden: Linear::new(hidden_w, hidden_b),
            mlp_out: Linear::new(out_w, out_b),
        }
    }

    pub fn validate(&self) -> Result<(), DecodeError> {
        let dims = &self.dims;
        dims.validate()?;
        if self.rnn.len() != dims.num_layers {
            return Err(DecodeError::InvalidModel(format!(
                "expected {} recurrent layers, found {}",
                dims.num_layers,
                self.rnn.len()
            )));
        }

        self.embedding.check(dims.vocab_size, dims.embedding_dim)?;
        for (l, cell) in self.rnn.iter().enumerate() {
            let input = if l == 0 {
                dims.embedding_dim + dims.encoder_dim()
            } else {
                dims.hidden_size
            };
            cell.check(&format!("rnn.{l}"), input, dims.hidden_size)?;
        }
        self.mlp_hidden.check(
            "mlp_hidden",
            dims.encoder_dim() + dims.hidden_size,
            dims.hidden_size,
        )?;
        self.mlp_out.check("mlp_out", dims.hidden_size, dims.vocab_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dims() -> ModelDims {
        ModelDims {
            vocab_size: 5,
            embedding_dim: 3,
            hidden_size: 4,
            num_layers: 2,
        }
    }

    #[test]
    fn from_fn_produces_valid_shapes() {
        let weights = DecoderWeights::from_fn(dims(), |_, i| (i as f32).sin() * 0.1);
        weights.validate().unwrap();
        assert_eq!(weights.rnn[0].w_ih.shape(), &[7, 16]);
        assert_eq!(weights.rnn[1].w_ih.shape(), &[4, 16]);
        assert_eq!(weights.mlp_out.weight.shape(), &[4, 5]);
    }

    #[test]
    fn validate_catches_missing_layer() {
        let mut weights = DecoderWeights::from_fn(dims(), |_, _| 0.0);
        weights.rnn.pop();
        assert!(matches!(
            weights.validate(),
            Err(DecodeError::InvalidModel(_))
        ));
    }

    #[test]
    fn save_and_load_preserve_parameters() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("decoder.json");
        let weights = DecoderWeights::from_fn(dims(), |name, i| name.len() as f32 + i as f32);
        weights.save(&path).unwrap();

        let loaded = DecoderWeights::load(&path).unwrap();
        assert_eq!(loaded.dims, weights.dims);
        assert_eq!(loaded.embedding.weight, weights.embedding.weight);
        assert_eq!(loaded.rnn[1].bias, weights.rnn[1].bias);
    }

    #[test]
    fn load_rejects_wrong_shapes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("decoder.json");
        let mut weights = DecoderWeights::from_fn(dims(), |_, _| 0.0);
        weights.mlp_out = Linear::new(Array2::zeros((4, 6)), Array1::zeros(6));
        weights.save(&path).unwrap();

        let err = DecoderWeights::load(&path).unwrap_err();
        assert!(matches!(err, DecodeError::WeightShape { .. }));
    }
}
