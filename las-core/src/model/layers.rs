use ndarray::{s, Array1, Array2, ArrayView1};
use serde::{Deserialize, Serialize};

use super::functional::sigmoid;
use crate::error::DecodeError;

fn expect_shape(name: &str, actual: &[usize], expected: &[usize]) -> Result<(), DecodeError> {
    if actual == expected {
        Ok(())
    } else {
        Err(DecodeError::WeightShape {
            name: name.to_string(),
            expected: expected.to_vec(),
            actual: actual.to_vec(),
        })
    }
}

/// `y = x · W + b`, with `W` stored as `(in_features, out_features)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Linear {
    pub weight: Array2<f32>,
    pub bias: Array1<f32>,
}

impl Linear {
    pub fn new(weight: Array2<f32>, bias: Array1<f32>) -> Self {
        Self { weight, bias }
    }

    pub fn in_features(&self) -> usize {
        self.weight.nrows()
    }

    pub fn out_features(&self) -> usize {
        self.weight.ncols()
    }

    pub fn forward(&self, x: &ArrayView1<f32>) -> Array1<f32> {
        x.dot(&self.weight) + &self.bias
    }

    pub(crate) fn check(&self, name: &str, inputs: usize, outputs: usize) -> Result<(), DecodeError> {
        expect_shape(&format!("{name}.weight"), self.weight.shape(), &[inputs, outputs])?;
        expect_shape(&format!("{name}.bias"), self.bias.shape(), &[outputs])
    }
}

/// Lookup table from symbol id to a dense row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Embedding {
    pub weight: Array2<f32>,
}

impl Embedding {
    pub fn new(weight: Array2<f32>) -> Self {
        Self { weight }
    }

    pub fn forward(&self, token: i32) -> Result<ArrayView1<'_, f32>, DecodeError> {
        usize::try_from(token)
            .ok()
            .filter(|&i| i < self.weight.nrows())
            .map(|i| self.weight.row(i))
            .ok_or_else(|| {
                DecodeError::InvalidInput(format!(
                    "token id {token} outside embedding table of {} rows",
                    self.weight.nrows()
                ))
            })
    }

    pub(crate) fn check(&self, vocab_size: usize, dim: usize) -> Result<(), DecodeError> {
        expect_shape("embedding.weight", self.weight.shape(), &[vocab_size, dim])
    }
}

/// Single LSTM cell. Gate blocks in `4H` are ordered input, forget, cell, output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LstmCell {
    /// `(input_size, 4H)`
    pub w_ih: Array2<f32>,
    /// `(H, 4H)`
    pub w_hh: Array2<f32>,
    pub bias: Array1<f32>,
}

impl LstmCell {
    pub fn new(w_ih: Array2<f32>, w_hh: Array2<f32>, bias: Array1<f32>) -> Self {
        Self { w_ih, w_hh, bias }
    }

    pub fn hidden_size(&self) -> usize {
        self.w_hh.nrows()
    }

    /// One timestep: returns the new `(h, c)`.
    pub fn forward(
        &self,
        x: &ArrayView1<f32>,
        h: &ArrayView1<f32>,
        c: &ArrayView1<f32>,
    ) -> (Array1<f32>, Array1<f32>) {
        let hs = self.hidden_size();
        let gates = x.dot(&self.w_ih) + h.dot(&self.w_hh) + &self.bias;

        let i_t = gates.slice(s![..hs]).mapv(sigmoid);
        let f_t = gates.slice(s![hs..2 * hs]).mapv(sigmoid);
        let g_t = gates.slice(s![2 * hs..3 * hs]).mapv(f32::tanh);
        let o_t = gates.slice(s![3 * hs..]).mapv(sigmoid);

        let c_next = &f_t * c + &i_t * &g_t;
        let h_next = &o_t * &c_next.mapv(f32::tanh);
        (h_next, c_next)
    }

    pub(crate) fn check(&self, name: &str, input_size: usize, hidden: usize) -> Result<(), DecodeError> {
        expect_shape(&format!("{name}.w_ih"), self.w_ih.shape(), &[input_size, 4 * hidden])?;
        expect_shape(&format!("{name}.w_hh"), self.w_hh.shape(), &[hidden, 4 * hidden])?;
        expect_shape(&format!("{name}.bias"), self.bias.shape(), &[4 * hidden])
    }
}
