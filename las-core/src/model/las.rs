use std::path::Path;
use std::time::Instant;

use ndarray::{concatenate, Array1, ArrayView2, Axis};

use super::attention::dot_product_attention;
use super::functional::log_softmax;
use super::layers::{Embedding, Linear, LstmCell};
use super::weights::DecoderWeights;
use crate::config::{DecodeConfig, ModelDims};
use crate::decoder::{self, DecoderState, Hypothesis, LayerState, StepModel, StepOutput};
use crate::error::DecodeError;
use crate::vocab::{Transcript, Vocabulary};

/// Listen-Attend-Spell decoder: embedding, stacked LSTM, dot-product attention and an MLP head.
pub struct LasDecoder {
    dims: ModelDims,
    embedding: Embedding,
    rnn: Vec<LstmCell>,
    mlp_hidden: Linear,
    mlp_out: Linear,
}

impl LasDecoder {
    pub fn new(weights: DecoderWeights) -> Result<Self, DecodeError> {
        weights.validate()?;
        let DecoderWeights {
            dims,
            embedding,
            rnn,
            mlp_hidden,
            mlp_out,
        } = weights;
        Ok(Self {
            dims,
            embedding,
            rnn,
            mlp_hidden,
            mlp_out,
        })
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, DecodeError> {
        let start = Instant::now();
        let decoder = Self::new(DecoderWeights::load(&path)?)?;
        log::info!(
            "LAS decoder ({} layer(s), hidden {}, vocab {}) loaded in {:?}",
            decoder.dims.num_layers,
            decoder.dims.hidden_size,
            decoder.dims.vocab_size,
            start.elapsed()
        );
        Ok(decoder)
    }

    pub fn dims(&self) -> &ModelDims {
        &self.dims
    }

    /// Runs one step and returns the unnormalised vocabulary scores with the new state.
    ///
    /// 1. `s_i = RNN(s_{i-1}, y_{i-1}, c_{i-1})`
    /// 2. `c_i = Attention(s_i, encoder)`
    /// 3. `logits = MLP([s_i; c_i])`
    pub fn step_logits(
        &self,
        prev_token: i32,
        state: &DecoderState,
        encoder: &ArrayView2<f32>,
    ) -> Result<(Array1<f32>, DecoderState), DecodeError> {
        if state.layers.len() != self.rnn.len() {
            return Err(DecodeError::InvalidInput(format!(
                "state has {} layer(s), decoder has {}",
                state.layers.len(),
                self.rnn.len()
            )));
        }

        let embedded = self.embedding.forward(prev_token)?;
        let mut input = concatenate(Axis(0), &[embedded, state.context.view()])?;
        let mut layers = Vec::with_capacity(self.rnn.len());
        for (cell, prev) in self.rnn.iter().zip(&state.layers) {
            let (h, c) = cell.forward(&input.view(), &prev.h.view(), &prev.c.view());
            input = h.clone();
            layers.push(LayerState { h, c });
        }

        let (context, _weights) = dot_product_attention(&input.view(), encoder);
        let mlp_input = concatenate(Axis(0), &[input.view(), context.view()])?;
        let hidden = self.mlp_hidden.forward(&mlp_input.view()).mapv(f32::tanh);
        let logits = self.mlp_out.forward(&hidden.view());

        Ok((logits, DecoderState { layers, context }))
    }

    /// Beam search over one utterance's encoder outputs (`T x H`), best first.
    pub fn recognize_beam(
        &self,
        encoder: &ArrayView2<f32>,
        vocab: &Vocabulary,
        config: &DecodeConfig,
    ) -> Result<Vec<Hypothesis>, DecodeError> {
        let (hyps, stats) = decoder::decode(self, encoder, vocab, config)?;
        log::debug!(
            "Search kept at most {} hypotheses, {} completed",
            stats.max_active,
            stats.completed
        );
        Ok(hyps)
    }

    pub fn recognize(
        &self,
        encoder: &ArrayView2<f32>,
        vocab: &Vocabulary,
        config: &DecodeConfig,
    ) -> Result<Vec<Transcript>, DecodeError> {
        let start = Instant::now();
        let transcripts: Vec<_> = self
            .recognize_beam(encoder, vocab, config)?
            .iter()
            .map(|h| vocab.transcript(h))
            .collect();
        log::info!(
            "Recognized {} frame(s) into {} hypothesis(es) in {:?}",
            encoder.nrows(),
            transcripts.len(),
            start.elapsed()
        );
        Ok(transcripts)
    }
}

impl StepModel for LasDecoder {
    fn vocab_size(&self) -> usize {
        self.dims.vocab_size
    }

    fn encoder_dim(&self) -> usize {
        self.dims.encoder_dim()
    }

    fn zero_state(&self) -> DecoderState {
        DecoderState::zeros(
            self.dims.num_layers,
            self.dims.hidden_size,
            self.dims.encoder_dim(),
        )
    }

    fn step(
        &self,
        prev_token: i32,
        state: &DecoderState,
        encoder: &ArrayView2<f32>,
    ) -> Result<StepOutput, DecodeError> {
        let (logits, state) = self.step_logits(prev_token, state, encoder)?;
        Ok(StepOutput {
            log_probs: log_softmax(&logits.view()),
            state,
        })
    }
}
