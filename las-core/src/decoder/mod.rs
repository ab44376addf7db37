use std::time::Instant;

use ndarray::ArrayView2;

use crate::config::DecodeConfig;
use crate::error::DecodeError;
use crate::vocab::Vocabulary;

pub mod search;
pub mod state;

pub use state::*;

/// One decoder step: consume the previous symbol and state, score the next symbol.
pub trait StepModel {
    fn vocab_size(&self) -> usize;

    /// Width of the encoder rows this model attends over.
    fn encoder_dim(&self) -> usize;

    fn zero_state(&self) -> DecoderState;

    fn step(
        &self,
        prev_token: i32,
        state: &DecoderState,
        encoder: &ArrayView2<f32>,
    ) -> Result<StepOutput, DecodeError>;
}

/// Searches for the best completed hypotheses for one utterance, best first.
///
/// Beam width 1 runs the greedy path, which yields the same single hypothesis
/// that a width-1 beam would.
pub fn decode<M: StepModel + ?Sized>(
    model: &M,
    encoder: &ArrayView2<f32>,
    vocab: &Vocabulary,
    config: &DecodeConfig,
) -> Result<(Vec<Hypothesis>, SearchStats), DecodeError> {
    config.validate()?;
    check_input(model, encoder, vocab)?;

    let frames = encoder.nrows();
    let max_steps = config.max_steps(frames);
    let start = Instant::now();

    let result = if config.beam_size <= 1 {
        log::debug!("Decoding (Greedy) frames_len={} max_len={}", frames, max_steps);
        search::decode_greedy(model, encoder, vocab, max_steps)?
    } else {
        log::debug!(
            "Decoding (Beam={}) frames_len={} max_len={}",
            config.beam_size,
            frames,
            max_steps
        );
        search::decode_beam(
            model,
            encoder,
            vocab,
            max_steps,
            config.beam_size,
            config.nbest,
        )?
    };

    log::debug!(
        "Decoding finished after {} step(s) in {:?}",
        result.1.steps,
        start.elapsed()
    );
    Ok(result)
}

fn check_input<M: StepModel + ?Sized>(
    model: &M,
    encoder: &ArrayView2<f32>,
    vocab: &Vocabulary,
) -> Result<(), DecodeError> {
    if encoder.nrows() == 0 {
        return Err(DecodeError::InvalidInput(
            "encoder output has zero timesteps".to_string(),
        ));
    }
    if encoder.ncols() != model.encoder_dim() {
        return Err(DecodeError::InvalidInput(format!(
            "encoder rows have width {}, model expects {}",
            encoder.ncols(),
            model.encoder_dim()
        )));
    }
    if vocab.len() != model.vocab_size() {
        return Err(DecodeError::InvalidInput(format!(
            "dictionary has {} symbols, model scores {}",
            vocab.len(),
            model.vocab_size()
        )));
    }
    Ok(())
}
