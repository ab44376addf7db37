use ndarray::ArrayView2;

use crate::error::DecodeError;
use crate::vocab::Vocabulary;

use super::state::{top_k_log_probs, Hypothesis, SearchStats};
use super::StepModel;

/// Arg-max decoding. Callers are expected to have validated inputs, see [`super::decode`].
pub fn decode_greedy<M: StepModel + ?Sized>(
    model: &M,
    encoder: &ArrayView2<f32>,
    vocab: &Vocabulary,
    max_steps: usize,
) -> Result<(Vec<Hypothesis>, SearchStats), DecodeError> {
    let eos = vocab.eos_id();
    let mut hyp = Hypothesis::initial(vocab.sos_id(), model.zero_state());
    let mut stats = SearchStats {
        max_active: 1,
        ..Default::default()
    };

    for i in 0..max_steps {
        let out = model.step(hyp.last_token(), &hyp.state, encoder)?;
        let (token, log_prob) = top_k_log_probs(&out.log_probs.view(), 1)
            .first()
            .copied()
            .ok_or_else(|| DecodeError::InvalidInput("model produced no scores".into()))?;
        hyp = hyp.extend(token as i32, log_prob, out.state);
        stats.steps = i + 1;

        if i == max_steps - 1 && hyp.last_token() != eos {
            hyp.yseq.push(eos);
        }
        if hyp.is_ended(eos) {
            break;
        }
        log::trace!("hypo: {}", vocab.render(hyp.output_ids()));
    }

    stats.completed = 1;
    Ok((vec![hyp], stats))
}

/// Beam search returning at most `nbest` completed hypotheses, best first.
///
/// The width is capped at the vocabulary size. At the last step `<eos>` is appended
/// only to survivors that do not already end with it, so a sequence never carries
/// two trailing end markers.
pub fn decode_beam<M: StepModel + ?Sized>(
    model: &M,
    encoder: &ArrayView2<f32>,
    vocab: &Vocabulary,
    max_steps: usize,
    beam_size: usize,
    nbest: usize,
) -> Result<(Vec<Hypothesis>, SearchStats), DecodeError> {
    let eos = vocab.eos_id();
    let beam_size = beam_size.min(model.vocab_size()).max(1);
    let mut hyps = vec![Hypothesis::initial(vocab.sos_id(), model.zero_state())];
    let mut ended: Vec<Hypothesis> = Vec::new();
    let mut stats = SearchStats::default();

    for i in 0..max_steps {
        let mut kept = Vec::with_capacity(hyps.len().saturating_mul(beam_size));
        for hyp in &hyps {
            let out = model.step(hyp.last_token(), &hyp.state, encoder)?;
            for (token, log_prob) in top_k_log_probs(&out.log_probs.view(), beam_size) {
                kept.push(hyp.extend(token as i32, log_prob, out.state.clone()));
            }
        }

        if kept.is_empty() {
            return Err(DecodeError::InvalidInput("model produced no scores".into()));
        }

        // Stable: among equal scores the earlier-generated successor survives.
        kept.sort_by(|a, b| b.score.total_cmp(&a.score));
        kept.truncate(beam_size);
        stats.max_active = stats.max_active.max(kept.len());
        stats.steps = i + 1;

        if i == max_steps - 1 {
            for hyp in kept.iter_mut().filter(|h| h.last_token() != eos) {
                hyp.yseq.push(eos);
            }
        }

        let (done, remaining): (Vec<_>, Vec<_>) =
            kept.into_iter().partition(|h| h.is_ended(eos));
        ended.extend(done);
        hyps = remaining;

        if hyps.is_empty() {
            log::debug!("No hypothesis left after step {}, finished decoding", i + 1);
            break;
        }
        log::debug!("Remaining hypotheses: {}", hyps.len());
        for hyp in &hyps {
            log::trace!("hypo: {}", vocab.render(hyp.output_ids()));
        }
    }

    if ended.is_empty() {
        log::warn!(
            "Beam search exhausted {} step(s) without a completed hypothesis",
            max_steps
        );
    }

    stats.completed = ended.len();
    ended.sort_by(|a, b| b.score.total_cmp(&a.score));
    ended.truncate(nbest);
    Ok((ended, stats))
}
