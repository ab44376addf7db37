use std::time::Instant;

use ndarray::{Array2, ArrayView2};

use crate::decoder::StepModel;
use crate::error::DecodeError;
use crate::model::functional::log_softmax;
use crate::model::LasDecoder;
use crate::IGNORE_ID;

/// Stacks variable-length sequences into a matrix, filling the tail of each row with `pad`.
pub fn pad_list(seqs: &[Vec<i32>], pad: i32) -> Array2<i32> {
    let width = seqs.iter().map(Vec::len).max().unwrap_or(0);
    let mut padded = Array2::from_elem((seqs.len(), width), pad);
    for (mut row, seq) in padded.outer_iter_mut().zip(seqs) {
        for (dst, &src) in row.iter_mut().zip(seq) {
            *dst = src;
        }
    }
    padded
}

/// Decoder inputs and outputs for teacher forcing.
///
/// Padding is stripped from each target, then `ys_in = [sos] + y` (padded with `eos`)
/// and `ys_out = y + [eos]` (padded with [`IGNORE_ID`]).
#[derive(Debug, Clone, PartialEq)]
pub struct TeacherTargets {
    pub ys_in: Array2<i32>,
    pub ys_out: Array2<i32>,
}

pub fn prepare_targets(padded_targets: &[Vec<i32>], sos_id: i32, eos_id: i32) -> TeacherTargets {
    let ys: Vec<Vec<i32>> = padded_targets
        .iter()
        .map(|y| y.iter().copied().filter(|&t| t != IGNORE_ID).collect())
        .collect();
    let ys_in: Vec<Vec<i32>> = ys
        .iter()
        .map(|y| std::iter::once(sos_id).chain(y.iter().copied()).collect())
        .collect();
    let ys_out: Vec<Vec<i32>> = ys
        .iter()
        .map(|y| y.iter().copied().chain(std::iter::once(eos_id)).collect())
        .collect();

    TeacherTargets {
        ys_in: pad_list(&ys_in, eos_id),
        ys_out: pad_list(&ys_out, IGNORE_ID),
    }
}

impl LasDecoder {
    /// Mean cross-entropy of the targets under teacher forcing.
    ///
    /// `padded_targets[n]` is scored against `encoders[n]`. Every position whose
    /// output target is [`IGNORE_ID`] is left out of the mean.
    pub fn teacher_forced_loss(
        &self,
        padded_targets: &[Vec<i32>],
        encoders: &[ArrayView2<f32>],
        sos_id: i32,
        eos_id: i32,
    ) -> Result<f32, DecodeError> {
        if padded_targets.len() != encoders.len() {
            return Err(DecodeError::InvalidInput(format!(
                "{} target sequence(s) for {} encoder output(s)",
                padded_targets.len(),
                encoders.len()
            )));
        }

        let start = Instant::now();
        let targets = prepare_targets(padded_targets, sos_id, eos_id);
        let mut total = 0.0_f64;
        let mut count = 0_usize;

        for ((ys_in, ys_out), encoder) in targets
            .ys_in
            .outer_iter()
            .zip(targets.ys_out.outer_iter())
            .zip(encoders)
        {
            if encoder.nrows() == 0 || encoder.ncols() != self.encoder_dim() {
                return Err(DecodeError::InvalidInput(format!(
                    "encoder output of shape {:?} does not match width {}",
                    encoder.shape(),
                    self.encoder_dim()
                )));
            }

            let mut state = self.zero_state();
            for (&y_in, &y_out) in ys_in.iter().zip(ys_out.iter()) {
                // the rest of the row is padding
                if y_out == IGNORE_ID {
                    break;
                }
                let (logits, next) = self.step_logits(y_in, &state, encoder)?;
                let log_probs = log_softmax(&logits.view());
                let target_lp = usize::try_from(y_out)
                    .ok()
                    .and_then(|t| log_probs.get(t).copied())
                    .ok_or_else(|| {
                        DecodeError::InvalidInput(format!("target id {y_out} outside vocabulary"))
                    })?;
                total -= f64::from(target_lp);
                count += 1;
                state = next;
            }
        }

        if count == 0 {
            return Err(DecodeError::InvalidInput(
                "no target positions to score".to_string(),
            ));
        }

        let loss = (total / count as f64) as f32;
        log::debug!(
            "Teacher-forced loss {:.4} over {} position(s) in {:?}",
            loss,
            count,
            start.elapsed()
        );
        Ok(loss)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn pad_list_fills_tail() {
        let padded = pad_list(&[vec![1, 2, 3], vec![4]], -1);
        assert_eq!(padded, array![[1, 2, 3], [4, -1, -1]]);
    }

    #[test]
    fn pad_list_of_nothing_is_empty() {
        let padded = pad_list(&[], 0);
        assert_eq!(padded.shape(), &[0, 0]);
    }

    #[test]
    fn prepare_targets_injects_markers() {
        let targets = prepare_targets(&[vec![5, 6, IGNORE_ID], vec![7, IGNORE_ID, IGNORE_ID]], 1, 2);
        assert_eq!(targets.ys_in, array![[1, 5, 6], [1, 7, 2]]);
        assert_eq!(targets.ys_out, array![[5, 6, 2], [7, 2, IGNORE_ID]]);
        assert_eq!(targets.ys_in.shape(), targets.ys_out.shape());
    }
}
