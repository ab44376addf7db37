use ndarray::{Array1, ArrayView1};

/// Hidden and carry vectors of one recurrent layer.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerState {
    pub h: Array1<f32>,
    pub c: Array1<f32>,
}

impl LayerState {
    pub fn zeros(hidden_size: usize) -> Self {
        Self {
            h: Array1::zeros(hidden_size),
            c: Array1::zeros(hidden_size),
        }
    }
}

/// Recurrent state carried between decode steps: one pair per layer, bottom layer first,
/// plus the attention context produced by the previous step.
#[derive(Debug, Clone, PartialEq)]
pub struct DecoderState {
    pub layers: Vec<LayerState>,
    pub context: Array1<f32>,
}

impl DecoderState {
    pub fn zeros(num_layers: usize, hidden_size: usize, context_dim: usize) -> Self {
        Self {
            layers: (0..num_layers)
                .map(|_| LayerState::zeros(hidden_size))
                .collect(),
            context: Array1::zeros(context_dim),
        }
    }

    /// Hidden vector of the top layer.
    pub fn output(&self) -> Option<&Array1<f32>> {
        self.layers.last().map(|l| &l.h)
    }
}

pub struct StepOutput {
    /// Log-probabilities over the vocabulary.
    pub log_probs: Array1<f32>,
    pub state: DecoderState,
}

/// A candidate output sequence. `yseq` starts with the start-of-sequence id.
#[derive(Debug, Clone)]
pub struct Hypothesis {
    pub score: f32,
    pub yseq: Vec<i32>,
    pub state: DecoderState,
}

impl Hypothesis {
    pub fn initial(sos_id: i32, state: DecoderState) -> Self {
        Self {
            score: 0.0,
            yseq: vec![sos_id],
            state,
        }
    }

    pub fn last_token(&self) -> i32 {
        *self.yseq.last().unwrap_or(&-1)
    }

    /// Emitted ids without the leading start marker.
    pub fn output_ids(&self) -> &[i32] {
        self.yseq.get(1..).unwrap_or(&[])
    }

    pub fn is_ended(&self, eos_id: i32) -> bool {
        self.yseq.len() > 1 && self.last_token() == eos_id
    }

    /// Successor owning its own copy of `state`.
    pub fn extend(&self, token: i32, log_prob: f32, state: DecoderState) -> Self {
        let mut yseq = Vec::with_capacity(self.yseq.len() + 1);
        yseq.extend_from_slice(&self.yseq);
        yseq.push(token);
        Self {
            score: self.score + log_prob,
            yseq,
            state,
        }
    }
}

/// Bookkeeping from one search, mostly for diagnostics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchStats {
    pub steps: usize,
    pub max_active: usize,
    pub completed: usize,
}

/// The `k` best ids by log-probability, best first. Equal scores keep the lower id first.
pub fn top_k_log_probs(log_probs: &ArrayView1<f32>, k: usize) -> Vec<(usize, f32)> {
    let mut candidates: Vec<_> = log_probs
        .iter()
        .copied()
        .enumerate()
        .filter(|(_, lp)| !lp.is_nan())
        .collect();

    candidates.sort_by(|a, b| b.1.total_cmp(&a.1));
    candidates.truncate(k.max(1));
    candidates
}
