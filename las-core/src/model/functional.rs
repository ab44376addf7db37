use ndarray::{Array1, ArrayView1};

pub fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

/// Numerically stable softmax over a vector.
pub fn softmax(x: &ArrayView1<f32>) -> Array1<f32> {
    let max = x.fold(f32::NEG_INFINITY, |m, &v| m.max(v));
    let exp = x.mapv(|v| (v - max).exp());
    let sum = exp.sum();
    exp / sum
}

/// `log(softmax(x))`, computed without forming the probabilities.
pub fn log_softmax(x: &ArrayView1<f32>) -> Array1<f32> {
    let max = x.fold(f32::NEG_INFINITY, |m, &v| m.max(v));
    let log_sum = x.iter().map(|&v| (v - max).exp()).sum::<f32>().ln() + max;
    x.mapv(|v| v - log_sum)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn softmax_sums_to_one() {
        let p = softmax(&array![1.0_f32, 2.0, 3.0].view());
        assert!((p.sum() - 1.0).abs() < 1e-6);
        assert!(p[2] > p[1] && p[1] > p[0]);
    }

    #[test]
    fn softmax_handles_large_logits() {
        let p = softmax(&array![1000.0_f32, 1000.0].view());
        assert!((p[0] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn log_softmax_matches_log_of_softmax() {
        let x = array![0.5_f32, -1.0, 2.0, 0.0];
        let expected = softmax(&x.view()).mapv(f32::ln);
        let actual = log_softmax(&x.view());
        for (a, e) in actual.iter().zip(expected.iter()) {
            assert!((a - e).abs() < 1e-5);
        }
    }

    #[test]
    fn sigmoid_is_centered() {
        assert!((sigmoid(0.0) - 0.5).abs() < f32::EPSILON);
        assert!(sigmoid(20.0) > 0.99);
    }
}
