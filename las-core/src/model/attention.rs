use ndarray::{Array1, ArrayView1, ArrayView2};

use super::functional::softmax;

/// Dot-product attention of one query over every encoder row.
///
/// Returns `(context, weights)` where `weights` is a distribution over timesteps
/// and `context` is the weighted sum of rows.
pub fn dot_product_attention(
    query: &ArrayView1<f32>,
    values: &ArrayView2<f32>,
) -> (Array1<f32>, Array1<f32>) {
    let scores = values.dot(query);
    let weights = softmax(&scores.view());
    let context = weights.dot(values);
    (context, weights)
}
