use las_speller_lib::training::prepare_targets;
use las_speller_lib::{DecodeError, DecoderWeights, LasDecoder, ModelDims, IGNORE_ID};
use ndarray::Array2;

const SOS: i32 = 0;
const EOS: i32 = 1;

fn dims() -> ModelDims {
    ModelDims {
        vocab_size: 6,
        embedding_dim: 2,
        hidden_size: 3,
        num_layers: 2,
    }
}

fn encoder(frames: usize) -> Array2<f32> {
    Array2::from_shape_fn((frames, 3), |(t, d)| (t as f32 - d as f32) * 0.25)
}

#[test]
fn zero_weights_give_uniform_loss() {
    let model = LasDecoder::new(DecoderWeights::from_fn(dims(), |_, _| 0.0)).unwrap();
    let enc = encoder(4);
    let loss = model
        .teacher_forced_loss(&[vec![2, 3, 4]], &[enc.view()], SOS, EOS)
        .unwrap();
    assert!((loss - (6.0_f32).ln()).abs() < 1e-5);
}

#[test]
fn padding_does_not_change_loss() {
    let weights = DecoderWeights::from_fn(dims(), |name, i| ((i + name.len()) as f32).sin() * 0.3);
    let model = LasDecoder::new(weights).unwrap();
    let (e1, e2) = (encoder(5), encoder(2));

    let alone = model
        .teacher_forced_loss(&[vec![2, 5, 3]], &[e1.view()], SOS, EOS)
        .unwrap();
    let padded = model
        .teacher_forced_loss(&[vec![2, 5, 3, IGNORE_ID, IGNORE_ID]], &[e1.view()], SOS, EOS)
        .unwrap();
    assert!((alone - padded).abs() < 1e-6);
    assert!(alone.is_finite() && alone > 0.0);

    // the batch mean weighs positions, not utterances
    let short = model
        .teacher_forced_loss(&[vec![4]], &[e2.view()], SOS, EOS)
        .unwrap();
    let batch = model
        .teacher_forced_loss(
            &[vec![2, 5, 3], vec![4, IGNORE_ID, IGNORE_ID]],
            &[e1.view(), e2.view()],
            SOS,
            EOS,
        )
        .unwrap();
    let expected = (alone * 4.0 + short * 2.0) / 6.0;
    assert!((batch - expected).abs() < 1e-5);
}

#[test]
fn mismatched_batch_is_rejected() {
    let model = LasDecoder::new(DecoderWeights::from_fn(dims(), |_, _| 0.1)).unwrap();
    let enc = encoder(3);
    let err = model
        .teacher_forced_loss(&[vec![2], vec![3]], &[enc.view()], SOS, EOS)
        .unwrap_err();
    assert!(matches!(err, DecodeError::InvalidInput(_)));

    let err = model
        .teacher_forced_loss(&[vec![9]], &[enc.view()], SOS, EOS)
        .unwrap_err();
    assert!(matches!(err, DecodeError::InvalidInput(_)));
}

#[test]
fn targets_line_up_for_teacher_forcing() {
    let targets = prepare_targets(&[vec![3, 4, 5], vec![2, IGNORE_ID, IGNORE_ID]], SOS, EOS);
    assert_eq!(targets.ys_in.row(0).to_vec(), vec![SOS, 3, 4, 5]);
    assert_eq!(targets.ys_out.row(0).to_vec(), vec![3, 4, 5, EOS]);
    assert_eq!(targets.ys_in.row(1).to_vec(), vec![SOS, 2, EOS, EOS]);
    assert_eq!(targets.ys_out.row(1).to_vec(), vec![2, EOS, IGNORE_ID, IGNORE_ID]);
}
