use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use las_speller_lib::{DecodeConfig, LasDecoder, Vocabulary, IGNORE_ID};
use ndarray::Array2;
use serde::de::DeserializeOwned;

use crate::cli::ModelArgs;

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content =
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("parsing {}", path.display()))
}

fn to_matrix(rows: Vec<Vec<f32>>) -> Result<Array2<f32>> {
    let width = rows.first().map(Vec::len).unwrap_or(0);
    if rows.iter().any(|r| r.len() != width) {
        bail!("encoder rows have differing widths");
    }
    let frames = rows.len();
    let flat: Vec<f32> = rows.into_iter().flatten().collect();
    Ok(Array2::from_shape_vec((frames, width), flat)?)
}

fn load_model(args: &ModelArgs) -> Result<(LasDecoder, Vocabulary)> {
    let decoder = LasDecoder::load(&args.model)
        .with_context(|| format!("loading decoder weights from {}", args.model.display()))?;
    let vocab = Vocabulary::load(&args.dict)
        .with_context(|| format!("loading dictionary from {}", args.dict.display()))?;
    Ok((decoder, vocab))
}

pub fn decode(
    model: &ModelArgs,
    input: &Path,
    beam_size: Option<usize>,
    nbest: Option<usize>,
    max_len: Option<usize>,
    json: bool,
) -> Result<()> {
    let (decoder, vocab) = load_model(model)?;
    let encoder = to_matrix(read_json(input)?)?;

    let mut config = DecodeConfig::from_env();
    if let Some(v) = beam_size {
        config.beam_size = v;
    }
    if let Some(v) = nbest {
        config.nbest = v;
    }
    if let Some(v) = max_len {
        config.decode_max_len = v;
    }
    log::info!("Decoding {} frame(s) with {:?}", encoder.nrows(), config);

    let transcripts = decoder
        .recognize(&encoder.view(), &vocab, &config)
        .map_err(|e| anyhow::anyhow!("{}: {e}", e.user_message()))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&transcripts)?);
    } else {
        for (rank, t) in transcripts.iter().enumerate() {
            println!("{}\t{:.4}\t{}", rank + 1, t.score, t.text);
        }
    }
    Ok(())
}

pub fn score(model: &ModelArgs, input: &Path, targets: &Path) -> Result<()> {
    let (decoder, vocab) = load_model(model)?;
    let encoders = read_json::<Vec<Vec<Vec<f32>>>>(input)?
        .into_iter()
        .map(to_matrix)
        .collect::<Result<Vec<_>>>()?;
    let texts: Vec<String> = read_json(targets)?;

    let ids = texts
        .iter()
        .map(|t| vocab.encode(t))
        .collect::<Result<Vec<_>, _>>()?;
    // pad to a common length the way batched targets arrive
    let width = ids.iter().map(Vec::len).max().unwrap_or(0);
    let padded: Vec<Vec<i32>> = ids
        .into_iter()
        .map(|mut y| {
            y.resize(width, IGNORE_ID);
            y
        })
        .collect();

    let views: Vec<_> = encoders.iter().map(|e| e.view()).collect();
    let loss = decoder
        .teacher_forced_loss(&padded, &views, vocab.sos_id(), vocab.eos_id())
        .map_err(|e| anyhow::anyhow!("{}: {e}", e.user_message()))?;

    println!("utterances\t{}", padded.len());
    println!("loss\t{loss:.6}");
    Ok(())
}
