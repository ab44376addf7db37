use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::decoder::Hypothesis;
use crate::error::DecodeError;

pub const SOS_SYMBOL: &str = "<sos>";
pub const EOS_SYMBOL: &str = "<eos>";
pub const SPACE_SYMBOL: &str = "<space>";

static SPACE_RUN_RE: LazyLock<Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(r"(?:\s*<space>\s*)+|\s{2,}"));

/// One decoded utterance, ready for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Transcript {
    pub text: String,
    pub tokens: Vec<String>,
    pub token_ids: Vec<i32>,
    pub score: f32,
}

#[derive(Debug, Clone)]
pub struct Vocabulary {
    symbols: Vec<String>,
    index: HashMap<String, i32>,
    sos_id: i32,
    eos_id: i32,
}

impl Vocabulary {
    /// Builds a vocabulary from symbols ordered by id.
    pub fn from_symbols<I, S>(symbols: I) -> Result<Self, DecodeError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let symbols: Vec<String> = symbols.into_iter().map(Into::into).collect();
        let mut index = HashMap::with_capacity(symbols.len());
        for (i, s) in symbols.iter().enumerate() {
            if index.insert(s.clone(), i as i32).is_some() {
                return Err(DecodeError::Vocab(format!("duplicate symbol {s:?}")));
            }
        }
        let lookup = |name: &str| {
            index
                .get(name)
                .copied()
                .ok_or_else(|| DecodeError::Vocab(format!("missing {name}")))
        };
        let sos_id = lookup(SOS_SYMBOL)?;
        let eos_id = lookup(EOS_SYMBOL)?;

        Ok(Self {
            symbols,
            index,
            sos_id,
            eos_id,
        })
    }

    /// Parses a dictionary with one `<symbol> <id>` entry per line. Ids follow line order.
    pub fn parse_dict(content: &str) -> Result<Self, DecodeError> {
        let symbols: Vec<&str> = content
            .lines()
            .filter_map(|l| l.split_whitespace().next())
            .collect();
        Self::from_symbols(symbols)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, DecodeError> {
        let content = fs::read_to_string(path.as_ref())?;
        let vocab = Self::parse_dict(&content)?;
        log::info!(
            "Loaded dictionary with {} symbols from {}",
            vocab.len(),
            path.as_ref().display()
        );
        Ok(vocab)
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn sos_id(&self) -> i32 {
        self.sos_id
    }

    pub fn eos_id(&self) -> i32 {
        self.eos_id
    }

    pub fn symbol(&self, id: i32) -> Option<&str> {
        usize::try_from(id)
            .ok()
            .and_then(|i| self.symbols.get(i))
            .map(String::as_str)
    }

    pub fn id_of(&self, symbol: &str) -> Option<i32> {
        self.index.get(symbol).copied()
    }

    /// Maps each character of `text` to an id; spaces become `<space>` when the dictionary has it.
    pub fn encode(&self, text: &str) -> Result<Vec<i32>, DecodeError> {
        text.chars()
            .map(|c| {
                let key = if c == ' ' && self.index.contains_key(SPACE_SYMBOL) {
                    SPACE_SYMBOL.to_string()
                } else {
                    c.to_string()
                };
                self.id_of(&key)
                    .ok_or_else(|| DecodeError::Vocab(format!("unknown symbol {key:?}")))
            })
            .collect()
    }

    /// Joins the symbols for `ids`, dropping the start/end markers.
    pub fn render(&self, ids: &[i32]) -> String {
        let joined: String = ids
            .iter()
            .filter(|&&id| id != self.sos_id && id != self.eos_id)
            .filter_map(|&id| self.symbol(id))
            .collect();
        match &*SPACE_RUN_RE {
            Ok(re) => re.replace_all(&joined, " ").trim().to_string(),
            Err(_) => joined.replace(SPACE_SYMBOL, " "),
        }
    }

    pub fn transcript(&self, hyp: &Hypothesis) -> Transcript {
        let token_ids = hyp.output_ids().to_vec();
        let tokens = token_ids
            .iter()
            .filter_map(|&id| self.symbol(id).map(str::to_string))
            .collect();
        Transcript {
            text: self.render(&token_ids),
            tokens,
            token_ids,
            score: hyp.score,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DICT: &str = "<unk> 0\n<sos> 1\n<eos> 2\n<space> 3\na 4\nb 5\n\n";

    #[test]
    fn parse_dict_reads_reserved_ids() {
        let vocab = Vocabulary::parse_dict(DICT).unwrap();
        assert_eq!(vocab.len(), 6);
        assert_eq!(vocab.sos_id(), 1);
        assert_eq!(vocab.eos_id(), 2);
        assert_eq!(vocab.symbol(4), Some("a"));
        assert_eq!(vocab.symbol(-1), None);
        assert_eq!(vocab.symbol(99), None);
    }

    #[test]
    fn parse_dict_requires_markers() {
        let err = Vocabulary::parse_dict("a 0\nb 1\n").unwrap_err();
        assert!(matches!(err, DecodeError::Vocab(_)));
    }

    #[test]
    fn duplicate_symbols_are_rejected() {
        let err = Vocabulary::from_symbols(["<sos>", "<eos>", "a", "a"]).unwrap_err();
        assert!(err.to_string().contains("duplicate"));
    }

    #[test]
    fn render_drops_markers_and_maps_space() {
        let vocab = Vocabulary::parse_dict(DICT).unwrap();
        assert_eq!(vocab.render(&[1, 4, 3, 5, 4, 2]), "a ba");
        assert_eq!(vocab.render(&[3, 3, 4, 3]), "a");
        assert_eq!(vocab.render(&[4, 3, 3, 5]), "a b");
    }

    #[test]
    fn encode_round_trips_through_render() {
        let vocab = Vocabulary::parse_dict(DICT).unwrap();
        let ids = vocab.encode("ab a").unwrap();
        assert_eq!(ids, vec![4, 5, 3, 4]);
        assert_eq!(vocab.render(&ids), "ab a");
        assert!(vocab.encode("c").is_err());
    }
}
