pub mod attention;
pub mod functional;
pub mod layers;
mod las;
mod weights;

pub use las::LasDecoder;
pub use layers::{Embedding, Linear, LstmCell};
pub use weights::DecoderWeights;
