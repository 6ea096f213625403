pub mod normalize;
pub mod wrap;

pub use normalize::{normalize, NormalizeOptions, Normalizer, DEFAULT_MAX_LINE_LENGTH};
pub use wrap::wrap_words;
