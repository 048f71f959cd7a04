pub mod fuzzy;

pub use fuzzy::{levenshtein_distance, similarity_percent, string_similarity};
