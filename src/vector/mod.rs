pub mod embedding;
pub mod selection;
pub mod similarity;

pub use embedding::*;
pub use selection::*;
pub use similarity::*;

pub const TARGET_VECTOR: &str = "article-embeddings";
