//! Indexing
//!
//! Review chunking and the persisted vector index.

mod ann;
mod chunker;
mod documents;
mod store;

pub use ann::{AnnIndex, ANN_THRESHOLD};
pub use chunker::*;
pub use documents::*;
pub use store::*;
