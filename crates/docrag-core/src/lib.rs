//! DocRAG Core - Domain types and collaborator traits for the DocRAG pipeline.

mod error;
mod traits;
mod types;

pub use error::{Error, Result};
pub use traits::*;
pub use types::*;
