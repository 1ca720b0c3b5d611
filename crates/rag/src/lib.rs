//! Product catalog retrieval
//!
//! Features:
//! - BM25 search over product name, description and category via Tantivy
//! - Exact product lookup by id (cart updates)
//! - JSON/YAML catalog loading with image URL prefixing
//! - Bundled sample catalog for demos

pub mod catalog_index;
pub mod catalog_loader;
pub mod sample;

pub use catalog_index::CatalogIndex;
pub use catalog_loader::{CatalogFile, CatalogLoader};
pub use sample::sample_products;

use thiserror::Error;

/// Catalog errors
#[derive(Error, Debug)]
pub enum RagError {
    #[error("Search error: {0}")]
    Search(String),

    #[error("Index error: {0}")]
    Index(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

impl From<RagError> for indic_commerce_core::Error {
    fn from(err: RagError) -> Self {
        indic_commerce_core::Error::Search(err.to_string())
    }
}
