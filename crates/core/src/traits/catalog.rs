//! Product retrieval trait

use async_trait::async_trait;

use crate::{Product, Result};

/// Ranked product search over the catalog
///
/// Implementations:
/// - `CatalogIndex` - in-process BM25 index
///
/// Implementations must be safe to share across concurrent pipeline runs.
#[async_trait]
pub trait ProductIndex: Send + Sync + 'static {
    /// Search products by free text
    ///
    /// # Arguments
    /// * `query` - Search terms (English)
    /// * `limit` - Maximum number of products to return
    ///
    /// # Returns
    /// Products ordered by relevance; an empty list is a valid answer
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<Product>>;

    /// Look up a product by catalog id
    async fn get(&self, _id: &str) -> Result<Option<Product>> {
        Ok(None)
    }

    /// Number of indexed products
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
