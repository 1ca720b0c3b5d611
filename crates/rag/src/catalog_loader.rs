//! Catalog file loading
//!
//! Catalogs are JSON or YAML, either a bare list of products or a document
//! with a `products` array. A directory is scanned for every such file.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

use indic_commerce_core::Product;

use crate::RagError;

/// Catalog file format
#[derive(Debug, Serialize, Deserialize)]
pub struct CatalogFile {
    /// Version for format compatibility
    #[serde(default)]
    pub version: Option<String>,
    pub products: Vec<Product>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CatalogDocument {
    File(CatalogFile),
    List(Vec<Product>),
}

impl CatalogDocument {
    fn into_products(self) -> Vec<Product> {
        match self {
            CatalogDocument::File(file) => file.products,
            CatalogDocument::List(products) => products,
        }
    }
}

pub struct CatalogLoader;

impl CatalogLoader {
    /// Load products from a catalog file or a directory of catalog files
    ///
    /// Entries without an id or name are skipped, and the first occurrence
    /// of a duplicated id wins.
    pub fn load_path(path: &Path) -> Result<Vec<Product>, RagError> {
        if !path.exists() {
            return Err(RagError::NotFound(format!(
                "Catalog path {} does not exist",
                path.display()
            )));
        }

        let products = if path.is_dir() {
            Self::load_directory(path)?
        } else {
            Self::load_file(path)?
        };

        Ok(Self::dedupe(products))
    }

    fn load_directory(dir: &Path) -> Result<Vec<Product>, RagError> {
        let entries = std::fs::read_dir(dir)
            .map_err(|e| RagError::Index(format!("Failed to read directory: {}", e)))?;

        let mut paths: Vec<_> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| is_catalog_file(path))
            .collect();
        paths.sort();

        let mut products = Vec::new();
        for path in paths {
            match Self::load_file(&path) {
                Ok(loaded) => {
                    tracing::info!(
                        file = %path.display(),
                        products = loaded.len(),
                        "Loaded catalog file"
                    );
                    products.extend(loaded);
                },
                Err(e) => {
                    tracing::error!(
                        file = %path.display(),
                        error = %e,
                        "Failed to load catalog file"
                    );
                },
            }
        }

        tracing::info!(
            directory = %dir.display(),
            total_products = products.len(),
            "Catalog loading complete"
        );
        Ok(products)
    }

    /// Load a single catalog file
    pub fn load_file(path: &Path) -> Result<Vec<Product>, RagError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| RagError::Index(format!("Failed to read file: {}", e)))?;

        let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        let document: CatalogDocument = match extension {
            "json" => serde_json::from_str(&content)
                .map_err(|e| RagError::Index(format!("JSON parse error: {}", e)))?,
            "yaml" | "yml" => serde_yaml::from_str(&content)
                .map_err(|e| RagError::Index(format!("YAML parse error: {}", e)))?,
            other => {
                return Err(RagError::Index(format!(
                    "Unsupported catalog format: {:?}",
                    other
                )))
            },
        };

        Ok(document.into_products())
    }

    /// Join `base` onto image paths that are not already absolute URLs
    pub fn apply_image_base_url(products: &mut [Product], base: &str) {
        let base = base.trim_end_matches('/');
        if base.is_empty() {
            return;
        }

        for product in products.iter_mut() {
            if let Some(image) = product.image_url.as_mut() {
                if image.starts_with("http://") || image.starts_with("https://") {
                    continue;
                }
                *image = format!("{}/{}", base, image.trim_start_matches('/'));
            }
        }
    }

    fn dedupe(products: Vec<Product>) -> Vec<Product> {
        let mut seen = HashSet::new();
        products
            .into_iter()
            .filter(|product| {
                if product.id.trim().is_empty() || product.name.trim().is_empty() {
                    tracing::warn!(id = %product.id, "Skipping catalog entry without id or name");
                    return false;
                }
                if !seen.insert(product.id.clone()) {
                    tracing::warn!(id = %product.id, "Duplicate product id, keeping first");
                    return false;
                }
                true
            })
            .collect()
    }
}

fn is_catalog_file(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("json" | "yaml" | "yml")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_json_list() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.json");
        std::fs::write(
            &path,
            r#"[{"id": "p1", "name": "Kurta", "price": "₹899", "category": "apparel"}]"#,
        )
        .unwrap();

        let products = CatalogLoader::load_path(&path).unwrap();
        assert_eq!(products.len(), 1);
        assert_eq!(products[0].name, "Kurta");
        assert_eq!(products[0].description, "");
        assert!(products[0].image_url.is_none());
    }

    #[test]
    fn test_load_directory_mixed_formats() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("a.yaml"),
            "version: \"1\"\nproducts:\n  - id: p1\n    name: Saree\n    price: \"₹2999\"\n",
        )
        .unwrap();
        std::fs::write(
            dir.path().join("b.json"),
            r#"{"products": [{"id": "p2", "name": "Dupatta", "price": "₹499"},
                             {"id": "p1", "name": "Duplicate", "price": "₹1"}]}"#,
        )
        .unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();
        std::fs::write(dir.path().join("broken.json"), "{not json").unwrap();

        let products = CatalogLoader::load_path(dir.path()).unwrap();
        let names: Vec<&str> = products.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Saree", "Dupatta"]);
    }

    #[test]
    fn test_skips_entries_without_id() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.json");
        std::fs::write(
            &path,
            r#"[{"id": "", "name": "Nameless", "price": "₹1"}, {"id": "p9", "name": "Bag", "price": "₹799"}]"#,
        )
        .unwrap();
        let products = CatalogLoader::load_path(&path).unwrap();
        assert_eq!(products.len(), 1);
        assert_eq!(products[0].id, "p9");
    }

    #[test]
    fn test_missing_and_unsupported() {
        assert!(matches!(
            CatalogLoader::load_path(Path::new("/nonexistent/catalog.json")),
            Err(RagError::NotFound(_))
        ));

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.csv");
        std::fs::write(&path, "id,name").unwrap();
        assert!(matches!(CatalogLoader::load_path(&path), Err(RagError::Index(_))));
    }

    #[test]
    fn test_apply_image_base_url() {
        let mut products = vec![
            Product {
                id: "a".into(),
                name: "A".into(),
                description: String::new(),
                price: "₹1".into(),
                category: String::new(),
                image_url: Some("/static/a.jpg".into()),
            },
            Product {
                id: "b".into(),
                name: "B".into(),
                description: String::new(),
                price: "₹1".into(),
                category: String::new(),
                image_url: Some("https://img.example.com/b.jpg".into()),
            },
        ];
        CatalogLoader::apply_image_base_url(&mut products, "https://shop.example.com/");
        assert_eq!(
            products[0].image_url.as_deref(),
            Some("https://shop.example.com/static/a.jpg")
        );
        assert_eq!(
            products[1].image_url.as_deref(),
            Some("https://img.example.com/b.jpg")
        );
    }
}
