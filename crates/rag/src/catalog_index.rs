//! Product search using Tantivy (BM25)
//!
//! Products are indexed on name, description and category with an English
//! stemmer, so "shoes" finds "Running Shoes" and "earbud" finds "Wireless
//! Earbuds". Search terms arrive in English from the classifier.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::path::Path;
use tantivy::{
    collector::TopDocs,
    query::{QueryParser, TermQuery},
    schema::{
        Field, IndexRecordOption, OwnedValue, Schema, TextFieldIndexing, TextOptions, STORED,
        STRING,
    },
    tokenizer::{
        Language as StemLanguage, LowerCaser, RemoveLongFilter, SimpleTokenizer, Stemmer,
        TextAnalyzer,
    },
    Index, IndexReader, IndexWriter, TantivyDocument, Term,
};

use indic_commerce_config::CatalogConfig;
use indic_commerce_core::{Product, ProductIndex};

use crate::catalog_loader::CatalogLoader;
use crate::sample::sample_products;
use crate::RagError;

const TOKENIZER: &str = "catalog";

/// Boost applied to name matches over description/category matches
const NAME_BOOST: f32 = 2.0;

/// In-process BM25 index over the product catalog
pub struct CatalogIndex {
    index: Index,
    reader: IndexReader,
    writer: Mutex<IndexWriter>,
    id_field: Field,
    name_field: Field,
    description_field: Field,
    category_field: Field,
    price_field: Field,
    image_field: Field,
}

impl CatalogIndex {
    /// Create an empty in-memory index
    pub fn new() -> Result<Self, RagError> {
        let mut schema_builder = Schema::builder();

        let text_options = TextOptions::default()
            .set_indexing_options(
                TextFieldIndexing::default()
                    .set_tokenizer(TOKENIZER)
                    .set_index_option(IndexRecordOption::WithFreqsAndPositions),
            )
            .set_stored();

        let id_field = schema_builder.add_text_field("id", STRING | STORED);
        let name_field = schema_builder.add_text_field("name", text_options.clone());
        let description_field = schema_builder.add_text_field("description", text_options.clone());
        let category_field = schema_builder.add_text_field("category", text_options);
        let price_field = schema_builder.add_text_field("price", STORED);
        let image_field = schema_builder.add_text_field("image_url", STORED);

        let schema = schema_builder.build();
        let index = Index::create_in_ram(schema);

        let tokenizer = TextAnalyzer::builder(SimpleTokenizer::default())
            .filter(RemoveLongFilter::limit(100))
            .filter(LowerCaser)
            .filter(Stemmer::new(StemLanguage::English))
            .build();
        index.tokenizers().register(TOKENIZER, tokenizer);

        let reader = index.reader().map_err(|e| RagError::Index(e.to_string()))?;
        let writer = index
            .writer(50_000_000) // 50MB buffer
            .map_err(|e| RagError::Index(e.to_string()))?;

        Ok(Self {
            index,
            reader,
            writer: Mutex::new(writer),
            id_field,
            name_field,
            description_field,
            category_field,
            price_field,
            image_field,
        })
    }

    /// Build an index holding `products`
    pub fn with_products(products: &[Product]) -> Result<Self, RagError> {
        let index = Self::new()?;
        index.index_products(products)?;
        Ok(index)
    }

    /// Build the index described by the `catalog` settings section
    ///
    /// A configured path wins; otherwise the bundled sample catalog is used
    /// when enabled.
    pub fn from_config(config: &CatalogConfig) -> Result<Self, RagError> {
        let mut products = match &config.path {
            Some(path) => CatalogLoader::load_path(Path::new(path))?,
            None if config.use_sample_catalog => sample_products(),
            None => Vec::new(),
        };

        if let Some(base) = &config.image_base_url {
            CatalogLoader::apply_image_base_url(&mut products, base);
        }

        if products.is_empty() {
            tracing::warn!("Product catalog is empty; every search will return no matches");
        }

        let index = Self::with_products(&products)?;
        tracing::info!(products = index.len(), "Catalog index ready");
        Ok(index)
    }

    /// Add or replace products, keyed by id
    pub fn index_products(&self, products: &[Product]) -> Result<(), RagError> {
        let mut writer = self.writer.lock();

        for product in products {
            writer.delete_term(Term::from_field_text(self.id_field, &product.id));

            let mut doc = TantivyDocument::default();
            doc.add_text(self.id_field, &product.id);
            doc.add_text(self.name_field, &product.name);
            doc.add_text(self.description_field, &product.description);
            doc.add_text(self.category_field, &product.category);
            doc.add_text(self.price_field, &product.price);
            if let Some(ref image_url) = product.image_url {
                doc.add_text(self.image_field, image_url);
            }

            writer
                .add_document(doc)
                .map_err(|e| RagError::Index(e.to_string()))?;
        }

        writer
            .commit()
            .map_err(|e| RagError::Index(e.to_string()))?;

        self.reader
            .reload()
            .map_err(|e| RagError::Index(e.to_string()))?;

        Ok(())
    }

    /// Ranked search; free text is parsed leniently so stray quotes or
    /// colons in shopper input never fail the query
    pub fn search_products(&self, query: &str, limit: usize) -> Result<Vec<Product>, RagError> {
        if query.trim().is_empty() || limit == 0 {
            return Ok(Vec::new());
        }

        let searcher = self.reader.searcher();
        let mut query_parser = QueryParser::for_index(
            &self.index,
            vec![self.name_field, self.description_field, self.category_field],
        );
        query_parser.set_field_boost(self.name_field, NAME_BOOST);

        let (parsed, errors) = query_parser.parse_query_lenient(query);
        if !errors.is_empty() {
            tracing::debug!(query, errors = errors.len(), "Lenient query parse dropped terms");
        }

        let top_docs = searcher
            .search(&parsed, &TopDocs::with_limit(limit))
            .map_err(|e| RagError::Search(e.to_string()))?;

        let mut products = Vec::with_capacity(top_docs.len());
        for (_score, address) in top_docs {
            let doc: TantivyDocument = searcher
                .doc(address)
                .map_err(|e| RagError::Search(e.to_string()))?;
            products.push(self.to_product(&doc));
        }

        Ok(products)
    }

    /// Exact lookup by catalog id
    pub fn get_product(&self, id: &str) -> Result<Option<Product>, RagError> {
        let searcher = self.reader.searcher();
        let query = TermQuery::new(
            Term::from_field_text(self.id_field, id),
            IndexRecordOption::Basic,
        );

        let top_docs = searcher
            .search(&query, &TopDocs::with_limit(1))
            .map_err(|e| RagError::Search(e.to_string()))?;

        match top_docs.into_iter().next() {
            Some((_score, address)) => {
                let doc: TantivyDocument = searcher
                    .doc(address)
                    .map_err(|e| RagError::Search(e.to_string()))?;
                Ok(Some(self.to_product(&doc)))
            },
            None => Ok(None),
        }
    }

    pub fn doc_count(&self) -> u64 {
        self.reader.searcher().num_docs()
    }

    fn to_product(&self, doc: &TantivyDocument) -> Product {
        let text = |field: Field| -> Option<String> {
            match doc.get_first(field) {
                Some(OwnedValue::Str(s)) => Some(s.to_string()),
                _ => None,
            }
        };

        Product {
            id: text(self.id_field).unwrap_or_default(),
            name: text(self.name_field).unwrap_or_default(),
            description: text(self.description_field).unwrap_or_default(),
            price: text(self.price_field).unwrap_or_default(),
            category: text(self.category_field).unwrap_or_default(),
            image_url: text(self.image_field),
        }
    }
}

#[async_trait]
impl ProductIndex for CatalogIndex {
    async fn search(&self, query: &str, limit: usize) -> indic_commerce_core::Result<Vec<Product>> {
        Ok(self.search_products(query, limit)?)
    }

    async fn get(&self, id: &str) -> indic_commerce_core::Result<Option<Product>> {
        Ok(self.get_product(id)?)
    }

    fn len(&self) -> usize {
        self.doc_count() as usize
    }
}
