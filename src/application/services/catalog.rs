//! Item catalog service
//!
//! Reads `[[item]]` tables from a TOML file and classifies them into a forest.

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::application::{ApplicationError, ApplicationResult, IoResultExt};
use crate::config::Settings;
use crate::domain::{BubbleItem, Forest, TreeClassifier};
use crate::infrastructure::traits::FileSystem;

/// On-disk catalog layout.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct CatalogFile {
    #[serde(default, rename = "item")]
    items: Vec<BubbleItem>,
}

/// Service for loading item catalogs and building forests from them.
pub struct CatalogService {
    fs: Arc<dyn FileSystem>,
}

impl CatalogService {
    /// Create a new catalog service.
    pub fn new(fs: Arc<dyn FileSystem>) -> Self {
        Self { fs }
    }

    /// Parse catalog content. `path` is only used for error messages.
    pub fn parse(content: &str, path: &Path) -> ApplicationResult<Vec<BubbleItem>> {
        let file: CatalogFile = toml::from_str(content).map_err(|e| ApplicationError::Catalog {
            path: path.to_path_buf(),
            message: e.message().to_string(),
        })?;
        Ok(file.items)
    }

    /// Serialize items back into catalog form.
    pub fn render(items: &[BubbleItem]) -> ApplicationResult<String> {
        let file = CatalogFile {
            items: items.to_vec(),
        };
        toml::to_string_pretty(&file).map_err(|e| ApplicationError::OperationFailed {
            context: "serialize catalog".to_string(),
            source: Box::new(e),
        })
    }

    /// Read and parse a catalog file.
    #[instrument(level = "debug", skip(self))]
    pub fn load(&self, path: &Path) -> ApplicationResult<Vec<BubbleItem>> {
        if !self.fs.is_file(path) {
            return Err(ApplicationError::CatalogNotFound(path.to_path_buf()));
        }
        let content = self
            .fs
            .read_to_string(path)
            .with_path_context("read catalog", path)?;
        let items = Self::parse(&content, path)?;
        debug!("load: {} items from {}", items.len(), path.display());
        Ok(items)
    }

    /// Load a catalog and classify it with the policy and order from `settings`.
    #[instrument(level = "debug", skip(self, settings))]
    pub fn build_forest(&self, path: &Path, settings: &Settings) -> ApplicationResult<Forest<BubbleItem>> {
        let items = self.load(path)?;
        let classifier = TreeClassifier::new()
            .with_policy(settings.unresolved)
            .with_order(settings.order);
        debug!(policy = ?classifier.policy(), order = %classifier.order(), "build_forest");
        Ok(classifier.classify(items)?)
    }
}
