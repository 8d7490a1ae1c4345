use std::sync::Arc;

use crate::db::CatalogStore;
use crate::models::{CatalogEntry, ExtractedAttributes};

/// Reconciles extracted attributes against the reference catalog.
///
/// Fails soft: a catalog error is logged and treated as no match so that
/// recognition can continue with the extracted attributes alone.
#[derive(Clone)]
pub struct CatalogMatcher {
    catalog: Arc<dyn CatalogStore>,
}

impl CatalogMatcher {
    pub fn new(catalog: Arc<dyn CatalogStore>) -> Self {
        Self { catalog }
    }

    /// First catalog entry whose name contains the extracted name, or whose
    /// keywords include it. No query is issued without a name.
    pub async fn match_pill(&self, attributes: &ExtractedAttributes) -> Option<CatalogEntry> {
        let name = attributes
            .pill_name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())?;

        match self.catalog.search_pills(name).await {
            Ok(entries) => {
                let matched = entries.into_iter().next();
                match &matched {
                    Some(entry) => tracing::info!(
                        pill_name = name,
                        matched = %entry.name,
                        "Catalog match found"
                    ),
                    None => tracing::debug!(pill_name = name, "No catalog match"),
                }
                matched
            }
            Err(e) => {
                tracing::warn!(pill_name = name, error = %e, "Catalog search failed; continuing without match");
                None
            }
        }
    }
}
