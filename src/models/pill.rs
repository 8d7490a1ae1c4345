use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

/// A reference pill identity from the `pills` catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub generic_name: Option<String>,
    #[serde(default)]
    pub manufacturer: Option<String>,
    #[serde(default)]
    pub dosage: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub keywords: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// Catalog columns joined onto a medication record for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PillSummary {
    pub name: String,
    #[serde(default)]
    pub manufacturer: Option<String>,
    #[serde(default)]
    pub dosage: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl From<&CatalogEntry> for PillSummary {
    fn from(entry: &CatalogEntry) -> Self {
        Self {
            name: entry.name.clone(),
            manufacturer: entry.manufacturer.clone(),
            dosage: entry.dosage.clone(),
            description: entry.description.clone(),
        }
    }
}

// PostgREST returns `null` for an unset array column.
fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}
