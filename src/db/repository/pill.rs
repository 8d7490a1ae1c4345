use rusqlite::{params, Connection};
use uuid::Uuid;

use super::{format_timestamp, parse_timestamp};
use crate::db::DatabaseError;
use crate::models::CatalogEntry;

const PILL_COLUMNS: &str = "id, name, generic_name, manufacturer, dosage, description, image_url, keywords, created_at";

pub fn insert_pill(conn: &Connection, pill: &CatalogEntry) -> Result<(), DatabaseError> {
    let keywords = serde_json::to_string(&pill.keywords)
        .map_err(|e| DatabaseError::ConstraintViolation(format!("keywords: {e}")))?;
    conn.execute(
        "INSERT INTO pills (id, name, generic_name, manufacturer, dosage, description, image_url,
         keywords, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            pill.id.to_string(),
            pill.name,
            pill.generic_name,
            pill.manufacturer,
            pill.dosage,
            pill.description,
            pill.image_url,
            keywords,
            format_timestamp(&pill.created_at),
        ],
    )?;
    Ok(())
}

pub fn get_pill(conn: &Connection, id: &Uuid) -> Result<Option<CatalogEntry>, DatabaseError> {
    let sql = format!("SELECT {PILL_COLUMNS} FROM pills WHERE id = ?1");
    let mut stmt = conn.prepare(&sql)?;
    let result = stmt.query_row(params![id.to_string()], pill_row_from_rusqlite);

    match result {
        Ok(row) => Ok(Some(pill_from_row(row)?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Catalog entries whose name contains `term` (case-insensitive) or whose
/// keyword list contains `term` exactly. Insertion order.
pub fn search_pills(conn: &Connection, term: &str) -> Result<Vec<CatalogEntry>, DatabaseError> {
    let sql = format!(
        "SELECT {PILL_COLUMNS} FROM pills
         WHERE instr(lower(name), lower(?1)) > 0
            OR EXISTS (SELECT 1 FROM json_each(pills.keywords) WHERE json_each.value = ?1)
         ORDER BY rowid"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![term], pill_row_from_rusqlite)?;

    let mut pills = Vec::new();
    for row in rows {
        pills.push(pill_from_row(row?)?);
    }
    Ok(pills)
}

// Internal row type for CatalogEntry mapping
struct PillRow {
    id: String,
    name: String,
    generic_name: Option<String>,
    manufacturer: Option<String>,
    dosage: Option<String>,
    description: Option<String>,
    image_url: Option<String>,
    keywords: String,
    created_at: String,
}

fn pill_row_from_rusqlite(row: &rusqlite::Row<'_>) -> Result<PillRow, rusqlite::Error> {
    Ok(PillRow {
        id: row.get(0)?,
        name: row.get(1)?,
        generic_name: row.get(2)?,
        manufacturer: row.get(3)?,
        dosage: row.get(4)?,
        description: row.get(5)?,
        image_url: row.get(6)?,
        keywords: row.get(7)?,
        created_at: row.get(8)?,
    })
}

fn pill_from_row(row: PillRow) -> Result<CatalogEntry, DatabaseError> {
    Ok(CatalogEntry {
        id: Uuid::parse_str(&row.id).map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?,
        name: row.name,
        generic_name: row.generic_name,
        manufacturer: row.manufacturer,
        dosage: row.dosage,
        description: row.description,
        image_url: row.image_url,
        keywords: serde_json::from_str(&row.keywords)
            .map_err(|e| DatabaseError::ConstraintViolation(format!("keywords: {e}")))?,
        created_at: parse_timestamp(&row.created_at, "created_at")?,
    })
}
