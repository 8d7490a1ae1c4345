use std::str::FromStr;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use uuid::Uuid;

use super::{format_timestamp, parse_timestamp};
use crate::db::DatabaseError;
use crate::models::*;

const RECORD_SELECT: &str = "SELECT r.id, r.user_id, r.pill_id, r.image_url, r.recognized_text,
         r.confidence_score, r.taken_at, r.time_period, r.status, r.notes, r.created_at,
         r.pill_name, r.manufacturer, r.dosage,
         p.name, p.manufacturer, p.dosage, p.description
         FROM medication_records r
         LEFT JOIN pills p ON p.id = r.pill_id";

// Equal `taken_at` values fall back to insertion order, newest first.
const RECORD_ORDER: &str = "ORDER BY r.taken_at DESC, r.created_at DESC, r.rowid DESC";

pub fn insert_medication_record(
    conn: &Connection,
    record: &MedicationRecord,
) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO medication_records (id, user_id, pill_id, image_url, recognized_text,
         confidence_score, taken_at, time_period, status, notes, created_at, pill_name,
         manufacturer, dosage)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
        params![
            record.id.to_string(),
            record.user_id,
            record.pill_id.map(|id| id.to_string()),
            record.image_url,
            record.recognized_text,
            record.confidence_score,
            format_timestamp(&record.taken_at),
            record.time_period.as_str(),
            record.status.as_str(),
            record.notes,
            format_timestamp(&record.created_at),
            record.pill_name,
            record.manufacturer,
            record.dosage,
        ],
    )?;
    Ok(())
}

/// Records with `start <= taken_at < end`, newest first.
pub fn get_records_between(
    conn: &Connection,
    start: &DateTime<Utc>,
    end: &DateTime<Utc>,
) -> Result<Vec<RecordWithPill>, DatabaseError> {
    let sql = format!("{RECORD_SELECT} WHERE r.taken_at >= ?1 AND r.taken_at < ?2 {RECORD_ORDER}");
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(
        params![format_timestamp(start), format_timestamp(end)],
        record_row_from_rusqlite,
    )?;

    let mut records = Vec::new();
    for row in rows {
        records.push(record_from_row(row?)?);
    }
    Ok(records)
}

/// The `limit` most recent records, newest first.
pub fn get_recent_records(
    conn: &Connection,
    limit: usize,
) -> Result<Vec<RecordWithPill>, DatabaseError> {
    let limit = i64::try_from(limit).unwrap_or(i64::MAX);
    let sql = format!("{RECORD_SELECT} {RECORD_ORDER} LIMIT ?1");
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![limit], record_row_from_rusqlite)?;

    let mut records = Vec::new();
    for row in rows {
        records.push(record_from_row(row?)?);
    }
    Ok(records)
}

pub fn count_medication_records(conn: &Connection) -> Result<i64, DatabaseError> {
    let count = conn.query_row("SELECT COUNT(*) FROM medication_records", [], |row| row.get(0))?;
    Ok(count)
}

// Internal row type for MedicationRecord mapping
struct RecordRow {
    id: String,
    user_id: Option<String>,
    pill_id: Option<String>,
    image_url: Option<String>,
    recognized_text: Option<String>,
    confidence_score: Option<f32>,
    taken_at: String,
    time_period: String,
    status: String,
    notes: Option<String>,
    created_at: String,
    pill_name: String,
    manufacturer: Option<String>,
    dosage: Option<String>,
    joined_name: Option<String>,
    joined_manufacturer: Option<String>,
    joined_dosage: Option<String>,
    joined_description: Option<String>,
}

fn record_row_from_rusqlite(row: &rusqlite::Row<'_>) -> Result<RecordRow, rusqlite::Error> {
    Ok(RecordRow {
        id: row.get(0)?,
        user_id: row.get(1)?,
        pill_id: row.get(2)?,
        image_url: row.get(3)?,
        recognized_text: row.get(4)?,
        confidence_score: row.get(5)?,
        taken_at: row.get(6)?,
        time_period: row.get(7)?,
        status: row.get(8)?,
        notes: row.get(9)?,
        created_at: row.get(10)?,
        pill_name: row.get(11)?,
        manufacturer: row.get(12)?,
        dosage: row.get(13)?,
        joined_name: row.get(14)?,
        joined_manufacturer: row.get(15)?,
        joined_dosage: row.get(16)?,
        joined_description: row.get(17)?,
    })
}

fn record_from_row(row: RecordRow) -> Result<RecordWithPill, DatabaseError> {
    let pill = row.joined_name.map(|name| PillSummary {
        name,
        manufacturer: row.joined_manufacturer,
        dosage: row.joined_dosage,
        description: row.joined_description,
    });

    Ok(RecordWithPill {
        record: MedicationRecord {
            id: Uuid::parse_str(&row.id).map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?,
            user_id: row.user_id,
            pill_id: row.pill_id.and_then(|s| Uuid::parse_str(&s).ok()),
            image_url: row.image_url,
            recognized_text: row.recognized_text,
            confidence_score: row.confidence_score,
            taken_at: parse_timestamp(&row.taken_at, "taken_at")?,
            time_period: TimePeriod::from_str(&row.time_period)?,
            status: RecordStatus::from_str(&row.status)?,
            notes: row.notes,
            created_at: parse_timestamp(&row.created_at, "created_at")?,
            pill_name: row.pill_name,
            manufacturer: row.manufacturer,
            dosage: row.dosage,
        },
        pill,
    })
}
