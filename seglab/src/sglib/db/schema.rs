use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use seglab_domain::{slerr, to_sl, SlResult};

use crate::shape::ShapeRecord;

/// Definition of the annotation store's fixed tables.
pub(super) static SCHEMA: &str = include_str!("schema.sql");

pub const SHAPE_LIST_VERSION: u32 = 1;

/// Envelope written into the `shape_list` column. The version allows record
/// layout changes without guessing at load time.
#[derive(Serialize, Deserialize)]
struct ShapeListEnvelope {
    version: u32,
    shapes: Vec<ShapeRecord>,
}

pub fn encode_shape_list(records: &[ShapeRecord]) -> SlResult<String> {
    serde_json::to_string(&ShapeListEnvelope {
        version: SHAPE_LIST_VERSION,
        shapes: records.to_vec(),
    })
    .map_err(to_sl)
}

pub fn decode_shape_list(raw: &str) -> SlResult<Vec<ShapeRecord>> {
    let envelope: ShapeListEnvelope = serde_json::from_str(raw).map_err(to_sl)?;
    if envelope.version > SHAPE_LIST_VERSION {
        Err(slerr!(
            "cannot read shape list of version {}, newest known is {}",
            envelope.version,
            SHAPE_LIST_VERSION
        ))
    } else {
        Ok(envelope.shapes)
    }
}

/// Column name a class maps to. Class names are user input, only a
/// conservative alphabet survives into the identifier.
pub fn class_column(class_name: &str) -> SlResult<String> {
    let sanitized = class_name
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect::<String>();
    if sanitized.chars().any(|c| c.is_ascii_alphanumeric()) {
        Ok(format!("class_{sanitized}"))
    } else {
        Err(slerr!(
            "cannot derive a column name from class {:?}",
            class_name
        ))
    }
}

/// `(class_name, column_name)` pairs in registration order.
pub(super) fn class_columns(conn: &Connection) -> SlResult<Vec<(String, String)>> {
    let mut stmt = conn
        .prepare("SELECT class_name, column_name FROM label_classes ORDER BY id")
        .map_err(to_sl)?;
    let rows = stmt
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))
        .map_err(to_sl)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(to_sl)
}
