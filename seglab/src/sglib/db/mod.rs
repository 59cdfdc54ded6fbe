use std::path::Path;

use rusqlite::{params, Connection, OptionalExtension};
use tracing::{info, warn};

use seglab_domain::{slerr, to_sl, SlResult};

use crate::shape::ShapeRecord;

mod schema;

pub use schema::{class_column, decode_shape_list, encode_shape_list, SHAPE_LIST_VERSION};
use schema::{class_columns, SCHEMA};

fn is_unique_violation(e: &rusqlite::Error) -> bool {
    matches!(
        e,
        rusqlite::Error::SqliteFailure(err, _)
            if err.code == rusqlite::ErrorCode::ConstraintViolation
    )
}

/// The annotation store. Maps image paths to shape lists and notes and keeps
/// one integer column per discovered class on the labels table so that
/// "which images contain class X" is a plain indexed query instead of a scan
/// over serialized shape lists. All I/O is blocking and synchronous,
/// single-writer single-reader usage is assumed.
pub struct AnnotationDb {
    conn: Connection,
}

impl AnnotationDb {
    pub fn open<P: AsRef<Path>>(path: P) -> SlResult<Self> {
        let conn = Connection::open(path.as_ref())
            .map_err(|e| slerr!("could not open database {:?} due to {:?}", path.as_ref(), e))?;
        Self::from_connection(conn)
    }

    pub fn open_in_memory() -> SlResult<Self> {
        Self::from_connection(Connection::open_in_memory().map_err(to_sl)?)
    }

    fn from_connection(conn: Connection) -> SlResult<Self> {
        conn.execute_batch(SCHEMA).map_err(to_sl)?;
        Ok(Self { conn })
    }

    /// Class names in registration order.
    pub fn classes(&self) -> SlResult<Vec<String>> {
        Ok(class_columns(&self.conn)?
            .into_iter()
            .map(|(class_name, _)| class_name)
            .collect())
    }

    /// Register a class and grow its column onto the labels table. Idempotent,
    /// the registry decides whether the ALTER runs. Returns the column name.
    pub fn ensure_class(&mut self, class_name: &str) -> SlResult<String> {
        let column = class_column(class_name)?;
        let registered: Option<String> = self
            .conn
            .query_row(
                "SELECT column_name FROM label_classes WHERE class_name = ?1",
                [class_name],
                |row| row.get(0),
            )
            .optional()
            .map_err(to_sl)?;
        if let Some(registered) = registered {
            return Ok(registered);
        }
        let clash: Option<String> = self
            .conn
            .query_row(
                "SELECT class_name FROM label_classes WHERE column_name = ?1",
                [&column],
                |row| row.get(0),
            )
            .optional()
            .map_err(to_sl)?;
        if let Some(clash) = clash {
            return Err(slerr!(
                "classes {:?} and {:?} would share the column {}",
                class_name,
                clash,
                column
            ));
        }
        let tx = self.conn.transaction().map_err(to_sl)?;
        tx.execute(
            "INSERT INTO label_classes (class_name, column_name) VALUES (?1, ?2)",
            params![class_name, column],
        )
        .map_err(to_sl)?;
        tx.execute_batch(&format!(
            "ALTER TABLE labels ADD COLUMN {column} INTEGER NOT NULL DEFAULT 0"
        ))
        .map_err(to_sl)?;
        tx.commit().map_err(to_sl)?;
        info!("added column {column} for class {class_name:?}");
        Ok(column)
    }

    /// Insert or replace the shape list of an image. The class columns of the
    /// row are recomputed from the new list in the same transaction, they
    /// never disagree with the stored records.
    pub fn set_labels(&mut self, image_path: &str, records: &[ShapeRecord]) -> SlResult<()> {
        for record in records {
            self.ensure_class(&record.label)?;
        }
        let blob = encode_shape_list(records)?;
        let tx = self.conn.transaction().map_err(to_sl)?;
        tx.execute(
            "INSERT INTO labels (image_path, shape_list) VALUES (?1, ?2) \
             ON CONFLICT (image_path) DO UPDATE SET shape_list = excluded.shape_list",
            params![image_path, blob],
        )
        .map_err(to_sl)?;
        for (class_name, column) in class_columns(&tx)? {
            let present = records.iter().any(|r| r.label == class_name);
            tx.execute(
                &format!("UPDATE labels SET {column} = ?1 WHERE image_path = ?2"),
                params![i64::from(present), image_path],
            )
            .map_err(to_sl)?;
        }
        tx.commit().map_err(to_sl)
    }

    /// Stored shape list of an image, empty if the image has no row yet.
    pub fn get_labels(&self, image_path: &str) -> SlResult<Vec<ShapeRecord>> {
        let blob: Option<String> = self
            .conn
            .query_row(
                "SELECT shape_list FROM labels WHERE image_path = ?1",
                [image_path],
                |row| row.get(0),
            )
            .optional()
            .map_err(to_sl)?;
        match blob {
            Some(blob) => decode_shape_list(&blob),
            None => Ok(vec![]),
        }
    }

    /// All labeled image paths.
    pub fn labeled_images(&self) -> SlResult<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT image_path FROM labels ORDER BY image_path")
            .map_err(to_sl)?;
        let rows = stmt.query_map([], |row| row.get(0)).map_err(to_sl)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(to_sl)
    }

    /// Images containing at least one shape of any of the given classes.
    /// Classes the store has never seen contribute nothing.
    pub fn images_with_classes(&self, classes: &[&str]) -> SlResult<Vec<String>> {
        let known = class_columns(&self.conn)?;
        let columns = classes
            .iter()
            .filter_map(|class| {
                known
                    .iter()
                    .find(|(class_name, _)| class_name == class)
                    .map(|(_, column)| column.as_str())
            })
            .collect::<Vec<_>>();
        if columns.is_empty() {
            return Ok(vec![]);
        }
        let clause = columns
            .iter()
            .map(|column| format!("{column} > 0"))
            .collect::<Vec<_>>()
            .join(" OR ");
        let mut stmt = self
            .conn
            .prepare(&format!(
                "SELECT image_path FROM labels WHERE {clause} ORDER BY image_path"
            ))
            .map_err(to_sl)?;
        let rows = stmt.query_map([], |row| row.get(0)).map_err(to_sl)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(to_sl)
    }

    /// Classes appearing in an image's shape list, in first-appearance order.
    pub fn classes_of_image(&self, image_path: &str) -> SlResult<Vec<String>> {
        let records = self.get_labels(image_path)?;
        let mut classes: Vec<String> = vec![];
        for record in records {
            if !classes.contains(&record.label) {
                classes.push(record.label);
            }
        }
        Ok(classes)
    }

    pub fn get_notes(&self, image_path: &str) -> SlResult<String> {
        let notes: Option<String> = self
            .conn
            .query_row(
                "SELECT notes FROM labels WHERE image_path = ?1",
                [image_path],
                |row| row.get(0),
            )
            .optional()
            .map_err(to_sl)?;
        Ok(notes.unwrap_or_default())
    }

    /// Notes can exist before any shape does, a missing row is created with
    /// an empty shape list.
    pub fn set_notes(&mut self, image_path: &str, notes: &str) -> SlResult<()> {
        let empty = encode_shape_list(&[])?;
        self.conn
            .execute(
                "INSERT INTO labels (image_path, shape_list, notes) VALUES (?1, ?2, ?3) \
                 ON CONFLICT (image_path) DO UPDATE SET notes = excluded.notes",
                params![image_path, empty, notes],
            )
            .map_err(to_sl)?;
        Ok(())
    }

    /// Rename a class. Column, registry and the labels stored in every shape
    /// list are rewritten together, a rename cannot leave the flags and the
    /// records disagreeing.
    pub fn rename_class(&mut self, old: &str, new: &str) -> SlResult<()> {
        let new_column = class_column(new)?;
        let old_column: String = self
            .conn
            .query_row(
                "SELECT column_name FROM label_classes WHERE class_name = ?1",
                [old],
                |row| row.get(0),
            )
            .optional()
            .map_err(to_sl)?
            .ok_or_else(|| slerr!("no class {:?} to rename", old))?;
        let tx = self.conn.transaction().map_err(to_sl)?;
        tx.execute(
            "UPDATE label_classes SET class_name = ?1, column_name = ?2 WHERE class_name = ?3",
            params![new, new_column, old],
        )
        .map_err(|e| {
            if is_unique_violation(&e) {
                slerr!("cannot rename class {:?}, {:?} already exists", old, new)
            } else {
                to_sl(e)
            }
        })?;
        if new_column != old_column {
            tx.execute_batch(&format!(
                "ALTER TABLE labels RENAME COLUMN {old_column} TO {new_column}"
            ))
            .map_err(to_sl)?;
        }
        let rows = {
            let mut stmt = tx
                .prepare("SELECT id, shape_list FROM labels")
                .map_err(to_sl)?;
            let rows = stmt
                .query_map([], |row| Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?)))
                .map_err(to_sl)?;
            rows.collect::<Result<Vec<_>, _>>().map_err(to_sl)?
        };
        for (id, blob) in rows {
            let mut records = decode_shape_list(&blob)?;
            let mut changed = false;
            for record in &mut records {
                if record.label == old {
                    record.label = new.to_string();
                    changed = true;
                }
            }
            if changed {
                tx.execute(
                    "UPDATE labels SET shape_list = ?1 WHERE id = ?2",
                    params![encode_shape_list(&records)?, id],
                )
                .map_err(to_sl)?;
            }
        }
        tx.commit().map_err(to_sl)?;
        info!("renamed class {old:?} to {new:?}");
        Ok(())
    }

    /// Zero a class column for every image. The stored shape lists keep their
    /// records, this only resets the flags, e.g. before a bulk re-import.
    pub fn clear_class(&mut self, class_name: &str) -> SlResult<()> {
        let column: String = self
            .conn
            .query_row(
                "SELECT column_name FROM label_classes WHERE class_name = ?1",
                [class_name],
                |row| row.get(0),
            )
            .optional()
            .map_err(to_sl)?
            .ok_or_else(|| slerr!("no class {:?} to clear", class_name))?;
        self.conn
            .execute(&format!("UPDATE labels SET {column} = 0"), [])
            .map_err(to_sl)?;
        Ok(())
    }

    /// Record where a video was converted to. `false` with a logged warning
    /// if the origin is already known.
    pub fn add_video(&self, origin: &str, dest: &str, duration: f64) -> SlResult<bool> {
        match self.conn.execute(
            "INSERT INTO videos (origin, dest, duration) VALUES (?1, ?2, ?3)",
            params![origin, dest, duration],
        ) {
            Ok(_) => Ok(true),
            Err(e) if is_unique_violation(&e) => {
                warn!("duplicate video with origin {origin:?}, skipping");
                Ok(false)
            }
            Err(e) => Err(to_sl(e)),
        }
    }

    /// Record which frame of which video an image was sampled from. `false`
    /// with a logged warning if the frame was already converted.
    pub fn add_image(&self, video_path: &str, image_path: &str, frame_num: u32) -> SlResult<bool> {
        match self.conn.execute(
            "INSERT INTO images (video_path, image_path, frame_num) VALUES (?1, ?2, ?3)",
            params![video_path, image_path, frame_num],
        ) {
            Ok(_) => Ok(true),
            Err(e) if is_unique_violation(&e) => {
                warn!("({video_path:?}, {frame_num}) already converted, skipping");
                Ok(false)
            }
            Err(e) => Err(to_sl(e)),
        }
    }

    /// `(frame_num, image_path)` of all frames sampled from a video.
    pub fn video_images(&self, video_path: &str) -> SlResult<Vec<(u32, String)>> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT frame_num, image_path FROM images WHERE video_path = ?1 \
                 ORDER BY frame_num",
            )
            .map_err(to_sl)?;
        let rows = stmt
            .query_map([video_path], |row| Ok((row.get(0)?, row.get(1)?)))
            .map_err(to_sl)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(to_sl)
    }

    pub fn video_duration(&self, origin: &str) -> SlResult<Option<f64>> {
        self.conn
            .query_row(
                "SELECT duration FROM videos WHERE origin = ?1",
                [origin],
                |row| row.get(0),
            )
            .optional()
            .map_err(to_sl)
    }

    pub fn table_names(&self) -> SlResult<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT name FROM sqlite_master WHERE type = 'table' \
                 AND name NOT LIKE 'sqlite_%' ORDER BY name",
            )
            .map_err(to_sl)?;
        let rows = stmt.query_map([], |row| row.get(0)).map_err(to_sl)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(to_sl)
    }

    pub fn num_entries(&self, table: &str) -> SlResult<u64> {
        let names = self.table_names()?;
        if !names.iter().any(|name| name == table) {
            return Err(slerr!(
                "accessing wrong table {:?}, available tables are {:?}",
                table,
                names
            ));
        }
        self.conn
            .query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| {
                row.get::<_, i64>(0)
            })
            .map(|n| n as u64)
            .map_err(to_sl)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shape::ShapeKind;
    use std::collections::HashMap;

    fn record(label: &str, kind: ShapeKind) -> ShapeRecord {
        ShapeRecord {
            label: label.to_string(),
            shape_type: kind,
            points: vec![[0.0, 0.0], [10.0, 10.0]],
            flags: HashMap::new(),
            group_id: None,
        }
    }

    #[test]
    fn labels_roundtrip() {
        let mut db = AnnotationDb::open_in_memory().unwrap();
        assert!(db.get_labels("images/a.png").unwrap().is_empty());
        let records = vec![
            record("tumour", ShapeKind::Polygon),
            record("scar", ShapeKind::Rectangle),
        ];
        db.set_labels("images/a.png", &records).unwrap();
        assert_eq!(db.get_labels("images/a.png").unwrap(), records);
        assert_eq!(db.labeled_images().unwrap(), vec!["images/a.png"]);
        assert_eq!(
            db.classes_of_image("images/a.png").unwrap(),
            vec!["tumour", "scar"]
        );
        assert_eq!(db.classes().unwrap(), vec!["tumour", "scar"]);
    }

    #[test]
    fn class_columns_follow_the_shape_list() {
        let mut db = AnnotationDb::open_in_memory().unwrap();
        db.set_labels("images/a.png", &[record("tumour", ShapeKind::Polygon)])
            .unwrap();
        db.set_labels("images/b.png", &[record("scar", ShapeKind::Trace)])
            .unwrap();
        // labeling b must not affect a
        assert_eq!(db.images_with_classes(&["tumour"]).unwrap(), vec!["images/a.png"]);
        assert_eq!(db.images_with_classes(&["scar"]).unwrap(), vec!["images/b.png"]);
        assert_eq!(
            db.images_with_classes(&["tumour", "scar"]).unwrap(),
            vec!["images/a.png", "images/b.png"]
        );
        // unknown classes contribute nothing
        assert!(db.images_with_classes(&["bubbles"]).unwrap().is_empty());
        // replacing the list recomputes the columns
        db.set_labels("images/a.png", &[record("scar", ShapeKind::Circle)])
            .unwrap();
        assert!(db.images_with_classes(&["tumour"]).unwrap().is_empty());
        assert_eq!(
            db.images_with_classes(&["scar"]).unwrap(),
            vec!["images/a.png", "images/b.png"]
        );
    }

    #[test]
    fn ensure_class_is_idempotent() {
        let mut db = AnnotationDb::open_in_memory().unwrap();
        let col1 = db.ensure_class("bladder entrance").unwrap();
        let col2 = db.ensure_class("bladder entrance").unwrap();
        assert_eq!(col1, col2);
        assert_eq!(col1, "class_bladder_entrance");
        assert_eq!(db.classes().unwrap(), vec!["bladder entrance"]);
        // a different class colliding on the sanitized column is refused
        assert!(db.ensure_class("bladder-entrance").is_err());
    }

    #[test]
    fn notes() {
        let mut db = AnnotationDb::open_in_memory().unwrap();
        assert_eq!(db.get_notes("images/a.png").unwrap(), "");
        db.set_notes("images/a.png", "blurry frame").unwrap();
        assert_eq!(db.get_notes("images/a.png").unwrap(), "blurry frame");
        // shapes arriving later keep the notes
        db.set_labels("images/a.png", &[record("urine", ShapeKind::Trace)])
            .unwrap();
        assert_eq!(db.get_notes("images/a.png").unwrap(), "blurry frame");
        db.set_notes("images/a.png", "").unwrap();
        assert_eq!(db.get_notes("images/a.png").unwrap(), "");
    }

    #[test]
    fn rename_class_keeps_records_consistent() {
        let mut db = AnnotationDb::open_in_memory().unwrap();
        db.set_labels("images/a.png", &[record("tumor", ShapeKind::Polygon)])
            .unwrap();
        db.rename_class("tumor", "tumour").unwrap();
        assert_eq!(db.classes().unwrap(), vec!["tumour"]);
        assert_eq!(db.get_labels("images/a.png").unwrap()[0].label, "tumour");
        assert_eq!(db.images_with_classes(&["tumour"]).unwrap(), vec!["images/a.png"]);
        assert!(db.images_with_classes(&["tumor"]).unwrap().is_empty());
        assert!(db.rename_class("tumor", "whatever").is_err());
    }

    #[test]
    fn clear_class_resets_flags_only() {
        let mut db = AnnotationDb::open_in_memory().unwrap();
        db.set_labels("images/a.png", &[record("instrument", ShapeKind::Lines)])
            .unwrap();
        db.clear_class("instrument").unwrap();
        assert!(db.images_with_classes(&["instrument"]).unwrap().is_empty());
        assert_eq!(db.get_labels("images/a.png").unwrap().len(), 1);
        assert!(db.clear_class("unknown").is_err());
    }

    #[test]
    fn video_and_image_provenance() {
        let db = AnnotationDb::open_in_memory().unwrap();
        assert!(db.add_video("videos/v1.mp4", "frames/v1", 120.5).unwrap());
        assert!(!db.add_video("videos/v1.mp4", "elsewhere", 1.0).unwrap());
        assert_eq!(db.video_duration("videos/v1.mp4").unwrap(), Some(120.5));
        assert_eq!(db.video_duration("videos/v2.mp4").unwrap(), None);

        assert!(db.add_image("videos/v1.mp4", "frames/v1/0002.png", 2).unwrap());
        assert!(db.add_image("videos/v1.mp4", "frames/v1/0001.png", 1).unwrap());
        assert!(!db.add_image("videos/v1.mp4", "frames/v1/again.png", 1).unwrap());
        assert_eq!(
            db.video_images("videos/v1.mp4").unwrap(),
            vec![
                (1, "frames/v1/0001.png".to_string()),
                (2, "frames/v1/0002.png".to_string()),
            ]
        );
    }

    #[test]
    fn table_inventory() {
        let db = AnnotationDb::open_in_memory().unwrap();
        let names = db.table_names().unwrap();
        for expected in ["labels", "videos", "images", "label_classes"] {
            assert!(names.iter().any(|n| n == expected), "{expected} missing");
        }
        assert_eq!(db.num_entries("labels").unwrap(), 0);
        assert!(db.num_entries("nonexistent").is_err());
    }
}
