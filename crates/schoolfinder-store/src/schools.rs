use chrono::Utc;
use rusqlite::{params, OptionalExtension};
use tracing::{info, instrument};

use schoolfinder_core::{School, SchoolId};

use crate::database::Database;
use crate::error::StoreError;
use crate::row_helpers::{self, contains_pattern};

const SEEDED_AT: &str = "seeded_at";

/// SQLite integers are signed; values past `i64::MAX` clamp instead of wrapping.
fn sql_int(n: usize) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

/// Ordered school catalog. Position is the insertion order of the last
/// `replace_all` and is what offset paging walks.
#[derive(Clone)]
pub struct SchoolRepo {
    db: Database,
}

impl SchoolRepo {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Replace the whole catalog atomically. Duplicate ids abort the
    /// replacement with `Conflict` and leave the previous catalog intact.
    #[instrument(skip(self, schools), fields(count = schools.len()))]
    pub fn replace_all(&self, schools: &[School]) -> Result<usize, StoreError> {
        self.db.with_conn(|conn| {
            let tx = conn.transaction()?;
            tx.execute("DELETE FROM schools", [])?;
            {
                let mut stmt = tx.prepare(
                    "INSERT INTO schools (position, id, name, lga, payload) VALUES (?1, ?2, ?3, ?4, ?5)",
                )?;
                for (position, school) in schools.iter().enumerate() {
                    let payload = serde_json::to_string(school)?;
                    stmt.execute(params![
                        position as i64,
                        school.id.as_str(),
                        school.name,
                        school.address.lga,
                        payload
                    ])?;
                }
            }
            tx.execute(
                "INSERT INTO catalog_meta (key, value) VALUES (?1, ?2)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value",
                params![SEEDED_AT, Utc::now().to_rfc3339()],
            )?;
            tx.commit()?;
            info!(count = schools.len(), "catalog replaced");
            Ok(schools.len())
        })
    }

    pub fn count(&self) -> Result<usize, StoreError> {
        self.db.with_conn(|conn| {
            let n: i64 = conn.query_row("SELECT COUNT(*) FROM schools", [], |row| row.get(0))?;
            Ok(n as usize)
        })
    }

    /// Records `[offset, offset + limit)` in catalog order.
    pub fn page(&self, offset: usize, limit: usize) -> Result<Vec<School>, StoreError> {
        self.db.with_conn(|conn| {
            let mut stmt =
                conn.prepare("SELECT payload FROM schools ORDER BY position LIMIT ?1 OFFSET ?2")?;
            let raw = stmt
                .query_map(params![sql_int(limit), sql_int(offset)], |row| row.get::<_, String>(0))?
                .collect::<Result<Vec<_>, _>>()?;
            raw.iter()
                .map(|payload| row_helpers::parse_school(payload, "schools", "payload"))
                .collect()
        })
    }

    /// Like [`page`](Self::page), restricted to records whose name or
    /// locality contains `query` (case-insensitive).
    pub fn search(&self, query: &str, offset: usize, limit: usize) -> Result<Vec<School>, StoreError> {
        let pattern = contains_pattern(query);
        self.db.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT payload FROM schools
                 WHERE lower(name) LIKE ?1 ESCAPE '\\' OR lower(lga) LIKE ?1 ESCAPE '\\'
                 ORDER BY position LIMIT ?2 OFFSET ?3",
            )?;
            let raw = stmt
                .query_map(params![pattern, sql_int(limit), sql_int(offset)], |row| {
                    row.get::<_, String>(0)
                })?
                .collect::<Result<Vec<_>, _>>()?;
            raw.iter()
                .map(|payload| row_helpers::parse_school(payload, "schools", "payload"))
                .collect()
        })
    }

    pub fn count_matching(&self, query: &str) -> Result<usize, StoreError> {
        let pattern = contains_pattern(query);
        self.db.with_conn(|conn| {
            let n: i64 = conn.query_row(
                "SELECT COUNT(*) FROM schools
                 WHERE lower(name) LIKE ?1 ESCAPE '\\' OR lower(lga) LIKE ?1 ESCAPE '\\'",
                [pattern],
                |row| row.get(0),
            )?;
            Ok(n as usize)
        })
    }

    #[instrument(skip(self), fields(school_id = %id))]
    pub fn get(&self, id: &SchoolId) -> Result<School, StoreError> {
        self.db.with_conn(|conn| {
            let payload: Option<String> = conn
                .query_row(
                    "SELECT payload FROM schools WHERE id = ?1",
                    [id.as_str()],
                    |row| row.get::<_, String>(0),
                )
                .optional()?;
            match payload {
                Some(raw) => row_helpers::parse_school(&raw, "schools", "payload"),
                None => Err(StoreError::NotFound(format!("school {id}"))),
            }
        })
    }

    /// When the catalog was last replaced (RFC 3339), if ever.
    pub fn seeded_at(&self) -> Result<Option<String>, StoreError> {
        self.db.with_conn(|conn| {
            conn.query_row(
                "SELECT value FROM catalog_meta WHERE key = ?1",
                [SEEDED_AT],
                |row| row.get(0),
            )
            .optional()
            .map_err(StoreError::from)
        })
    }
}
