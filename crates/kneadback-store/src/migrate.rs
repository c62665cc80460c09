//! Startup schema reconciliation.
//!
//! Two steps run inside one transaction:
//!
//! 1. Versioned SQL migrations tracked in `kneadback_schema`.
//! 2. A column guard that compares `PRAGMA table_info(feedback)` with
//!    [`FEEDBACK_COLUMNS`]. Columns added after the initial schema are listed
//!    there with an additive default and get created with `ALTER TABLE ... ADD
//!    COLUMN`; nothing is ever dropped, renamed or retyped.
//!
//! Any mismatch the guard cannot repair additively is a [`StoreError::Migration`].

use crate::error::{Result, StoreError};
use rusqlite::{Connection, OptionalExtension, Transaction};
use tracing::info;

const MIGRATIONS: &[(&str, &str)] = &[(
    "001_init.sql",
    include_str!("../migrations/001_init.sql"),
)];

pub const FEEDBACK_TABLE: &str = "feedback";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Affinity {
    Integer,
    Text,
    Real,
    Numeric,
    Blob,
}

impl Affinity {
    /// SQLite's type-affinity rules applied to a declared column type.
    pub fn from_declared(declared: &str) -> Self {
        let upper = declared.to_ascii_uppercase();
        if upper.contains("INT") {
            Affinity::Integer
        } else if upper.contains("CHAR") || upper.contains("CLOB") || upper.contains("TEXT") {
            Affinity::Text
        } else if upper.contains("BLOB") || upper.trim().is_empty() {
            Affinity::Blob
        } else if upper.contains("REAL") || upper.contains("FLOA") || upper.contains("DOUB") {
            Affinity::Real
        } else {
            Affinity::Numeric
        }
    }

    fn sql_type(self) -> &'static str {
        match self {
            Affinity::Integer => "INTEGER",
            Affinity::Text => "TEXT",
            Affinity::Real => "REAL",
            Affinity::Numeric => "NUMERIC",
            Affinity::Blob => "BLOB",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ExpectedColumn {
    pub name: &'static str,
    pub affinity: Affinity,
    /// SQL literal used when the column has to be added to an existing table.
    /// `None` means the column cannot be back-filled safely.
    pub additive_default: Option<&'static str>,
}

const fn column(
    name: &'static str,
    affinity: Affinity,
    additive_default: Option<&'static str>,
) -> ExpectedColumn {
    ExpectedColumn {
        name,
        affinity,
        additive_default,
    }
}

pub const FEEDBACK_COLUMNS: &[ExpectedColumn] = &[
    column("id", Affinity::Integer, None),
    column("submitted_at", Affinity::Integer, None),
    column("user_id", Affinity::Text, Some("'guest'")),
    column("gender", Affinity::Text, Some("'undisclosed'")),
    column("age", Affinity::Integer, Some("0")),
    column("product_model", Affinity::Text, Some("''")),
    column("mode", Affinity::Text, None),
    column("intensity", Affinity::Integer, None),
    column("heat_enabled", Affinity::Integer, Some("0")),
    column("duration_minutes", Affinity::Integer, None),
    column("relax_score", Affinity::Integer, None),
    column("pain_relief_score", Affinity::Integer, None),
    column("noise_score", Affinity::Integer, None),
    column("heat_fit_score", Affinity::Integer, None),
    column("pain_areas", Affinity::Text, Some("''")),
    column("issues", Affinity::Text, Some("''")),
    column("nps", Affinity::Integer, None),
    column("notes", Affinity::Text, Some("''")),
    column("contact_allowed", Affinity::Integer, Some("0")),
    // Added after the initial schema.
    column("contact_phone", Affinity::Text, Some("''")),
    column("contact_email", Affinity::Text, Some("''")),
    column("usage_context", Affinity::Text, Some("''")),
];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationReport {
    pub from_version: i64,
    pub to_version: i64,
    pub added_columns: Vec<String>,
}

pub fn run_migrations(conn: &Connection) -> Result<MigrationReport> {
    let tx = conn.unchecked_transaction()?;
    ensure_schema_table(&tx)?;
    let current = current_version(&tx)?;

    if current > MIGRATIONS.len() as i64 {
        return Err(StoreError::Migration(format!(
            "db version {} newer than available migrations {}",
            current,
            MIGRATIONS.len()
        )));
    }

    for (index, (name, sql)) in MIGRATIONS.iter().enumerate() {
        let version = (index + 1) as i64;
        if current >= version {
            continue;
        }
        info!(migration = *name, version, "applying migration");
        tx.execute_batch(sql)?;
        set_version(&tx, version)?;
    }

    let added_columns = reconcile_columns(&tx, FEEDBACK_TABLE, FEEDBACK_COLUMNS)?;

    tx.commit()?;
    Ok(MigrationReport {
        from_version: current,
        to_version: MIGRATIONS.len() as i64,
        added_columns,
    })
}

pub fn schema_version(conn: &Connection) -> Result<i64> {
    let exists: Option<String> = conn
        .query_row(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name = 'kneadback_schema';",
            [],
            |row| row.get(0),
        )
        .optional()?;
    if exists.is_none() {
        return Ok(0);
    }
    let version: Option<i64> = conn
        .query_row("SELECT version FROM kneadback_schema LIMIT 1;", [], |row| {
            row.get(0)
        })
        .optional()?;
    Ok(version.unwrap_or(0))
}

/// Returns `(name, declared type)` for every column of `table`, in table order.
pub fn table_columns(conn: &Connection, table: &str) -> Result<Vec<(String, String)>> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    let mut columns = Vec::new();
    while let Some(row) = rows.next()? {
        let name: String = row.get(1)?;
        let declared: String = row.get(2)?;
        columns.push((name, declared));
    }
    Ok(columns)
}

fn reconcile_columns(
    tx: &Transaction<'_>,
    table: &str,
    expected: &[ExpectedColumn],
) -> Result<Vec<String>> {
    let existing = table_columns(tx, table)?;
    if existing.is_empty() {
        return Err(StoreError::Migration(format!("table {table} does not exist")));
    }

    let mut added = Vec::new();
    for column in expected {
        let found = existing
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(column.name));
        match found {
            Some((_, declared)) => {
                let actual = Affinity::from_declared(declared);
                if actual != column.affinity {
                    return Err(StoreError::Migration(format!(
                        "column {table}.{} is declared {:?} ({:?}), expected {:?}",
                        column.name, declared, actual, column.affinity
                    )));
                }
            }
            None => {
                let Some(default) = column.additive_default else {
                    return Err(StoreError::Migration(format!(
                        "column {table}.{} is missing and cannot be added with a default",
                        column.name
                    )));
                };
                tx.execute_batch(&format!(
                    "ALTER TABLE {table} ADD COLUMN {} {} NOT NULL DEFAULT {};",
                    column.name,
                    column.affinity.sql_type(),
                    default
                ))?;
                info!(table, column = column.name, "added missing column");
                added.push(column.name.to_string());
            }
        }
    }
    Ok(added)
}

fn ensure_schema_table(tx: &Transaction<'_>) -> Result<()> {
    tx.execute_batch("CREATE TABLE IF NOT EXISTS kneadback_schema (version INTEGER NOT NULL);")?;

    let existing: Option<i64> = tx
        .query_row(
            "SELECT version FROM kneadback_schema LIMIT 1;",
            [],
            |row| row.get(0),
        )
        .optional()?;

    if existing.is_none() {
        tx.execute("INSERT INTO kneadback_schema (version) VALUES (0);", [])?;
    }

    Ok(())
}

fn current_version(tx: &Transaction<'_>) -> Result<i64> {
    let version: i64 = tx.query_row(
        "SELECT version FROM kneadback_schema LIMIT 1;",
        [],
        |row| row.get(0),
    )?;
    Ok(version)
}

fn set_version(tx: &Transaction<'_>, version: i64) -> Result<()> {
    let updated = tx.execute("UPDATE kneadback_schema SET version = ?1;", [version])?;
    if updated != 1 {
        return Err(StoreError::Migration(format!(
            "expected single schema row, updated {}",
            updated
        )));
    }
    Ok(())
}
