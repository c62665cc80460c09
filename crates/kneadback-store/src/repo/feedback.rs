use crate::error::{Result, StoreError};
use kneadback_core::domain::{
    ContactPreference, Demographic, FeedbackId, FeedbackRecord, Gender, NewFeedback, Ratings,
    Usage, UsageMode,
};
use kneadback_core::dto::Insights;
use kneadback_core::rules::round_average;
use rusqlite::{params, Connection};
use std::str::FromStr;

const SELECT_COLUMNS: &str = "id, submitted_at, user_id, gender, age, product_model,
    mode, intensity, heat_enabled, duration_minutes, usage_context,
    relax_score, pain_relief_score, noise_score, heat_fit_score,
    pain_areas, issues, nps, notes,
    contact_allowed, contact_phone, contact_email";

pub struct FeedbackRepo<'a> {
    conn: &'a Connection,
}

impl<'a> FeedbackRepo<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Inserts one record and reads it back inside the same transaction, so
    /// the returned value is exactly what was stored.
    pub fn create(&self, now_utc: i64, input: &NewFeedback) -> Result<FeedbackRecord> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "INSERT INTO feedback (
                submitted_at, user_id, gender, age, product_model,
                mode, intensity, heat_enabled, duration_minutes, usage_context,
                relax_score, pain_relief_score, noise_score, heat_fit_score,
                pain_areas, issues, nps, notes,
                contact_allowed, contact_phone, contact_email
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15,
                       ?16, ?17, ?18, ?19, ?20, ?21);",
            params![
                now_utc,
                input.user_id,
                input.demographic.gender.as_str(),
                input.demographic.age,
                input.product_model,
                input.usage.mode.as_str(),
                input.usage.intensity,
                input.usage.heat_enabled,
                input.usage.duration_minutes,
                input.usage.context,
                input.ratings.relax,
                input.ratings.pain_relief,
                input.ratings.noise,
                input.ratings.heat_fit,
                input.pain_areas,
                input.issues,
                input.nps,
                input.notes,
                input.contact.allowed,
                input.contact.phone,
                input.contact.email,
            ],
        )?;
        let id = tx.last_insert_rowid();
        let record = get_inner(&tx, id)?.ok_or_else(|| StoreError::CorruptRow {
            id,
            reason: "inserted row not readable".to_string(),
        })?;
        tx.commit()?;
        Ok(record)
    }

    pub fn get(&self, id: FeedbackId) -> Result<Option<FeedbackRecord>> {
        get_inner(self.conn, id.get())
    }

    /// Newest first. `limit` is clamped to at least one row.
    pub fn list_recent(&self, limit: i64) -> Result<Vec<FeedbackRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {SELECT_COLUMNS} FROM feedback ORDER BY id DESC LIMIT ?1;"
        ))?;
        let mut rows = stmt.query([limit.max(1)])?;
        let mut items = Vec::new();
        while let Some(row) = rows.next()? {
            items.push(feedback_from_row(row)?);
        }
        Ok(items)
    }

    pub fn count(&self) -> Result<i64> {
        let count = self
            .conn
            .query_row("SELECT COUNT(*) FROM feedback;", [], |row| row.get(0))?;
        Ok(count)
    }

    pub fn insights(&self) -> Result<Insights> {
        let (count, average): (i64, Option<f64>) = self.conn.query_row(
            "SELECT COUNT(*), AVG(nps) FROM feedback;",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;
        Ok(Insights {
            count,
            average_nps: round_average(average),
            top_issue: None,
        })
    }

    /// Trivial round trip used by health checks.
    pub fn ping(&self) -> Result<()> {
        let one: i64 = self.conn.query_row("SELECT 1;", [], |row| row.get(0))?;
        if one != 1 {
            return Err(StoreError::CorruptRow {
                id: 0,
                reason: format!("SELECT 1 returned {one}"),
            });
        }
        Ok(())
    }
}

fn get_inner(conn: &Connection, id: i64) -> Result<Option<FeedbackRecord>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {SELECT_COLUMNS} FROM feedback WHERE id = ?1;"
    ))?;
    let mut rows = stmt.query([id])?;
    match rows.next()? {
        Some(row) => Ok(Some(feedback_from_row(row)?)),
        None => Ok(None),
    }
}

fn feedback_from_row(row: &rusqlite::Row<'_>) -> Result<FeedbackRecord> {
    let id: i64 = row.get(0)?;
    let corrupt = |reason: String| StoreError::CorruptRow { id, reason };

    let gender_raw: String = row.get(3)?;
    let gender = Gender::from_str(&gender_raw).map_err(|err| corrupt(err.to_string()))?;
    let mode_raw: String = row.get(6)?;
    let mode = UsageMode::from_str(&mode_raw).map_err(|err| corrupt(err.to_string()))?;

    Ok(FeedbackRecord {
        id: FeedbackId(id),
        submitted_at: row.get(1)?,
        feedback: NewFeedback {
            user_id: row.get(2)?,
            demographic: Demographic {
                gender,
                age: row.get(4)?,
            },
            product_model: row.get(5)?,
            usage: Usage {
                mode,
                intensity: row.get(7)?,
                heat_enabled: row.get(8)?,
                duration_minutes: row.get(9)?,
                context: row.get(10)?,
            },
            ratings: Ratings {
                relax: row.get(11)?,
                pain_relief: row.get(12)?,
                noise: row.get(13)?,
                heat_fit: row.get(14)?,
            },
            pain_areas: row.get(15)?,
            issues: row.get(16)?,
            nps: row.get(17)?,
            notes: row.get(18)?,
            contact: ContactPreference {
                allowed: row.get(19)?,
                phone: row.get(20)?,
                email: row.get(21)?,
            },
        },
    })
}

