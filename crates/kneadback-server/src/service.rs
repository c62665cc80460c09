//! The ingestion service: validation, identity assignment and the read-side
//! queries, on top of one SQLite connection.
//!
//! Every method is synchronous and meant to run on a blocking thread.

use chrono::Utc;
use kneadback_core::dto::{FeedbackInput, HealthStatus, Insights};
use kneadback_core::{FeedbackId, FeedbackRecord, NewFeedback, ValidationErrors};
use kneadback_store::error::StoreError;
use kneadback_store::Store;
use serde_json::Value;
use std::sync::{Mutex, MutexGuard};
use thiserror::Error;
use tracing::{debug, info, warn};

pub const DEFAULT_LIST_LIMIT: i64 = 100;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("{0}")]
    Validation(#[from] ValidationErrors),
    #[error("storage error: {0}")]
    Storage(#[from] StoreError),
    #[error("storage handle poisoned by an earlier panic")]
    Poisoned,
}

pub struct IngestionService {
    store: Mutex<Store>,
    max_list_limit: i64,
}

impl IngestionService {
    /// `store` must already be migrated.
    pub fn new(store: Store, max_list_limit: i64) -> Self {
        Self {
            store: Mutex::new(store),
            max_list_limit: max_list_limit.max(1),
        }
    }

    fn store(&self) -> Result<MutexGuard<'_, Store>, IngestError> {
        self.store.lock().map_err(|_| IngestError::Poisoned)
    }

    pub fn create_record(&self, input: &FeedbackInput) -> Result<FeedbackRecord, IngestError> {
        self.insert(input.validate())
    }

    /// Like [`create_record`](Self::create_record), for a body that has not
    /// been decoded yet. Mistyped fields are validation errors.
    pub fn create_record_json(&self, body: &Value) -> Result<FeedbackRecord, IngestError> {
        self.insert(FeedbackInput::validate_json(body))
    }

    fn insert(
        &self,
        validated: Result<NewFeedback, ValidationErrors>,
    ) -> Result<FeedbackRecord, IngestError> {
        let feedback = validated.inspect_err(|errors| {
            debug!(fields = ?errors.field_names(), "rejected feedback");
        })?;
        let record = self
            .store()?
            .feedback()
            .create(Utc::now().timestamp(), &feedback)?;
        info!(id = %record.id, mode = %record.feedback.usage.mode, "stored feedback");
        Ok(record)
    }

    pub fn get_record(&self, id: FeedbackId) -> Result<Option<FeedbackRecord>, IngestError> {
        Ok(self.store()?.feedback().get(id)?)
    }

    pub fn list_records(&self, limit: Option<i64>) -> Result<Vec<FeedbackRecord>, IngestError> {
        let limit = self.effective_limit(limit)?;
        Ok(self.store()?.feedback().list_recent(limit)?)
    }

    /// Defaults to [`DEFAULT_LIST_LIMIT`], rejects non-positive values and caps
    /// at the configured maximum.
    pub fn effective_limit(&self, limit: Option<i64>) -> Result<i64, IngestError> {
        let requested = limit.unwrap_or(DEFAULT_LIST_LIMIT);
        if requested < 1 {
            return Err(ValidationErrors::single(
                "limit",
                format!("must be a positive integer, got {requested}"),
            )
            .into());
        }
        Ok(requested.min(self.max_list_limit))
    }

    pub fn insights(&self) -> Result<Insights, IngestError> {
        Ok(self.store()?.feedback().insights()?)
    }

    /// Never fails: storage problems are reported in the returned status.
    pub fn health_check(&self) -> HealthStatus {
        let result = self
            .store()
            .and_then(|store| store.feedback().ping().map_err(IngestError::from));
        match result {
            Ok(()) => HealthStatus::healthy(),
            Err(err) => {
                warn!(error = %err, "health check failed");
                HealthStatus::failing(err.to_string())
            }
        }
    }
}
