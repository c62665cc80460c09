#![allow(dead_code)]

use kneadback_client::{ClientError, FeedbackSink, Result};
use kneadback_core::{FeedbackId, FeedbackInput, FeedbackRecord, RatingsInput, UsageInput};
use std::cell::RefCell;
use std::collections::HashSet;
use std::thread;
use std::time::Duration;

/// Accepts every submission except those whose notes are listed in `failing`.
#[derive(Default)]
pub struct ScriptedSink {
    failing: HashSet<String>,
    delay: Duration,
    pub delivered: RefCell<Vec<String>>,
    pub attempts: RefCell<usize>,
}

impl ScriptedSink {
    pub fn failing(notes: &[&str]) -> Self {
        Self {
            failing: notes.iter().map(|note| note.to_string()).collect(),
            ..Self::default()
        }
    }

    /// Every delivery takes at least `delay`.
    pub fn slow(delay: Duration) -> Self {
        Self {
            delay,
            ..Self::default()
        }
    }

    pub fn attempts(&self) -> usize {
        *self.attempts.borrow()
    }

    pub fn delivered(&self) -> Vec<String> {
        self.delivered.borrow().clone()
    }
}

impl FeedbackSink for ScriptedSink {
    fn deliver(&self, input: &FeedbackInput) -> Result<FeedbackRecord> {
        *self.attempts.borrow_mut() += 1;
        if !self.delay.is_zero() {
            thread::sleep(self.delay);
        }
        if self.failing.contains(&input.notes) {
            return Err(ClientError::Status {
                status: 503,
                body: "{\"error\":\"storage unavailable\"}".to_string(),
            });
        }
        let feedback = input
            .validate()
            .map_err(|errors| ClientError::Precondition(errors.to_string()))?;
        let mut delivered = self.delivered.borrow_mut();
        delivered.push(input.notes.clone());
        Ok(FeedbackRecord {
            id: FeedbackId(delivered.len() as i64),
            submitted_at: 1_700_000_000,
            feedback,
        })
    }
}

pub fn input(notes: &str) -> FeedbackInput {
    FeedbackInput {
        product_model: "chair::Zen 3".to_string(),
        usage: UsageInput {
            mode: Some("neck".to_string()),
            intensity: Some(3),
            heat_enabled: false,
            duration_minutes: Some(15),
            context: String::new(),
        },
        ratings: RatingsInput {
            relax: Some(4),
            pain_relief: Some(4),
            noise: Some(3),
            heat_fit: Some(5),
        },
        nps: Some(8),
        notes: notes.to_string(),
        ..FeedbackInput::default()
    }
}
