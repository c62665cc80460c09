use crate::error::{ClientError, Result};
use crate::queue::{DrainReport, OfflineQueue};
use crate::sink::FeedbackSink;
use kneadback_core::{FeedbackInput, FeedbackRecord};
use tracing::warn;

#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    Delivered(FeedbackRecord),
    Queued { reason: String },
}

/// Delivers submissions, falling back to the offline queue on any failure.
pub struct Submitter<S> {
    sink: S,
    queue: OfflineQueue,
}

impl<S: FeedbackSink> Submitter<S> {
    pub fn new(sink: S, queue: OfflineQueue) -> Self {
        Self { sink, queue }
    }

    pub fn queue(&self) -> &OfflineQueue {
        &self.queue
    }

    /// Only a contact precondition failure or a failing enqueue is an error;
    /// everything else ends up either delivered or queued.
    pub fn submit(&self, input: &FeedbackInput) -> Result<SubmitOutcome> {
        check_contact(input)?;
        match self.sink.deliver(input) {
            Ok(record) => Ok(SubmitOutcome::Delivered(record)),
            Err(err) => {
                warn!(error = %err, "delivery failed, queueing submission");
                self.queue.enqueue(input)?;
                Ok(SubmitOutcome::Queued {
                    reason: err.to_string(),
                })
            }
        }
    }

    pub fn sync(&self) -> Result<DrainReport> {
        self.queue.drain(&self.sink)
    }
}

/// Consent to be contacted needs both a phone number and an email address.
pub fn check_contact(input: &FeedbackInput) -> Result<()> {
    let contact = &input.contact;
    if !contact.allowed {
        return Ok(());
    }
    let mut missing = Vec::new();
    if contact.phone.trim().is_empty() {
        missing.push("phone");
    }
    if contact.email.trim().is_empty() {
        missing.push("email");
    }
    if missing.is_empty() {
        Ok(())
    } else {
        Err(ClientError::Precondition(format!(
            "contact allowed but {} missing",
            missing.join(" and ")
        )))
    }
}
