use crate::Result;
use kneadback_core::{FeedbackInput, FeedbackRecord};

/// Somewhere a submission can be delivered to. The HTTP client is the real
/// implementation; queue draining and submission only depend on this trait.
pub trait FeedbackSink {
    fn deliver(&self, input: &FeedbackInput) -> Result<FeedbackRecord>;
}

impl<S: FeedbackSink + ?Sized> FeedbackSink for &S {
    fn deliver(&self, input: &FeedbackInput) -> Result<FeedbackRecord> {
        (**self).deliver(input)
    }
}
