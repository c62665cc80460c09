pub mod api;
pub mod error;
pub mod paths;
pub mod queue;
pub mod sink;
pub mod submit;

pub use api::ApiClient;
pub use error::{ClientError, Result};
pub use queue::{DrainReport, OfflineQueue, QueueEntry, QueueState};
pub use sink::FeedbackSink;
pub use submit::{SubmitOutcome, Submitter};
