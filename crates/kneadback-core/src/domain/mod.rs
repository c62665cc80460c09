pub mod feedback;
pub mod ids;
pub mod vocab;

pub use feedback::{ContactPreference, Demographic, FeedbackRecord, NewFeedback, Ratings, Usage};
pub use ids::FeedbackId;
pub use vocab::{Gender, UsageMode};
