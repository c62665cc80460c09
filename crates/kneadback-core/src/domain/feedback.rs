use crate::domain::ids::FeedbackId;
use crate::domain::vocab::{Gender, UsageMode};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Demographic {
    pub gender: Gender,
    pub age: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub mode: UsageMode,
    pub intensity: u8,
    pub heat_enabled: bool,
    pub duration_minutes: u8,
    /// Where the product was used (store trial, at home, ...). Free text.
    pub context: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ratings {
    pub relax: u8,
    pub pain_relief: u8,
    pub noise: u8,
    pub heat_fit: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ContactPreference {
    pub allowed: bool,
    pub phone: String,
    pub email: String,
}

/// A submission that passed validation but has not been stored yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewFeedback {
    pub user_id: String,
    pub demographic: Demographic,
    pub product_model: String,
    pub usage: Usage,
    pub ratings: Ratings,
    pub pain_areas: String,
    pub issues: String,
    pub nps: u8,
    pub notes: String,
    pub contact: ContactPreference,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackRecord {
    pub id: FeedbackId,
    pub submitted_at: i64,
    #[serde(flatten)]
    pub feedback: NewFeedback,
}
