use crate::rules::limits::DEFAULT_USER_ID;
use serde::{Deserialize, Serialize};

/// Raw submission as sent by a front end or read back from the offline queue.
///
/// Every recognised field is listed here with its default. Fields that have no
/// sensible default are `Option` so that validation can report them as missing.
/// `id` and `submitted_at` are not part of the input and are ignored if sent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedbackInput {
    pub user_id: String,
    pub demographic: DemographicInput,
    pub product_model: String,
    pub usage: UsageInput,
    pub ratings: RatingsInput,
    pub pain_areas: String,
    pub issues: String,
    pub nps: Option<i64>,
    pub notes: String,
    pub contact: ContactInput,
}

impl Default for FeedbackInput {
    fn default() -> Self {
        Self {
            user_id: DEFAULT_USER_ID.to_string(),
            demographic: DemographicInput::default(),
            product_model: String::new(),
            usage: UsageInput::default(),
            ratings: RatingsInput::default(),
            pain_areas: String::new(),
            issues: String::new(),
            nps: None,
            notes: String::new(),
            contact: ContactInput::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DemographicInput {
    pub gender: String,
    pub age: i64,
}

impl Default for DemographicInput {
    fn default() -> Self {
        Self {
            gender: "undisclosed".to_string(),
            age: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UsageInput {
    pub mode: Option<String>,
    pub intensity: Option<i64>,
    pub heat_enabled: bool,
    pub duration_minutes: Option<i64>,
    pub context: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RatingsInput {
    pub relax: Option<i64>,
    pub pain_relief: Option<i64>,
    pub noise: Option<i64>,
    pub heat_fit: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ContactInput {
    pub allowed: bool,
    pub phone: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insights {
    pub count: i64,
    pub average_nps: f64,
    /// Reserved. Needs issue-text tokenisation, which is not done.
    pub top_issue: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl HealthStatus {
    pub fn healthy() -> Self {
        Self {
            ok: true,
            error: None,
        }
    }

    pub fn failing(error: impl Into<String>) -> Self {
        Self {
            ok: false,
            error: Some(error.into()),
        }
    }
}
