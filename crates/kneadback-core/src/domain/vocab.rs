use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Massage program the product was used in. The server owns this list;
/// front ends may offer it as a picker but are never trusted with it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UsageMode {
    FullBody,
    Neck,
    Shoulder,
    Waist,
    Stretch,
}

impl UsageMode {
    pub const ALL: [UsageMode; 5] = [
        UsageMode::FullBody,
        UsageMode::Neck,
        UsageMode::Shoulder,
        UsageMode::Waist,
        UsageMode::Stretch,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            UsageMode::FullBody => "full_body",
            UsageMode::Neck => "neck",
            UsageMode::Shoulder => "shoulder",
            UsageMode::Waist => "waist",
            UsageMode::Stretch => "stretch",
        }
    }

    pub fn labels() -> Vec<&'static str> {
        Self::ALL.iter().map(|mode| mode.as_str()).collect()
    }
}

impl fmt::Display for UsageMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UsageMode {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        Self::ALL
            .into_iter()
            .find(|mode| mode.as_str() == normalized)
            .ok_or_else(|| CoreError::InvalidUsageMode(s.trim().to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Male,
    Female,
    #[default]
    Undisclosed,
}

impl Gender {
    pub const ALL: [Gender; 3] = [Gender::Male, Gender::Female, Gender::Undisclosed];

    pub fn as_str(self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
            Gender::Undisclosed => "undisclosed",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Gender {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|gender| gender.as_str() == normalized)
            .ok_or_else(|| CoreError::InvalidGender(s.trim().to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::{Gender, UsageMode};
    use std::str::FromStr;

    #[test]
    fn usage_mode_parses_loosely() {
        assert_eq!(UsageMode::from_str("Full-Body").unwrap(), UsageMode::FullBody);
        assert_eq!(UsageMode::from_str(" neck ").unwrap(), UsageMode::Neck);
    }

    #[test]
    fn usage_mode_rejects_unknown_labels() {
        let err = UsageMode::from_str("foot").unwrap_err();
        assert_eq!(err.to_string(), "unknown usage mode: foot");
    }

    #[test]
    fn gender_round_trips_through_labels() {
        for gender in Gender::ALL {
            assert_eq!(Gender::from_str(gender.as_str()).unwrap(), gender);
        }
        assert!(Gender::from_str("unknown").is_err());
    }
}
