use crate::domain::{
    ContactPreference, Demographic, Gender, NewFeedback, Ratings, Usage, UsageMode,
};
use crate::dto::FeedbackInput;
use crate::rules::limits::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    /// Dotted path of the offending field, e.g. `ratings.relax`.
    pub field: String,
    pub message: String,
}

/// Every field that failed validation, in input order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ValidationErrors {
    pub fields: Vec<FieldError>,
}

impl ValidationErrors {
    pub fn single(field: &str, message: impl Into<String>) -> Self {
        Self {
            fields: vec![FieldError {
                field: field.to_string(),
                message: message.into(),
            }],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.iter().any(|err| err.field == field)
    }

    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|err| err.field.as_str()).collect()
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid fields: ")?;
        for (index, err) in self.fields.iter().enumerate() {
            if index > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{} ({})", err.field, err.message)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

#[derive(Default)]
struct Checker {
    errors: ValidationErrors,
}

impl Checker {
    fn fail(&mut self, field: &str, message: impl Into<String>) {
        self.errors.fields.push(FieldError {
            field: field.to_string(),
            message: message.into(),
        });
    }

    fn required<T>(&mut self, field: &str, value: Option<T>) -> Option<T> {
        if value.is_none() {
            self.fail(field, "is required");
        }
        value
    }

    fn bounded<T>(&mut self, field: &str, value: Option<i64>, range: RangeInclusive<i64>) -> T
    where
        T: TryFrom<i64> + Default,
    {
        let Some(value) = self.required(field, value) else {
            return T::default();
        };
        if !range.contains(&value) {
            self.fail(
                field,
                format!(
                    "must be between {} and {}, got {}",
                    range.start(),
                    range.end(),
                    value
                ),
            );
            return T::default();
        }
        T::try_from(value).unwrap_or_default()
    }

    fn text(&mut self, field: &str, value: &str, max_chars: usize) -> String {
        let trimmed = value.trim();
        let len = trimmed.chars().count();
        if len > max_chars {
            self.fail(
                field,
                format!("must be at most {} characters, got {}", max_chars, len),
            );
        }
        trimmed.to_string()
    }

    fn parsed<T: FromStr>(&mut self, field: &str, value: &str, allowed: &str) -> Option<T> {
        match T::from_str(value) {
            Ok(parsed) => Some(parsed),
            Err(_) => {
                self.fail(
                    field,
                    format!("unknown value {:?}, expected one of {}", value.trim(), allowed),
                );
                None
            }
        }
    }
}

impl FeedbackInput {
    /// Checks every field and either returns a storable record or the full list
    /// of failures. Overlong text is rejected, never truncated.
    pub fn validate(&self) -> Result<NewFeedback, ValidationErrors> {
        let mut check = Checker::default();

        let mut user_id = check.text("user_id", &self.user_id, MAX_USER_ID_CHARS);
        if user_id.is_empty() {
            user_id = DEFAULT_USER_ID.to_string();
        }

        let gender = check
            .parsed::<Gender>(
                "demographic.gender",
                &self.demographic.gender,
                "male|female|undisclosed",
            )
            .unwrap_or_default();
        let age = check.bounded::<u8>("demographic.age", Some(self.demographic.age), AGE_RANGE);

        let product_model =
            check.text("product_model", &self.product_model, MAX_PRODUCT_MODEL_CHARS);

        let mode = check
            .required("usage.mode", self.usage.mode.as_deref())
            .and_then(|raw| {
                check.parsed::<UsageMode>("usage.mode", raw, &UsageMode::labels().join("|"))
            });
        let intensity = check.bounded::<u8>("usage.intensity", self.usage.intensity, INTENSITY_RANGE);
        let duration_minutes = check.bounded::<u8>(
            "usage.duration_minutes",
            self.usage.duration_minutes,
            DURATION_MINUTES_RANGE,
        );
        let context = check.text("usage.context", &self.usage.context, MAX_USAGE_CONTEXT_CHARS);

        let ratings = Ratings {
            relax: check.bounded("ratings.relax", self.ratings.relax, RATING_RANGE),
            pain_relief: check.bounded("ratings.pain_relief", self.ratings.pain_relief, RATING_RANGE),
            noise: check.bounded("ratings.noise", self.ratings.noise, RATING_RANGE),
            heat_fit: check.bounded("ratings.heat_fit", self.ratings.heat_fit, RATING_RANGE),
        };

        let pain_areas = check.text("pain_areas", &self.pain_areas, MAX_PAIN_AREAS_CHARS);
        let issues = check.text("issues", &self.issues, MAX_ISSUES_CHARS);
        let nps = check.bounded::<u8>("nps", self.nps, NPS_RANGE);
        let notes = check.text("notes", &self.notes, MAX_NOTES_CHARS);

        let contact = ContactPreference {
            allowed: self.contact.allowed,
            phone: check.text("contact.phone", &self.contact.phone, MAX_PHONE_CHARS),
            email: check.text("contact.email", &self.contact.email, MAX_EMAIL_CHARS),
        };

        let mode = match mode {
            Some(mode) if check.errors.is_empty() => mode,
            _ => return Err(check.errors),
        };

        Ok(NewFeedback {
            user_id,
            demographic: Demographic { gender, age },
            product_model,
            usage: Usage {
                mode,
                intensity,
                heat_enabled: self.usage.heat_enabled,
                duration_minutes,
                context,
            },
            ratings,
            pain_areas,
            issues,
            nps,
            notes,
            contact,
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::domain::{Gender, UsageMode};
    use crate::dto::{FeedbackInput, RatingsInput, UsageInput};

    fn valid_input() -> FeedbackInput {
        FeedbackInput {
            product_model: "chair::Zen 3".to_string(),
            usage: UsageInput {
                mode: Some("neck".to_string()),
                intensity: Some(3),
                heat_enabled: true,
                duration_minutes: Some(15),
                context: "store trial".to_string(),
            },
            ratings: RatingsInput {
                relax: Some(4),
                pain_relief: Some(4),
                noise: Some(3),
                heat_fit: Some(5),
            },
            nps: Some(8),
            ..FeedbackInput::default()
        }
    }

    #[test]
    fn validate_accepts_in_range_input() {
        let record = valid_input().validate().expect("valid");
        assert_eq!(record.user_id, "guest");
        assert_eq!(record.demographic.gender, Gender::Undisclosed);
        assert_eq!(record.usage.mode, UsageMode::Neck);
        assert_eq!(record.usage.duration_minutes, 15);
        assert_eq!(record.nps, 8);
        assert_eq!(record.usage.context, "store trial");
    }

    #[test]
    fn validate_reports_every_failing_field() {
        let mut input = valid_input();
        input.ratings.relax = Some(0);
        input.ratings.heat_fit = Some(6);
        input.nps = Some(11);
        input.usage.duration_minutes = Some(121);

        let errors = input.validate().unwrap_err();
        assert_eq!(
            errors.field_names(),
            vec![
                "usage.duration_minutes",
                "ratings.relax",
                "ratings.heat_fit",
                "nps"
            ]
        );
    }

    #[test]
    fn validate_reports_missing_required_fields() {
        let errors = FeedbackInput::default().validate().unwrap_err();
        for field in [
            "usage.mode",
            "usage.intensity",
            "usage.duration_minutes",
            "ratings.relax",
            "ratings.pain_relief",
            "ratings.noise",
            "ratings.heat_fit",
            "nps",
        ] {
            assert!(errors.contains(field), "missing {field}");
        }
    }

    #[test]
    fn validate_rejects_unknown_mode_and_gender() {
        let mut input = valid_input();
        input.usage.mode = Some("feet".to_string());
        input.demographic.gender = "robot".to_string();
        let errors = input.validate().unwrap_err();
        assert!(errors.contains("usage.mode"));
        assert!(errors.contains("demographic.gender"));
    }

    #[test]
    fn validate_rejects_overlong_notes_instead_of_truncating() {
        let mut input = valid_input();
        input.notes = "x".repeat(1025);
        let errors = input.validate().unwrap_err();
        assert_eq!(errors.field_names(), vec!["notes"]);

        input.notes = "說".repeat(1024);
        let record = input.validate().expect("multibyte chars count once");
        assert_eq!(record.notes.chars().count(), 1024);
    }

    #[test]
    fn validate_rejects_negative_age() {
        let mut input = valid_input();
        input.demographic.age = -1;
        let errors = input.validate().unwrap_err();
        assert_eq!(errors.field_names(), vec!["demographic.age"]);
    }

    #[test]
    fn blank_user_id_falls_back_to_guest() {
        let mut input = valid_input();
        input.user_id = "   ".to_string();
        let record = input.validate().expect("valid");
        assert_eq!(record.user_id, "guest");
    }

    #[test]
    fn display_lists_fields() {
        let mut input = valid_input();
        input.nps = Some(-1);
        let message = input.validate().unwrap_err().to_string();
        assert!(message.starts_with("invalid fields: nps"));
    }
}
