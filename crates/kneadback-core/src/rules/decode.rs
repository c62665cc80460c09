//! Field-by-field decoding of a JSON submission.
//!
//! A typed `serde` decode stops at the first mistyped field. Decoding from a
//! [`Value`] instead lets a wrong type be reported next to range failures, in
//! the same [`ValidationErrors`] list.

use crate::domain::NewFeedback;
use crate::dto::{ContactInput, DemographicInput, FeedbackInput, RatingsInput, UsageInput};
use crate::rules::validation::{FieldError, ValidationErrors};
use serde_json::{Map, Value};

/// Every field path in submission order. Errors are reported in this order.
pub const FIELD_ORDER: &[&str] = &[
    "body",
    "user_id",
    "demographic",
    "demographic.gender",
    "demographic.age",
    "product_model",
    "usage",
    "usage.mode",
    "usage.intensity",
    "usage.heat_enabled",
    "usage.duration_minutes",
    "usage.context",
    "ratings",
    "ratings.relax",
    "ratings.pain_relief",
    "ratings.noise",
    "ratings.heat_fit",
    "pain_areas",
    "issues",
    "nps",
    "notes",
    "contact",
    "contact.allowed",
    "contact.phone",
    "contact.email",
];

fn position(field: &str) -> usize {
    FIELD_ORDER
        .iter()
        .position(|known| *known == field)
        .unwrap_or(FIELD_ORDER.len())
}

fn describe(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(number) if number.is_f64() => "a fractional number",
        Value::Number(number) if number.as_i64().is_none() => "an out-of-range number",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

struct Decoder {
    errors: ValidationErrors,
}

impl Decoder {
    fn mismatch(&mut self, field: String, expected: &str, got: &Value) {
        self.errors.fields.push(FieldError {
            message: format!("must be {expected}, got {}", describe(got)),
            field,
        });
    }

    /// `None` for a missing or null field, or after recording a type error.
    fn get<'v, T>(
        &mut self,
        object: &'v Map<String, Value>,
        field: &str,
        expected: &str,
        extract: impl FnOnce(&'v Value) -> Option<T>,
    ) -> Option<T> {
        let value = object.get(leaf(field)).filter(|value| !value.is_null())?;
        let extracted = extract(value);
        if extracted.is_none() {
            self.mismatch(field.to_string(), expected, value);
        }
        extracted
    }

    fn integer(&mut self, object: &Map<String, Value>, field: &str) -> Option<i64> {
        self.get(object, field, "an integer", Value::as_i64)
    }

    fn string(&mut self, object: &Map<String, Value>, field: &str) -> Option<String> {
        self.get(object, field, "a string", |value| {
            value.as_str().map(str::to_string)
        })
    }

    fn boolean(&mut self, object: &Map<String, Value>, field: &str) -> Option<bool> {
        self.get(object, field, "a boolean", Value::as_bool)
    }

    fn group<'v>(
        &mut self,
        object: &'v Map<String, Value>,
        field: &str,
    ) -> Option<&'v Map<String, Value>> {
        self.get(object, field, "an object", Value::as_object)
    }
}

fn leaf(field: &str) -> &str {
    field.rsplit('.').next().unwrap_or(field)
}

impl FeedbackInput {
    /// Builds an input from arbitrary JSON. Missing and null fields take their
    /// defaults, as do mistyped ones, which are also listed in the returned
    /// errors. Unknown keys are ignored.
    pub fn from_json(value: &Value) -> (FeedbackInput, ValidationErrors) {
        let mut input = FeedbackInput::default();
        let mut de = Decoder {
            errors: ValidationErrors::default(),
        };
        let Some(root) = value.as_object() else {
            de.mismatch("body".to_string(), "a JSON object", value);
            return (input, de.errors);
        };

        if let Some(user_id) = de.string(root, "user_id") {
            input.user_id = user_id;
        }
        if let Some(demographic) = de.group(root, "demographic") {
            let defaults = DemographicInput::default();
            input.demographic = DemographicInput {
                gender: de
                    .string(demographic, "demographic.gender")
                    .unwrap_or(defaults.gender),
                age: de
                    .integer(demographic, "demographic.age")
                    .unwrap_or(defaults.age),
            };
        }
        if let Some(product_model) = de.string(root, "product_model") {
            input.product_model = product_model;
        }
        if let Some(usage) = de.group(root, "usage") {
            input.usage = UsageInput {
                mode: de.string(usage, "usage.mode"),
                intensity: de.integer(usage, "usage.intensity"),
                heat_enabled: de
                    .boolean(usage, "usage.heat_enabled")
                    .unwrap_or_default(),
                duration_minutes: de.integer(usage, "usage.duration_minutes"),
                context: de.string(usage, "usage.context").unwrap_or_default(),
            };
        }
        if let Some(ratings) = de.group(root, "ratings") {
            input.ratings = RatingsInput {
                relax: de.integer(ratings, "ratings.relax"),
                pain_relief: de.integer(ratings, "ratings.pain_relief"),
                noise: de.integer(ratings, "ratings.noise"),
                heat_fit: de.integer(ratings, "ratings.heat_fit"),
            };
        }
        if let Some(pain_areas) = de.string(root, "pain_areas") {
            input.pain_areas = pain_areas;
        }
        if let Some(issues) = de.string(root, "issues") {
            input.issues = issues;
        }
        input.nps = de.integer(root, "nps");
        if let Some(notes) = de.string(root, "notes") {
            input.notes = notes;
        }
        if let Some(contact) = de.group(root, "contact") {
            input.contact = ContactInput {
                allowed: de
                    .boolean(contact, "contact.allowed")
                    .unwrap_or_default(),
                phone: de.string(contact, "contact.phone").unwrap_or_default(),
                email: de.string(contact, "contact.email").unwrap_or_default(),
            };
        }

        (input, de.errors)
    }

    /// Decodes and validates in one pass. A mistyped field is reported once,
    /// with its type error; range and length failures of the remaining fields
    /// are listed alongside.
    pub fn validate_json(value: &Value) -> Result<NewFeedback, ValidationErrors> {
        let (input, mut errors) = FeedbackInput::from_json(value);
        if errors.contains("body") {
            return Err(errors);
        }
        let checked = input.validate();
        let found = match checked {
            Ok(record) if errors.is_empty() => return Ok(record),
            Ok(_) => Vec::new(),
            Err(found) => found.fields,
        };
        for err in found {
            if !errors.contains(&err.field) {
                errors.fields.push(err);
            }
        }
        errors.fields.sort_by_key(|err| position(&err.field));
        Err(errors)
    }
}
