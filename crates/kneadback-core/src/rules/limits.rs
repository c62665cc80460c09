use std::ops::RangeInclusive;

pub const DEFAULT_USER_ID: &str = "guest";

pub const RATING_RANGE: RangeInclusive<i64> = 1..=5;
pub const INTENSITY_RANGE: RangeInclusive<i64> = 1..=5;
pub const DURATION_MINUTES_RANGE: RangeInclusive<i64> = 1..=120;
pub const NPS_RANGE: RangeInclusive<i64> = 0..=10;
pub const AGE_RANGE: RangeInclusive<i64> = 0..=150;

// Lengths are counted in chars after trimming.
pub const MAX_USER_ID_CHARS: usize = 64;
pub const MAX_PRODUCT_MODEL_CHARS: usize = 64;
pub const MAX_USAGE_CONTEXT_CHARS: usize = 64;
pub const MAX_PAIN_AREAS_CHARS: usize = 256;
pub const MAX_ISSUES_CHARS: usize = 512;
pub const MAX_NOTES_CHARS: usize = 1024;
pub const MAX_PHONE_CHARS: usize = 32;
pub const MAX_EMAIL_CHARS: usize = 128;
