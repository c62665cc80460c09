pub mod decode;
pub mod insights;
pub mod limits;
pub mod validation;

pub use insights::round_average;
pub use validation::{FieldError, ValidationErrors};
