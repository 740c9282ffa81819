pub mod format;
pub mod schemas;
pub mod validate;

pub use validate::{ApiJson, FieldError, ValidJson};
