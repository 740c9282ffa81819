//! Request body extraction and field validation.
//!
//! Every body-validation failure is reported as 422 with the generic
//! `"Fill the input properly"` message and the first failing rule in
//! `extraDetails`.

use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, Request},
    Json,
};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::ApiError;

pub const VALIDATION_MESSAGE: &str = "Fill the input properly";

/// First rule a request body broke
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError(pub String);

impl FieldError {
    pub fn new(detail: impl Into<String>) -> Self {
        Self(detail.into())
    }
}

impl From<FieldError> for ApiError {
    fn from(err: FieldError) -> Self {
        ApiError::validation_error(VALIDATION_MESSAGE, err.0)
    }
}

/// `axum::Json` whose rejections come back in the API's error shape
pub struct ApiJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(ApiJson(value)),
            Err(rejection) => Err(json_rejection(rejection)),
        }
    }
}

fn json_rejection(rejection: JsonRejection) -> ApiError {
    tracing::debug!("Rejected request body: {}", rejection.body_text());
    ApiError::validation_error(VALIDATION_MESSAGE, rejection.body_text())
}

/// A request body that is checked and normalized after deserialization
pub trait Validate: Sized {
    type Raw: DeserializeOwned + Send;

    fn validate(raw: Self::Raw) -> Result<Self, FieldError>;
}

/// Extractor yielding a body that already passed [`Validate`]
pub struct ValidJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ValidJson<T>
where
    T: Validate,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let ApiJson(raw) = ApiJson::<T::Raw>::from_request(req, state).await?;
        Ok(ValidJson(T::validate(raw)?))
    }
}

/// Length and shape constraints for one text field. Input is trimmed before
/// any check, and lengths count characters.
#[derive(Debug, Clone, Copy)]
pub struct TextRule {
    pub label: &'static str,
    pub min: usize,
    pub max: usize,
    pub email: bool,
}

impl TextRule {
    /// Check a required field
    pub fn check(&self, value: Option<Value>) -> Result<String, FieldError> {
        match value {
            None | Some(Value::Null) => Err(FieldError::new(format!("{} is required", self.label))),
            Some(v) => self.check_value(v),
        }
    }

    /// Check a field that may be left out; an explicit null counts as absent
    pub fn check_optional(&self, value: Option<Value>) -> Result<Option<String>, FieldError> {
        match value {
            None | Some(Value::Null) => Ok(None),
            Some(v) => self.check_value(v).map(Some),
        }
    }

    fn check_value(&self, value: Value) -> Result<String, FieldError> {
        let raw = match value {
            Value::String(s) => s,
            other => {
                return Err(FieldError::new(format!(
                    "Expected string, received {}",
                    json_kind(&other)
                )))
            }
        };

        let text = raw.trim().to_string();
        if self.email && !is_email(&text) {
            return Err(FieldError::new("Invalid email address"));
        }

        let len = text.chars().count();
        if len < self.min {
            return Err(FieldError::new(format!(
                "{} must be at least {} characters.",
                self.label, self.min
            )));
        }
        if len > self.max {
            return Err(FieldError::new(format!(
                "{} must not be more than {} characters",
                self.label, self.max
            )));
        }
        Ok(text)
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Loose `local@domain.tld` shape check: one `@`, no whitespace, a dot in
/// the domain that is neither its first nor last character.
pub fn is_email(value: &str) -> bool {
    if value.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    match domain.rfind('.') {
        Some(dot) => dot > 0 && dot + 1 < domain.len() && !domain.contains(".."),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const NAME: TextRule = TextRule { label: "Name", min: 3, max: 10, email: false };
    const EMAIL: TextRule = TextRule { label: "Email", min: 3, max: 255, email: true };

    #[test]
    fn trims_before_measuring() {
        assert_eq!(NAME.check(Some(json!("  ada  "))).unwrap(), "ada");
        assert_eq!(
            NAME.check(Some(json!("  a  "))).unwrap_err().0,
            "Name must be at least 3 characters."
        );
    }

    #[test]
    fn reports_missing_and_too_long() {
        assert_eq!(NAME.check(None).unwrap_err().0, "Name is required");
        assert_eq!(NAME.check(Some(Value::Null)).unwrap_err().0, "Name is required");
        assert_eq!(
            NAME.check(Some(json!("abcdefghijk"))).unwrap_err().0,
            "Name must not be more than 10 characters"
        );
    }

    #[test]
    fn rejects_non_strings() {
        assert_eq!(
            NAME.check(Some(json!(12345))).unwrap_err().0,
            "Expected string, received number"
        );
    }

    #[test]
    fn optional_fields_may_be_absent() {
        assert_eq!(NAME.check_optional(None).unwrap(), None);
        assert_eq!(NAME.check_optional(Some(json!("grace"))).unwrap(), Some("grace".to_string()));
        assert!(NAME.check_optional(Some(json!("x"))).is_err());
    }

    #[test]
    fn email_shape() {
        assert!(is_email("ada@example.com"));
        assert!(is_email("a.b+c@sub.example.org"));
        assert!(!is_email("ada.example.com"));
        assert!(!is_email("ada@example"));
        assert!(!is_email("@example.com"));
        assert!(!is_email("ada@.com"));
        assert!(!is_email("ada@example."));
        assert!(!is_email("a da@example.com"));
        assert!(!is_email("ada@@example.com"));
        assert_eq!(
            EMAIL.check(Some(json!("nope"))).unwrap_err().0,
            "Invalid email address"
        );
    }

    #[test]
    fn field_errors_become_422() {
        let err: ApiError = FieldError::new("Phone is required").into();
        assert_eq!(err.status_code(), axum::http::StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(err.to_json()["extraDetails"], "Phone is required");
        assert_eq!(err.to_json()["message"], VALIDATION_MESSAGE);
    }
}
