//! Request bodies accepted by the API and the rules they are checked against.

use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

use crate::database::models::{NewChart, DEFAULT_CHART_TITLE, DEFAULT_CHART_TYPE};
use crate::error::ApiError;

use super::validate::{FieldError, TextRule, Validate};

pub const EMAIL: TextRule = TextRule { label: "Email", min: 3, max: 255, email: true };
pub const PASSWORD: TextRule = TextRule { label: "Password", min: 6, max: 255, email: false };
pub const USERNAME: TextRule = TextRule { label: "Name", min: 3, max: 255, email: false };
pub const PHONE: TextRule = TextRule { label: "Phone", min: 10, max: 20, email: false };

/// Raw credential-style body. Fields stay untyped so a wrong JSON type is
/// reported per field instead of failing the whole body. Unknown keys are
/// ignored.
#[derive(Debug, Default, Deserialize)]
pub struct RawUserBody {
    #[serde(default)]
    pub username: Option<Value>,
    #[serde(default)]
    pub email: Option<Value>,
    #[serde(default)]
    pub phone: Option<Value>,
    #[serde(default)]
    pub password: Option<Value>,
}

/// POST /api/auth/register
#[derive(Debug, Clone, PartialEq)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub phone: String,
    pub password: String,
}

impl Validate for RegisterRequest {
    type Raw = RawUserBody;

    fn validate(raw: RawUserBody) -> Result<Self, FieldError> {
        let email = EMAIL.check(raw.email)?;
        let password = PASSWORD.check(raw.password)?;
        let username = USERNAME.check(raw.username)?;
        let phone = PHONE.check(raw.phone)?;
        Ok(Self { username, email, phone, password })
    }
}

/// POST /api/auth/login
#[derive(Debug, Clone, PartialEq)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl Validate for LoginRequest {
    type Raw = RawUserBody;

    fn validate(raw: RawUserBody) -> Result<Self, FieldError> {
        let email = EMAIL.check(raw.email)?;
        let password = PASSWORD.check(raw.password)?;
        Ok(Self { email, password })
    }
}

/// PATCH /api/admin/users/update/:id
///
/// Only these four fields are ever written. Anything else in the body,
/// including `isAdmin` and the `_id`/timestamps a client echoes back from
/// the get-by-id response, is dropped here.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserUpdateRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    /// Plain text; hashed by the handler
    pub password: Option<String>,
}

impl Validate for UserUpdateRequest {
    type Raw = RawUserBody;

    fn validate(raw: RawUserBody) -> Result<Self, FieldError> {
        Ok(Self {
            email: EMAIL.check_optional(raw.email)?,
            password: PASSWORD.check_optional(raw.password)?,
            username: USERNAME.check_optional(raw.username)?,
            phone: PHONE.check_optional(raw.phone)?,
        })
    }
}

/// POST /api/charts/save
#[derive(Debug, Default, Deserialize)]
pub struct ChartRequest {
    #[serde(default)]
    pub title: Option<Value>,
    #[serde(default)]
    pub labels: Option<Value>,
    #[serde(default)]
    pub values: Option<Value>,
    #[serde(default, rename = "type")]
    pub chart_type: Option<Value>,
}

impl ChartRequest {
    /// Build the chart to store for `owner`.
    ///
    /// Falsy `labels`/`values` (absent, null, `""`, `0`, `false`) give
    /// "Missing chart data"; present but unusable ones give "Failed to save
    /// chart".
    pub fn into_new_chart(self, owner: Uuid) -> Result<NewChart, ApiError> {
        let (labels, values) = match (present(self.labels), present(self.values)) {
            (Some(labels), Some(values)) => (labels, values),
            _ => return Err(ApiError::bad_request("Missing chart data")),
        };

        let labels = series(labels, label_text)?;
        let values = series(values, numeric)?;
        let title = text_or(self.title, DEFAULT_CHART_TITLE)?;
        let chart_type = text_or(self.chart_type, DEFAULT_CHART_TYPE)?;

        Ok(NewChart { title, labels, values, chart_type, created_by: owner })
    }
}

fn failed() -> ApiError {
    ApiError::bad_request("Failed to save chart")
}

fn present(value: Option<Value>) -> Option<Value> {
    match value {
        None | Some(Value::Null) | Some(Value::Bool(false)) => None,
        Some(Value::String(s)) if s.is_empty() => None,
        Some(Value::Number(n)) if n.as_f64() == Some(0.0) => None,
        Some(v) => Some(v),
    }
}

/// A lone scalar is accepted as a one-element series
fn series<T>(value: Value, item: fn(Value) -> Option<T>) -> Result<Vec<T>, ApiError> {
    let items = match value {
        Value::Array(items) => items,
        Value::Object(_) => return Err(failed()),
        scalar => vec![scalar],
    };
    items.into_iter().map(|v| item(v).ok_or_else(failed)).collect()
}

fn label_text(value: Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn numeric(value: Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
        Value::Bool(b) => Some(if b { 1.0 } else { 0.0 }),
        _ => None,
    }
}

fn text_or(value: Option<Value>, default: &str) -> Result<String, ApiError> {
    match value {
        None | Some(Value::Null) => Ok(default.to_string()),
        Some(Value::String(s)) if s.is_empty() => Ok(default.to_string()),
        Some(Value::String(s)) => Ok(s),
        Some(Value::Number(n)) => Ok(n.to_string()),
        Some(_) => Err(failed()),
    }
}
