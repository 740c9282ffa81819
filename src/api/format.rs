//! Wire-format helpers shared by models, handlers and the spreadsheet parser.

use serde::ser::{SerializeSeq, Serializer};
use serde_json::{Number, Value};
use uuid::Uuid;

/// Largest integer an f64 represents exactly (2^53)
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_992.0;

/// JSON number for `n`, writing integral values without a fractional part
/// so `42.0` goes out as `42` the way browser clients produce it.
pub fn number_value(n: f64) -> Value {
    if n.fract() == 0.0 && n.abs() <= MAX_SAFE_INTEGER {
        return Value::from(n as i64);
    }
    Number::from_f64(n).map(Value::Number).unwrap_or(Value::Null)
}

/// `serialize_with` adapter for numeric series
pub fn serialize_numbers<S: Serializer>(values: &[f64], serializer: S) -> Result<S::Ok, S::Error> {
    let mut seq = serializer.serialize_seq(Some(values.len()))?;
    for v in values {
        seq.serialize_element(&number_value(*v))?;
    }
    seq.end()
}

/// Record ids arrive as path strings; anything that is not a UUID simply
/// matches no record.
pub fn parse_record_id(raw: &str) -> Option<Uuid> {
    Uuid::parse_str(raw.trim()).ok()
}
