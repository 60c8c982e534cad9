//! Field values and the coercion rules shared by `set` and hydration.
//!
//! # Design
//! Raw elements arrive as JSON maps (`RawElement`). Local writes arrive as
//! `FieldValue`s. Both pass through the same per-type rules so a value read
//! back through `Record::get` looks the same whichever path stored it.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::{Map, Number, Value};

use crate::error::{RemoteError, Result};
use crate::record::Record;
use crate::schema::{LogicalType, PropertyDescriptor, Registry};

/// One element of a provider response, keyed by field name.
pub type RawElement = Map<String, Value>;

const DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// A value coerced to a field's logical type.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    String(String),
    Boolean(bool),
    Int(i64),
    Float(f64),
    Date(NaiveDateTime),
    Object(Box<Record>),
    List(Vec<FieldValue>),
}

impl FieldValue {
    pub fn kind(&self) -> &'static str {
        match self {
            FieldValue::String(_) => "string",
            FieldValue::Boolean(_) => "boolean",
            FieldValue::Int(_) => "int",
            FieldValue::Float(_) => "float",
            FieldValue::Date(_) => "date",
            FieldValue::Object(_) => "object",
            FieldValue::List(_) => "list",
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FieldValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            FieldValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDateTime> {
        match self {
            FieldValue::Date(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<&Record> {
        match self {
            FieldValue::Object(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[FieldValue]> {
        match self {
            FieldValue::List(items) => Some(items),
            _ => None,
        }
    }

    /// Wire form used when a record is serialized back to the provider.
    pub fn to_raw(&self) -> Value {
        match self {
            FieldValue::String(s) => Value::String(s.clone()),
            FieldValue::Boolean(b) => Value::Bool(*b),
            FieldValue::Int(i) => Value::Number((*i).into()),
            FieldValue::Float(f) => Number::from_f64(*f).map_or(Value::Null, Value::Number),
            FieldValue::Date(d) => Value::String(d.format(DATE_FORMAT).to_string()),
            FieldValue::Object(r) => Value::Object(r.to_raw(false)),
            FieldValue::List(items) => Value::Array(items.iter().map(FieldValue::to_raw).collect()),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::String(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::String(s)
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        FieldValue::Boolean(b)
    }
}

impl From<i32> for FieldValue {
    fn from(i: i32) -> Self {
        FieldValue::Int(i.into())
    }
}

impl From<i64> for FieldValue {
    fn from(i: i64) -> Self {
        FieldValue::Int(i)
    }
}

impl From<f64> for FieldValue {
    fn from(f: f64) -> Self {
        FieldValue::Float(f)
    }
}

impl From<NaiveDateTime> for FieldValue {
    fn from(d: NaiveDateTime) -> Self {
        FieldValue::Date(d)
    }
}

impl From<NaiveDate> for FieldValue {
    fn from(d: NaiveDate) -> Self {
        FieldValue::Date(d.and_time(chrono::NaiveTime::default()))
    }
}

impl From<DateTime<Utc>> for FieldValue {
    fn from(d: DateTime<Utc>) -> Self {
        FieldValue::Date(d.naive_utc())
    }
}

impl From<Record> for FieldValue {
    fn from(r: Record) -> Self {
        FieldValue::Object(Box::new(r))
    }
}

impl<T: Into<FieldValue>> From<Vec<T>> for FieldValue {
    fn from(items: Vec<T>) -> Self {
        FieldValue::List(items.into_iter().map(Into::into).collect())
    }
}

/// Coerces a locally supplied value to `desc`'s logical type.
pub(crate) fn coerce(desc: &PropertyDescriptor, value: FieldValue) -> Result<FieldValue> {
    match (desc.is_collection, value) {
        (true, FieldValue::List(items)) => items
            .into_iter()
            .map(|item| coerce_scalar(desc, item))
            .collect::<Result<Vec<_>>>()
            .map(FieldValue::List),
        (true, other) => Err(RemoteError::mismatch(&desc.name, desc.expected(), other.kind())),
        (false, FieldValue::List(_)) => Err(RemoteError::mismatch(&desc.name, desc.expected(), "list")),
        (false, other) => coerce_scalar(desc, other),
    }
}

fn coerce_scalar(desc: &PropertyDescriptor, value: FieldValue) -> Result<FieldValue> {
    let mismatch = |found: &str| RemoteError::mismatch(&desc.name, desc.expected(), found);

    match (desc.logical_type, value) {
        (LogicalType::String, FieldValue::String(s)) => Ok(FieldValue::String(s)),
        (LogicalType::String, FieldValue::Int(i)) => Ok(FieldValue::String(i.to_string())),
        (LogicalType::String, FieldValue::Float(f)) => Ok(FieldValue::String(f.to_string())),
        (LogicalType::String, FieldValue::Boolean(b)) => Ok(FieldValue::String(b.to_string())),

        (LogicalType::Boolean, FieldValue::Boolean(b)) => Ok(FieldValue::Boolean(b)),
        (LogicalType::Boolean, FieldValue::String(s)) => match s.to_ascii_lowercase().as_str() {
            "true" => Ok(FieldValue::Boolean(true)),
            "false" => Ok(FieldValue::Boolean(false)),
            _ => Err(mismatch(&format!("string {s:?}"))),
        },

        (LogicalType::Int, FieldValue::Int(i)) => Ok(FieldValue::Int(i)),
        (LogicalType::Int, FieldValue::Float(f)) => {
            // i64::MAX rounds up to 2^63 as f64, so the upper bound is exclusive.
            if f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 {
                Ok(FieldValue::Int(f as i64))
            } else {
                Err(mismatch(&format!("float {f}")))
            }
        }
        (LogicalType::Int, FieldValue::String(s)) => s
            .trim()
            .parse()
            .map(FieldValue::Int)
            .map_err(|_| mismatch(&format!("string {s:?}"))),

        (LogicalType::Float, FieldValue::Float(f)) if f.is_finite() => Ok(FieldValue::Float(f)),
        (LogicalType::Float, FieldValue::Float(f)) => Err(mismatch(&format!("float {f}"))),
        (LogicalType::Float, FieldValue::Int(i)) => Ok(FieldValue::Float(i as f64)),
        (LogicalType::Float, FieldValue::String(s)) => match s.trim().parse::<f64>() {
            Ok(f) if f.is_finite() => Ok(FieldValue::Float(f)),
            _ => Err(mismatch(&format!("string {s:?}"))),
        },

        (LogicalType::Date, FieldValue::Date(d)) => Ok(FieldValue::Date(d)),
        (LogicalType::Date, FieldValue::String(s)) => parse_date(&s)
            .map(FieldValue::Date)
            .ok_or_else(|| mismatch(&format!("string {s:?}"))),

        (LogicalType::Object, FieldValue::Object(record)) => {
            if desc.nested_type.as_deref() == Some(record.type_name()) {
                Ok(FieldValue::Object(record))
            } else {
                Err(mismatch(record.type_name()))
            }
        }

        (_, other) => Err(mismatch(other.kind())),
    }
}

/// Coerces a raw response value. `Ok(None)` means the provider sent `null`.
pub(crate) fn from_raw(
    registry: &Registry,
    desc: &PropertyDescriptor,
    raw: &Value,
) -> Result<Option<FieldValue>> {
    match (desc.is_collection, raw) {
        (_, Value::Null) => Ok(None),
        (true, Value::Array(items)) => items
            .iter()
            .map(|item| scalar_from_raw(registry, desc, item))
            .collect::<Result<Vec<_>>>()
            .map(|items| Some(FieldValue::List(items))),
        (true, other) => Err(RemoteError::mismatch(&desc.name, desc.expected(), raw_kind(other))),
        (false, Value::Array(_)) => Err(RemoteError::mismatch(&desc.name, desc.expected(), "array")),
        (false, other) => scalar_from_raw(registry, desc, other).map(Some),
    }
}

fn scalar_from_raw(registry: &Registry, desc: &PropertyDescriptor, raw: &Value) -> Result<FieldValue> {
    let value = match raw {
        Value::Object(map) if desc.logical_type == LogicalType::Object => {
            let nested = desc.nested_type.as_deref().unwrap_or_default();
            let mut record = Record::new(registry.record_type(nested)?);
            record.hydrate(registry, map)?;
            return Ok(FieldValue::Object(Box::new(record)));
        }
        Value::String(s) => FieldValue::String(s.clone()),
        Value::Bool(b) => FieldValue::Boolean(*b),
        Value::Number(n) => match n.as_i64() {
            Some(i) => FieldValue::Int(i),
            None => FieldValue::Float(n.as_f64().unwrap_or(f64::NAN)),
        },
        other => {
            return Err(RemoteError::mismatch(&desc.name, desc.expected(), raw_kind(other)));
        }
    };
    coerce_scalar(desc, value)
}

fn raw_kind(raw: &Value) -> &'static str {
    match raw {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "map",
    }
}

/// Parses the date forms the provider emits: `YYYY-MM-DD`,
/// `YYYY-MM-DDTHH:MM:SS[.fff]`, RFC 3339 and `/Date(<millis>[+-hhmm])/`.
/// Offsets are normalized to UTC.
pub fn parse_date(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();

    if let Some(inner) = s.strip_prefix("/Date(").and_then(|r| r.strip_suffix(")/")) {
        // the offset suffix is informational, millis are already UTC
        let end = inner
            .get(1..)
            .and_then(|rest| rest.find(['+', '-']))
            .map_or(inner.len(), |i| i + 1);
        let millis: i64 = inner[..end].parse().ok()?;
        return DateTime::from_timestamp_millis(millis).map(|dt| dt.naive_utc());
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(dt);
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .map(|d| d.and_time(chrono::NaiveTime::default()))
}
