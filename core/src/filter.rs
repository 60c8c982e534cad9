//! Filter expression builder for the provider's `where` grammar.
//!
//! # Design
//! Conditions are rendered to text as soon as they are added and stored as a
//! flat token list with the joining operators interleaved, so `render` is a
//! plain join. The provider distinguishes numeric, boolean, string and GUID
//! literals syntactically, which is why two-argument conditions go through a
//! fixed classification order in `compare`.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use uuid::Uuid;

static BOOLEAN_LITERAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)^(['"]?)(true|false)(['"]?)$"#).expect("valid regex"));

/// Operator joining a condition to the ones before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoolOp {
    And,
    Or,
}

impl fmt::Display for BoolOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoolOp::And => f.write_str("AND"),
            BoolOp::Or => f.write_str("OR"),
        }
    }
}

/// Right-hand side of a `field, value` condition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterValue {
    Bool(bool),
    Int(i64),
    Text(String),
}

impl From<bool> for FilterValue {
    fn from(b: bool) -> Self {
        FilterValue::Bool(b)
    }
}

impl From<i32> for FilterValue {
    fn from(i: i32) -> Self {
        FilterValue::Int(i.into())
    }
}

impl From<i64> for FilterValue {
    fn from(i: i64) -> Self {
        FilterValue::Int(i)
    }
}

impl From<u32> for FilterValue {
    fn from(i: u32) -> Self {
        FilterValue::Int(i.into())
    }
}

/// Values past `i64::MAX` have no integer literal and compare as strings.
impl From<u64> for FilterValue {
    fn from(i: u64) -> Self {
        i64::try_from(i).map_or_else(|_| FilterValue::Text(i.to_string()), FilterValue::Int)
    }
}

impl From<usize> for FilterValue {
    fn from(i: usize) -> Self {
        i64::try_from(i).map_or_else(|_| FilterValue::Text(i.to_string()), FilterValue::Int)
    }
}

/// Floats have no literal form of their own and compare as strings.
impl From<f64> for FilterValue {
    fn from(f: f64) -> Self {
        FilterValue::Text(f.to_string())
    }
}

impl From<&str> for FilterValue {
    fn from(s: &str) -> Self {
        FilterValue::Text(s.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(s: String) -> Self {
        FilterValue::Text(s)
    }
}

impl From<&String> for FilterValue {
    fn from(s: &String) -> Self {
        FilterValue::Text(s.clone())
    }
}

impl From<Uuid> for FilterValue {
    fn from(id: Uuid) -> Self {
        FilterValue::Text(id.hyphenated().to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    /// `field` compared to a literal, classified by `compare`.
    Compare { field: String, value: FilterValue },
    /// Emitted verbatim. The caller owns its grammar.
    Raw(String),
}

impl Condition {
    pub fn compare(field: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        Condition::Compare {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn raw(fragment: impl Into<String>) -> Self {
        Condition::Raw(fragment.into())
    }

    pub fn render(&self) -> String {
        match self {
            Condition::Compare { field, value } => compare(field, value),
            Condition::Raw(fragment) => fragment.clone(),
        }
    }
}

/// Accumulates conditions into a `where` expression.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterBuilder {
    tokens: Vec<String>,
}

impl FilterBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `condition`, preceded by `op` unless it is the first one.
    pub fn add_condition(&mut self, op: BoolOp, condition: Condition) -> &mut Self {
        if !self.tokens.is_empty() {
            self.tokens.push(op.to_string());
        }
        self.tokens.push(condition.render());
        self
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn render(&self) -> String {
        self.tokens.join(" ")
    }
}

/// Renders `field` compared to `value` using the literal form the provider
/// expects. First match wins:
/// booleans, integers, pre-formatted boolean text, GUIDs on a
/// `<Name>.<Name>ID` field, then quoted strings.
pub fn compare(field: &str, value: &FilterValue) -> String {
    match value {
        FilterValue::Bool(b) => format!("{field}={b}"),
        FilterValue::Int(i) => format!("{field}=={i}"),
        FilterValue::Text(s) if BOOLEAN_LITERAL.is_match(s) => format!("{field}={s}"),
        FilterValue::Text(s) if is_self_identity(field) && is_guid(s) => {
            format!("{field}=Guid(\"{s}\")")
        }
        FilterValue::Text(s) => format!("{field}==\"{s}\""),
    }
}

/// `Contact.ContactID`: an alphabetic name, a dot, the same name (ignoring
/// case) and `ID`.
fn is_self_identity(field: &str) -> bool {
    let Some((name, rest)) = field.split_once('.') else {
        return false;
    };
    if name.is_empty() || !name.bytes().all(|b| b.is_ascii_alphabetic()) {
        return false;
    }
    match (rest.get(..name.len()), rest.get(name.len()..)) {
        (Some(repeat), Some(suffix)) => {
            repeat.eq_ignore_ascii_case(name) && suffix.eq_ignore_ascii_case("ID")
        }
        _ => false,
    }
}

/// Hyphenated 8-4-4-4-12 form only.
fn is_guid(s: &str) -> bool {
    s.len() == 36 && Uuid::try_parse(s).is_ok()
}
