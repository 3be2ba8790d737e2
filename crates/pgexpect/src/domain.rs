use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A parameter of the fake function. `sql_type` is passed to Postgres as-is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Argument {
    pub name: String,
    #[serde(rename = "type")]
    pub sql_type: String,
}

impl Argument {
    pub fn new(name: impl Into<String>, sql_type: impl Into<String>) -> Self {
        Self { name: name.into(), sql_type: sql_type.into() }
    }
}

/// The fake function to install in place of the real one.
///
/// Argument order matters: it fixes the column order of the tracking table
/// and the position of each value in an [`ExpectedCall`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionDescriptor {
    pub name: String,
    #[serde(default)]
    pub args: Vec<Argument>,
    pub return_type: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub raise_error_code: Option<String>,
}

impl FunctionDescriptor {
    pub fn new(name: impl Into<String>, return_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: Vec::new(),
            return_type: return_type.into(),
            body: String::new(),
            raise_error_code: None,
        }
    }

    #[must_use]
    pub fn arg(mut self, name: impl Into<String>, sql_type: impl Into<String>) -> Self {
        self.args.push(Argument::new(name, sql_type));
        self
    }

    #[must_use]
    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    #[must_use]
    pub fn raise_error_code(mut self, code: impl Into<String>) -> Self {
        self.raise_error_code = Some(code.into());
        self
    }

    pub fn from_json(raw: &str) -> serde_json::Result<Self> {
        serde_json::from_str(raw)
    }

    /// Copy of this descriptor with `prefix` placed in front of the body.
    pub(crate) fn with_body_prefix(&self, prefix: &str) -> Self {
        let mut prefixed = self.clone();
        prefixed.body = format!("{prefix}{}", self.body);
        prefixed
    }
}

/// A value a recorded argument is expected to hold. The variant selects the
/// comparison rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExpectedValue {
    Timestamp(DateTime<Utc>),
    Bool(bool),
    Text(String),
    Uint64(u64),
    Int64(i64),
    Int32(i32),
    Int(isize),
    Bytes(Vec<u8>),
}

impl From<DateTime<Utc>> for ExpectedValue {
    fn from(value: DateTime<Utc>) -> Self {
        Self::Timestamp(value)
    }
}

impl From<bool> for ExpectedValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<&str> for ExpectedValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for ExpectedValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<u64> for ExpectedValue {
    fn from(value: u64) -> Self {
        Self::Uint64(value)
    }
}

impl From<i64> for ExpectedValue {
    fn from(value: i64) -> Self {
        Self::Int64(value)
    }
}

impl From<i32> for ExpectedValue {
    fn from(value: i32) -> Self {
        Self::Int32(value)
    }
}

impl From<isize> for ExpectedValue {
    fn from(value: isize) -> Self {
        Self::Int(value)
    }
}

impl From<Vec<u8>> for ExpectedValue {
    fn from(value: Vec<u8>) -> Self {
        Self::Bytes(value)
    }
}

impl From<&[u8]> for ExpectedValue {
    fn from(value: &[u8]) -> Self {
        Self::Bytes(value.to_vec())
    }
}

impl fmt::Display for ExpectedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timestamp(value) => write!(f, "{value}"),
            Self::Bool(value) => write!(f, "{value}"),
            Self::Text(value) => write!(f, "{value}"),
            Self::Uint64(value) => write!(f, "{value}"),
            Self::Int64(value) => write!(f, "{value}"),
            Self::Int32(value) => write!(f, "{value}"),
            Self::Int(value) => write!(f, "{value}"),
            Self::Bytes(value) => write!(f, "{}", String::from_utf8_lossy(value)),
        }
    }
}

/// One expected invocation, positionally aligned with the function's args.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ExpectedCall {
    pub values: Vec<ExpectedValue>,
}

impl ExpectedCall {
    pub fn new<I>(values: I) -> Self
    where
        I: IntoIterator<Item = ExpectedValue>,
    {
        Self { values: values.into_iter().collect() }
    }
}

/// A recorded column value as decoded from the tracking table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActualValue {
    Timestamp(DateTime<Utc>),
    Bool(bool),
    Text(String),
    Int64(i64),
    Int32(i32),
    Bytes(Vec<u8>),
    Null,
}

impl ActualValue {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Timestamp(_) => "timestamp",
            Self::Bool(_) => "boolean",
            Self::Text(_) => "text",
            Self::Int64(_) => "int64",
            Self::Int32(_) => "int32",
            Self::Bytes(_) => "bytes",
            Self::Null => "null",
        }
    }
}

impl fmt::Display for ActualValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timestamp(value) => write!(f, "{value}"),
            Self::Bool(value) => write!(f, "{value}"),
            Self::Text(value) => write!(f, "{value}"),
            Self::Int64(value) => write!(f, "{value}"),
            Self::Int32(value) => write!(f, "{value}"),
            Self::Bytes(value) => write!(f, "{}", String::from_utf8_lossy(value)),
            Self::Null => write!(f, "NULL"),
        }
    }
}

/// One row of the tracking table.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RecordedCall {
    columns: Vec<(String, ActualValue)>,
}

impl RecordedCall {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, column: impl Into<String>, value: ActualValue) -> Self {
        self.push(column, value);
        self
    }

    pub fn push(&mut self, column: impl Into<String>, value: ActualValue) {
        self.columns.push((column.into(), value));
    }

    /// Looks a column up by argument name. Unquoted identifiers are folded to
    /// lower case by Postgres, so the match ignores ASCII case.
    pub fn get(&self, name: &str) -> Option<&ActualValue> {
        self.columns
            .iter()
            .find(|(column, _)| column.eq_ignore_ascii_case(name))
            .map(|(_, value)| value)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_keeps_argument_order() {
        let descriptor = FunctionDescriptor::new("add_user", "void")
            .arg("uid", "bigint")
            .arg("active", "boolean");

        let names: Vec<_> = descriptor.args.iter().map(|arg| arg.name.as_str()).collect();
        assert_eq!(names, vec!["uid", "active"]);
        assert_eq!(descriptor.raise_error_code, None);
    }

    #[test]
    fn body_prefix_leaves_descriptor_unchanged() {
        let descriptor = FunctionDescriptor::new("f", "void").body("PERFORM 1;");
        let prefixed = descriptor.with_body_prefix("INSERT INTO f_calls DEFAULT VALUES;");

        assert_eq!(descriptor.body, "PERFORM 1;");
        assert_eq!(prefixed.body, "INSERT INTO f_calls DEFAULT VALUES;PERFORM 1;");
    }

    #[test]
    fn descriptor_loads_from_json_fixture() {
        let descriptor = FunctionDescriptor::from_json(
            r#"{
                "name": "add_user",
                "args": [{"name": "uid", "type": "bigint"}],
                "return_type": "void",
                "raise_error_code": "P0001"
            }"#,
        )
        .expect("fixture should parse");

        assert_eq!(descriptor.args, vec![Argument::new("uid", "bigint")]);
        assert_eq!(descriptor.body, "");
        assert_eq!(descriptor.raise_error_code.as_deref(), Some("P0001"));
    }

    #[test]
    fn recorded_call_lookup_ignores_case() {
        let call = RecordedCall::new().with("userid", ActualValue::Int64(7));
        assert_eq!(call.get("userId"), Some(&ActualValue::Int64(7)));
        assert_eq!(call.get("other"), None);
    }

    #[test]
    fn expected_values_convert_from_rust_types() {
        let call = ExpectedCall::new([
            42_i64.into(),
            true.into(),
            "abc".into(),
            u64::MAX.into(),
            7_i32.into(),
            3_isize.into(),
            vec![1_u8, 2, 3].into(),
        ]);

        assert_eq!(call.values[0], ExpectedValue::Int64(42));
        assert_eq!(call.values[3], ExpectedValue::Uint64(u64::MAX));
        assert_eq!(call.values[5], ExpectedValue::Int(3));
        assert_eq!(call.values[6], ExpectedValue::Bytes(vec![1, 2, 3]));
    }
}
