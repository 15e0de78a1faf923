//! Field-level validation errors, rendered the way the Kubernetes API server
//! renders them so they can be surfaced verbatim in events and status.

use std::fmt;
use thiserror::Error;

/// A path to a field within a resource, e.g. `spec.listeners[0].port`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Path(String);

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Required,
    Invalid,
    Duplicate,
    Forbidden,
    NotSupported,
    NotFound,
}

/// Whether an error is confined to the element itself or arises from the
/// element's interaction with elements accepted before it.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ErrorClass {
    Structural,
    Conflict,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Value {
    Str(String),
    Int(i64),
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("{path}: {kind}{}{}", value_suffix(.kind, .value), detail_suffix(.detail))]
pub struct FieldError {
    pub kind: ErrorKind,
    pub class: ErrorClass,
    pub path: Path,
    pub value: Option<Value>,
    pub detail: String,
}

/// Errors collected over a validation pass, in the order found.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ErrorList(Vec<FieldError>);

/// A non-empty [`ErrorList`] reported as a single error. Repeated messages
/// are reported once.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("{}", join_messages(.0))]
pub struct AggregateError(Vec<FieldError>);

// === impl Path ===

impl Path {
    pub fn new(root: &str) -> Self {
        Self(root.to_string())
    }

    pub fn child(&self, name: &str) -> Self {
        Self(format!("{}.{}", self.0, name))
    }

    pub fn index(&self, i: usize) -> Self {
        Self(format!("{}[{}]", self.0, i))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// === impl ErrorKind ===

impl ErrorKind {
    fn as_str(&self) -> &'static str {
        match self {
            Self::Required => "Required value",
            Self::Invalid => "Invalid value",
            Self::Duplicate => "Duplicate value",
            Self::Forbidden => "Forbidden",
            Self::NotSupported => "Unsupported value",
            Self::NotFound => "Not found",
        }
    }

    /// Kinds whose message omits the offending value.
    fn omits_value(&self) -> bool {
        matches!(self, Self::Required | Self::Forbidden)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// === impl Value ===

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Self::Int(n.into())
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Str(s) => write!(f, "{s:?}"),
            Self::Int(n) => write!(f, "{n}"),
        }
    }
}

// === impl FieldError ===

impl FieldError {
    fn new(kind: ErrorKind, path: Path, value: Option<Value>, detail: impl Into<String>) -> Self {
        Self {
            kind,
            class: ErrorClass::Structural,
            path,
            value,
            detail: detail.into(),
        }
    }

    pub fn required(path: Path, detail: impl Into<String>) -> Self {
        Self::new(ErrorKind::Required, path, None, detail)
    }

    pub fn invalid(path: Path, value: impl Into<Value>, detail: impl Into<String>) -> Self {
        Self::new(ErrorKind::Invalid, path, Some(value.into()), detail)
    }

    pub fn duplicate(path: Path, value: impl Into<Value>) -> Self {
        Self::new(ErrorKind::Duplicate, path, Some(value.into()), "")
    }

    pub fn forbidden(path: Path, detail: impl Into<String>) -> Self {
        Self::new(ErrorKind::Forbidden, path, None, detail)
    }

    pub fn not_supported(path: Path, value: impl Into<Value>, supported: &[&str]) -> Self {
        let detail = supported
            .iter()
            .map(|s| format!("{s:?}"))
            .collect::<Vec<_>>()
            .join(", ");
        Self::new(
            ErrorKind::NotSupported,
            path,
            Some(value.into()),
            format!("supported values: {detail}"),
        )
    }

    pub fn not_found(path: Path, value: impl Into<Value>) -> Self {
        Self::new(ErrorKind::NotFound, path, Some(value.into()), "")
    }

    /// Marks the error as arising from a conflict with another element.
    pub fn conflict(mut self) -> Self {
        self.class = ErrorClass::Conflict;
        self
    }
}

fn value_suffix(kind: &ErrorKind, value: &Option<Value>) -> String {
    match value {
        Some(value) if !kind.omits_value() => format!(": {value}"),
        _ => String::new(),
    }
}

fn detail_suffix(detail: &str) -> String {
    if detail.is_empty() {
        return String::new();
    }
    format!(": {detail}")
}

// === impl ErrorList ===

impl ErrorList {
    pub fn push(&mut self, error: FieldError) {
        self.0.push(error);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FieldError> {
        self.0.iter()
    }

    /// Folds the list into a single error, if any errors were found.
    pub fn into_result(self) -> Result<(), AggregateError> {
        if self.0.is_empty() {
            return Ok(());
        }
        Err(AggregateError(self.0))
    }
}

impl From<Vec<FieldError>> for ErrorList {
    fn from(errors: Vec<FieldError>) -> Self {
        Self(errors)
    }
}

impl Extend<FieldError> for ErrorList {
    fn extend<I: IntoIterator<Item = FieldError>>(&mut self, iter: I) {
        self.0.extend(iter)
    }
}

impl IntoIterator for ErrorList {
    type Item = FieldError;
    type IntoIter = std::vec::IntoIter<FieldError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a ErrorList {
    type Item = &'a FieldError;
    type IntoIter = std::slice::Iter<'a, FieldError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

// === impl AggregateError ===

impl AggregateError {
    pub fn errors(&self) -> &[FieldError] {
        &self.0
    }
}

fn join_messages(errors: &[FieldError]) -> String {
    let mut msgs: Vec<String> = Vec::with_capacity(errors.len());
    for msg in errors.iter().map(ToString::to_string) {
        if !msgs.contains(&msg) {
            msgs.push(msg);
        }
    }

    match msgs.as_slice() {
        [msg] => msg.clone(),
        _ => format!("[{}]", msgs.join(", ")),
    }
}
