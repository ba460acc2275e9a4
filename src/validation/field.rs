// Copyright 2024 The Kubernetes Authors.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Field paths and field-level validation errors.

use serde_json::Value;
use std::fmt;

/// ErrorList holds a set of field errors, in the order they were found.
pub type ErrorList = Vec<FieldError>;

// ============================================================================
// Path
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Field(String),
    Key(String),
}

/// Path identifies a field inside an object, e.g. `overhead.requests[cpu]`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Path {
    segments: Vec<Segment>,
}

impl Path {
    /// Create a root path with the given field name.
    pub fn new(name: &str) -> Self {
        Self {
            segments: vec![Segment::Field(name.to_string())],
        }
    }

    /// Returns a new path for a named child field.
    pub fn child(&self, name: &str) -> Path {
        self.with(Segment::Field(name.to_string()))
    }

    /// Returns a new path for a map key.
    pub fn key(&self, key: &str) -> Path {
        self.with(Segment::Key(key.to_string()))
    }

    fn with(&self, segment: Segment) -> Path {
        let mut segments = self.segments.clone();
        segments.push(segment);
        Path { segments }
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            match segment {
                Segment::Field(name) if i == 0 => write!(f, "{}", name)?,
                Segment::Field(name) => write!(f, ".{}", name)?,
                Segment::Key(key) => write!(f, "[{}]", key)?,
            }
        }
        Ok(())
    }
}

// ============================================================================
// FieldError
// ============================================================================

/// ErrorType classifies a field error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorType {
    /// NotFound indicates a referenced value could not be found.
    NotFound,
    /// Required indicates a required field is missing or empty.
    Required,
    /// Duplicate indicates a value that must be unique was repeated.
    Duplicate,
    /// Invalid indicates a value that fails a syntax or semantic check.
    Invalid,
    /// Immutable indicates an update changed a field that cannot change.
    Immutable,
    /// NotSupported indicates the value is not in the list of supported values.
    NotSupported,
    /// Forbidden indicates the field may not be set in this context.
    Forbidden,
    /// TooLong indicates the value exceeds a length limit.
    TooLong,
}

impl ErrorType {
    /// Returns the human-readable form used in error messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorType::NotFound => "Not found",
            ErrorType::Required => "Required value",
            ErrorType::Duplicate => "Duplicate value",
            // Immutable fields are reported the same way as other invalid values.
            ErrorType::Invalid | ErrorType::Immutable => "Invalid value",
            ErrorType::NotSupported => "Unsupported value",
            ErrorType::Forbidden => "Forbidden",
            ErrorType::TooLong => "Too long",
        }
    }
}

impl fmt::Display for ErrorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// FieldError represents a problem with a single field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldError {
    pub error_type: ErrorType,
    pub field: String,
    pub bad_value: Value,
    pub detail: String,
}

impl FieldError {
    fn new(error_type: ErrorType, path: &Path, bad_value: Value, detail: impl Into<String>) -> Self {
        Self {
            error_type,
            field: path.to_string(),
            bad_value,
            detail: detail.into(),
        }
    }

    /// A required field is missing.
    pub fn required(path: &Path, detail: impl Into<String>) -> Self {
        Self::new(ErrorType::Required, path, Value::Null, detail)
    }

    /// A field has an invalid value.
    pub fn invalid(path: &Path, value: impl Into<Value>, detail: impl Into<String>) -> Self {
        Self::new(ErrorType::Invalid, path, value.into(), detail)
    }

    /// An update changed a field that must not change.
    pub fn immutable(path: &Path, value: impl Into<Value>) -> Self {
        Self::new(ErrorType::Immutable, path, value.into(), FIELD_IMMUTABLE)
    }

    /// A field may not be set.
    pub fn forbidden(path: &Path, detail: impl Into<String>) -> Self {
        Self::new(ErrorType::Forbidden, path, Value::Null, detail)
    }

    /// A value exceeds `max_length`.
    pub fn too_long(path: &Path, max_length: usize) -> Self {
        Self::new(
            ErrorType::TooLong,
            path,
            Value::Null,
            format!("must have at most {} bytes", max_length),
        )
    }


    /// Returns the message without the field prefix.
    pub fn error_body(&self) -> String {
        let mut body = match self.error_type {
            ErrorType::Required | ErrorType::Forbidden | ErrorType::TooLong => {
                self.error_type.to_string()
            }
            _ => match &self.bad_value {
                Value::String(s) => format!("{}: {:?}", self.error_type, s),
                other => format!("{}: {}", self.error_type, other),
            },
        };
        if !self.detail.is_empty() {
            body.push_str(": ");
            body.push_str(&self.detail);
        }
        body
    }
}

/// Detail reported for changes to immutable fields.
pub const FIELD_IMMUTABLE: &str = "field is immutable";

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.error_body())
    }
}

impl std::error::Error for FieldError {}

/// Renders a list of errors as a single message; more than one error is
/// wrapped in brackets.
pub fn aggregate_message(errors: &[FieldError]) -> String {
    match errors {
        [] => String::new(),
        [single] => single.to_string(),
        many => {
            let messages: Vec<String> = many.iter().map(|e| e.to_string()).collect();
            format!("[{}]", messages.join(", "))
        }
    }
}
