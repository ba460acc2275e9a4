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

//! Admission error types.

use crate::validation::field::{aggregate_message, ErrorList};
use thiserror::Error;

/// Result type for admission operations.
pub type AdmissionResult<T> = Result<T, AdmissionError>;

/// AdmissionError is returned when a request cannot be admitted.
#[derive(Debug, Error)]
pub enum AdmissionError {
    /// BadRequest indicates a malformed request or configuration.
    #[error("{0}")]
    BadRequest(String),

    /// Invalid carries every field error found on the object.
    #[error("{kind} {name:?} is invalid: {}", aggregate_message(.errors))]
    Invalid {
        kind: String,
        name: String,
        errors: ErrorList,
    },
}

impl AdmissionError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        AdmissionError::BadRequest(msg.into())
    }

    /// Create an Invalid error. `kind` is the group-qualified kind, e.g.
    /// `RuntimeClass.node.k8s.io`.
    pub fn invalid(kind: impl Into<String>, name: impl Into<String>, errors: ErrorList) -> Self {
        AdmissionError::Invalid {
            kind: kind.into(),
            name: name.into(),
            errors,
        }
    }

    /// Returns the field errors of an Invalid error.
    pub fn field_errors(&self) -> &[crate::validation::field::FieldError] {
        match self {
            AdmissionError::Invalid { errors, .. } => errors,
            _ => &[],
        }
    }
}
