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

//! Admission plugin traits and the operation filter they share.

use super::attributes::Attributes;
use super::errors::AdmissionResult;
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

/// Operation is the type of request being admitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Create,
    Update,
    Delete,
    Connect,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Create => "CREATE",
            Operation::Update => "UPDATE",
            Operation::Delete => "DELETE",
            Operation::Connect => "CONNECT",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "CREATE" => Ok(Operation::Create),
            "UPDATE" => Ok(Operation::Update),
            "DELETE" => Ok(Operation::Delete),
            "CONNECT" => Ok(Operation::Connect),
            _ => Err(format!("unknown admission operation {:?}", s)),
        }
    }
}

/// Interface is implemented by every admission plugin.
pub trait Interface: Send + Sync {
    /// Returns true if this plugin acts on the given operation.
    fn handles(&self, operation: Operation) -> bool;
}

/// MutationInterface is implemented by plugins that may change the object.
pub trait MutationInterface: Interface {
    fn admit(&self, attributes: &mut dyn Attributes) -> AdmissionResult<()>;
}

/// ValidationInterface is implemented by plugins that accept or reject the
/// object without changing it.
pub trait ValidationInterface: Interface {
    fn validate(&self, attributes: &dyn Attributes) -> AdmissionResult<()>;
}

/// Handler answers `handles` from a fixed set of operations.
#[derive(Debug, Clone)]
pub struct Handler {
    operations: HashSet<Operation>,
}

impl Handler {
    pub fn new(operations: &[Operation]) -> Self {
        Self {
            operations: operations.iter().copied().collect(),
        }
    }

    /// Handler for plugins that act on writes of whole objects.
    pub fn new_create_update() -> Self {
        Self::new(&[Operation::Create, Operation::Update])
    }
}

impl Interface for Handler {
    fn handles(&self, operation: Operation) -> bool {
        self.operations.contains(&operation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_parse_and_display() {
        for op in [Operation::Create, Operation::Update, Operation::Delete, Operation::Connect] {
            assert_eq!(op.to_string().parse::<Operation>(), Ok(op));
        }
        assert_eq!("update".parse::<Operation>(), Ok(Operation::Update));
        assert!("PATCH".parse::<Operation>().is_err());
    }

    #[test]
    fn test_handler_create_update() {
        let handler = Handler::new_create_update();
        assert!(handler.handles(Operation::Create));
        assert!(handler.handles(Operation::Update));
        assert!(!handler.handles(Operation::Delete));
        assert!(!handler.handles(Operation::Connect));
    }
}
