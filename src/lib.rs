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

//! Defaulting and validation of `node.k8s.io` RuntimeClass objects.
//!
//! The overhead defaulter completes a pod overhead so that requests and
//! limits name the same resources. The validators check a RuntimeClass on
//! create and update and report every problem as a field error. The
//! `RuntimeClassStrategy` plugin runs both on admission requests.

pub mod admission;
pub mod api;
pub mod plugins;
pub mod validation;

pub use admission::{
    AdmissionError, AdmissionResult, Attributes, AttributesRecord, Interface, MutationInterface,
    Operation, ValidationInterface,
};
pub use api::node::defaults::{
    set_defaults_overhead, set_object_defaults_runtime_class, set_object_defaults_runtime_class_list,
};
pub use api::node::validation::{
    validate_overhead, validate_runtime_class, validate_runtime_class_update, RuntimeClassValidator,
};
pub use api::node::{Overhead, RuntimeClass, RuntimeClassList};
pub use api::resource::Quantity;
pub use validation::{ErrorList, ErrorType, FieldError, MetadataValidator, ObjectMetaValidator, Path};
