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

//! Object metadata validation.
//!
//! Type-specific validators do not check metadata themselves; they call a
//! [`MetadataValidator`], so callers (and tests) can supply their own rules.

use super::field::{ErrorList, FieldError, Path};
use super::names::{
    is_qualified_name, is_valid_label_value, name_is_dns_label, name_is_dns_subdomain,
};
use crate::api::meta::ObjectMeta;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Upper bound on the combined size of all annotation keys and values.
pub const TOTAL_ANNOTATION_SIZE_LIMIT_BYTES: usize = 256 * 1024;

/// ValidateNameFn validates an object name. `prefix` is true when the value is
/// a generateName prefix.
pub type ValidateNameFn = fn(name: &str, prefix: bool) -> Vec<String>;

/// MetadataValidator checks object metadata on create and update.
pub trait MetadataValidator {
    /// Validates metadata of a new object.
    fn validate_object_meta(&self, meta: &ObjectMeta, path: &Path) -> ErrorList;

    /// Validates that an update only changes mutable metadata.
    fn validate_object_meta_update(
        &self,
        new_meta: &ObjectMeta,
        old_meta: &ObjectMeta,
        path: &Path,
    ) -> ErrorList;
}

/// ObjectMetaValidator applies the platform's standard metadata rules.
#[derive(Clone, Copy)]
pub struct ObjectMetaValidator {
    requires_namespace: bool,
    name_fn: ValidateNameFn,
}

impl ObjectMetaValidator {
    /// Validator for cluster-scoped objects.
    pub fn cluster_scoped(name_fn: ValidateNameFn) -> Self {
        Self {
            requires_namespace: false,
            name_fn,
        }
    }

    /// Validator for namespaced objects.
    pub fn namespaced(name_fn: ValidateNameFn) -> Self {
        Self {
            requires_namespace: true,
            name_fn,
        }
    }
}

impl fmt::Debug for ObjectMetaValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectMetaValidator")
            .field("requires_namespace", &self.requires_namespace)
            .finish_non_exhaustive()
    }
}

impl Default for ObjectMetaValidator {
    fn default() -> Self {
        Self::cluster_scoped(name_is_dns_subdomain)
    }
}

impl MetadataValidator for ObjectMetaValidator {
    fn validate_object_meta(&self, meta: &ObjectMeta, path: &Path) -> ErrorList {
        let mut all_errs = ErrorList::new();

        if !meta.generate_name.is_empty() {
            let generate_name_path = path.child("generateName");
            for msg in (self.name_fn)(&meta.generate_name, true) {
                all_errs.push(FieldError::invalid(&generate_name_path, meta.generate_name.as_str(), msg));
            }
        }

        // The server generates the name before validation, so a missing name
        // is an error even when generateName is set.
        let name_path = path.child("name");
        if meta.name.is_empty() {
            all_errs.push(FieldError::required(&name_path, "name or generateName is required"));
        } else {
            for msg in (self.name_fn)(&meta.name, false) {
                all_errs.push(FieldError::invalid(&name_path, meta.name.as_str(), msg));
            }
        }

        let namespace_path = path.child("namespace");
        if self.requires_namespace {
            if meta.namespace.is_empty() {
                all_errs.push(FieldError::required(&namespace_path, ""));
            } else {
                for msg in name_is_dns_label(&meta.namespace, false) {
                    all_errs.push(FieldError::invalid(&namespace_path, meta.namespace.as_str(), msg));
                }
            }
        } else if !meta.namespace.is_empty() {
            all_errs.push(FieldError::forbidden(&namespace_path, "not allowed on this type"));
        }

        if !meta.cluster_name.is_empty() {
            let cluster_name_path = path.child("clusterName");
            for msg in name_is_dns_subdomain(&meta.cluster_name, false) {
                all_errs.push(FieldError::invalid(&cluster_name_path, meta.cluster_name.as_str(), msg));
            }
        }

        if meta.generation < 0 {
            all_errs.push(FieldError::invalid(
                &path.child("generation"),
                meta.generation,
                "must be greater than or equal to 0",
            ));
        }

        all_errs.extend(validate_labels(&meta.labels, &path.child("labels")));
        all_errs.extend(validate_annotations(&meta.annotations, &path.child("annotations")));
        all_errs
    }

    // Labels and annotations of the new object are covered by
    // validate_object_meta, which update validation also runs.
    fn validate_object_meta_update(
        &self,
        new_meta: &ObjectMeta,
        old_meta: &ObjectMeta,
        path: &Path,
    ) -> ErrorList {
        let mut all_errs = ErrorList::new();

        if new_meta.resource_version.is_empty() {
            all_errs.push(FieldError::invalid(
                &path.child("resourceVersion"),
                new_meta.resource_version.as_str(),
                "must be specified for an update",
            ));
        }

        if new_meta.generation < old_meta.generation {
            all_errs.push(FieldError::invalid(
                &path.child("generation"),
                new_meta.generation,
                "must not be decremented",
            ));
        }

        all_errs.extend(validate_immutable_field(&new_meta.name, &old_meta.name, &path.child("name")));
        all_errs.extend(validate_immutable_field(
            &new_meta.namespace,
            &old_meta.namespace,
            &path.child("namespace"),
        ));
        all_errs.extend(validate_immutable_field(&new_meta.uid, &old_meta.uid, &path.child("uid")));
        all_errs.extend(validate_immutable_field(
            &new_meta.creation_timestamp,
            &old_meta.creation_timestamp,
            &path.child("creationTimestamp"),
        ));
        all_errs.extend(validate_immutable_field(
            &new_meta.cluster_name,
            &old_meta.cluster_name,
            &path.child("clusterName"),
        ));
        all_errs
    }
}

/// Returns an Immutable error when `new_value` differs from `old_value`.
pub fn validate_immutable_field<T>(new_value: &T, old_value: &T, path: &Path) -> ErrorList
where
    T: PartialEq + Clone + Into<Value>,
{
    if new_value == old_value {
        return ErrorList::new();
    }
    vec![FieldError::immutable(path, new_value.clone())]
}

/// Validates label keys as qualified names and label values.
pub fn validate_labels(labels: &BTreeMap<String, String>, path: &Path) -> ErrorList {
    let mut all_errs = ErrorList::new();
    for (key, value) in labels {
        for msg in is_qualified_name(key) {
            all_errs.push(FieldError::invalid(path, key.as_str(), msg));
        }
        for msg in is_valid_label_value(value) {
            all_errs.push(FieldError::invalid(path, value.as_str(), msg));
        }
    }
    all_errs
}

/// Validates annotation keys and the total annotation size.
pub fn validate_annotations(annotations: &BTreeMap<String, String>, path: &Path) -> ErrorList {
    let mut all_errs = ErrorList::new();
    let mut total_size = 0usize;
    for (key, value) in annotations {
        for msg in is_qualified_name(&key.to_lowercase()) {
            all_errs.push(FieldError::invalid(path, key.as_str(), msg));
        }
        total_size += key.len() + value.len();
    }
    if total_size > TOTAL_ANNOTATION_SIZE_LIMIT_BYTES {
        all_errs.push(FieldError::too_long(path, TOTAL_ANNOTATION_SIZE_LIMIT_BYTES));
    }
    all_errs
}
