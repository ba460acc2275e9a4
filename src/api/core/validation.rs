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

//! Validation of resource names, quantities and requirements.

use super::{ResourceList, ResourceName, ResourceRequirements};
use crate::api::resource::Quantity;
use crate::validation::field::{ErrorList, FieldError, Path};
use crate::validation::names::is_qualified_name;

/// Validates a resource name: a qualified name that is either a standard
/// resource or carries a domain prefix.
pub fn validate_resource_name(name: &ResourceName, path: &Path) -> ErrorList {
    let mut all_errs = ErrorList::new();
    for msg in is_qualified_name(name.as_str()) {
        all_errs.push(FieldError::invalid(path, name.as_str(), msg));
    }
    if !all_errs.is_empty() {
        return all_errs;
    }

    if !name.as_str().contains('/') && !name.is_standard() {
        all_errs.push(FieldError::invalid(
            path,
            name.as_str(),
            "must be a standard resource type or fully qualified",
        ));
    }
    all_errs
}

/// Validates a resource name used in container-style requirements.
pub fn validate_container_resource_name(name: &ResourceName, path: &Path) -> ErrorList {
    let mut all_errs = validate_resource_name(name, path);
    if !name.as_str().contains('/') {
        if !name.is_standard_container_resource() {
            all_errs.push(FieldError::invalid(
                path,
                name.as_str(),
                "must be a standard resource for containers",
            ));
        }
    } else if !name.is_native() && !name.is_extended() {
        all_errs.push(FieldError::invalid(
            path,
            name.as_str(),
            "doesn't follow extended resource name standard",
        ));
    }
    all_errs
}

/// Validates that a quantity is not negative.
pub fn validate_nonnegative_quantity(value: &Quantity, path: &Path) -> ErrorList {
    if value.sign() < 0 {
        return vec![FieldError::invalid(
            path,
            value.to_string(),
            "must be greater than or equal to 0",
        )];
    }
    ErrorList::new()
}

/// Validates a quantity for the given resource: non-negative, and a whole
/// number for resources that are counted.
pub fn validate_resource_quantity_value(
    name: &ResourceName,
    value: &Quantity,
    path: &Path,
) -> ErrorList {
    let mut all_errs = validate_nonnegative_quantity(value, path);
    if name.is_integer() && !value.is_integer() {
        all_errs.push(FieldError::invalid(path, value.to_string(), "must be an integer"));
    }
    all_errs
}

fn validate_resource_list(list: Option<&ResourceList>, path: &Path) -> ErrorList {
    let mut all_errs = ErrorList::new();
    for (name, quantity) in list.into_iter().flatten() {
        let entry_path = path.key(name.as_str());
        all_errs.extend(validate_container_resource_name(name, &entry_path));
        all_errs.extend(validate_resource_quantity_value(name, quantity, &entry_path));
    }
    all_errs
}

/// Validates compute resource requirements.
///
/// Every entry of both lists is checked on its own; an absent list has no
/// entries. Resources present in both lists must request no more than
/// their limit. The two lists do not need to have the same keys.
pub fn validate_resource_requirements(requirements: &ResourceRequirements, path: &Path) -> ErrorList {
    let limits_path = path.child("limits");
    let requests_path = path.child("requests");

    let mut all_errs = validate_resource_list(requirements.limits.as_ref(), &limits_path);
    all_errs.extend(validate_resource_list(requirements.requests.as_ref(), &requests_path));

    if let (Some(requests), Some(limits)) = (&requirements.requests, &requirements.limits) {
        for (name, request) in requests {
            let Some(limit) = limits.get(name) else {
                continue;
            };
            if request > limit {
                all_errs.push(FieldError::invalid(
                    &requests_path.key(name.as_str()),
                    request.to_string(),
                    format!("must be less than or equal to {} limit of {}", name, limit),
                ));
            }
        }
    }
    all_errs
}
