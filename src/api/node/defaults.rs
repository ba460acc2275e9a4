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

//! Defaulting for RuntimeClass objects.

use super::{Overhead, RuntimeClass, RuntimeClassList};
use crate::api::core::{ResourceList, ResourceRequirements};
use tracing::trace;

/// Fills in an incomplete overhead so that requests and limits name the same
/// resources.
///
/// An absent `pod_fixed` becomes empty requests and limits. Otherwise each
/// resource present on only one side is copied to the other; resources set
/// on both sides are never changed, even when the values differ.
pub fn set_defaults_overhead(overhead: &mut Overhead) {
    // Unlike container requirements, an unbounded limit makes no sense for
    // overhead, so a missing limit takes the request and vice versa.
    let pod_fixed = overhead
        .pod_fixed
        .get_or_insert_with(ResourceRequirements::default);
    let limits = pod_fixed.limits.get_or_insert_with(ResourceList::new);
    let requests = pod_fixed.requests.get_or_insert_with(ResourceList::new);

    for (name, value) in limits.iter() {
        if !requests.contains_key(name) {
            trace!(resource = %name, value = %value, "defaulting overhead request to limit");
            requests.insert(name.clone(), value.clone());
        }
    }
    for (name, value) in requests.iter() {
        if !limits.contains_key(name) {
            trace!(resource = %name, value = %value, "defaulting overhead limit to request");
            limits.insert(name.clone(), value.clone());
        }
    }
}

/// Applies all defaults to a RuntimeClass. An absent overhead stays absent.
pub fn set_object_defaults_runtime_class(runtime_class: &mut RuntimeClass) {
    if let Some(overhead) = runtime_class.overhead.as_mut() {
        set_defaults_overhead(overhead);
    }
}

/// Applies all defaults to every item of a RuntimeClassList.
pub fn set_object_defaults_runtime_class_list(list: &mut RuntimeClassList) {
    for item in list.items.iter_mut() {
        set_object_defaults_runtime_class(item);
    }
}
