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

//! Core API types shared across groups: resource names, resource lists and
//! compute resource requirements.

pub mod validation;

use crate::api::resource::Quantity;
use crate::validation::names::is_qualified_name;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::borrow::Borrow;
use std::collections::BTreeMap;
use std::fmt;

/// ApiObject is a trait for API objects that can be passed through admission.
pub trait ApiObject: Send + Sync {
    /// Returns the object as Any for downcasting.
    fn as_any(&self) -> &dyn Any;

    /// Returns the object as mutable Any for downcasting.
    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// Returns the kind of this object.
    fn kind(&self) -> &str;
}

// ============================================================================
// Resource names
// ============================================================================

/// CPU, in cores.
pub const RESOURCE_CPU: &str = "cpu";
/// Memory, in bytes.
pub const RESOURCE_MEMORY: &str = "memory";
/// Volume size, in bytes.
pub const RESOURCE_STORAGE: &str = "storage";
/// Local ephemeral storage, in bytes.
pub const RESOURCE_EPHEMERAL_STORAGE: &str = "ephemeral-storage";
/// Number of pods.
pub const RESOURCE_PODS: &str = "pods";

/// Prefix of huge page resources, e.g. `hugepages-2Mi`.
pub const RESOURCE_HUGE_PAGES_PREFIX: &str = "hugepages-";
/// Prefix of quota resources that constrain requests.
pub const RESOURCE_REQUESTS_PREFIX: &str = "requests.";
/// Prefix of quota resources that constrain limits.
pub const RESOURCE_LIMITS_PREFIX: &str = "limits.";
/// Namespace of resource names owned by the platform itself.
pub const RESOURCE_DEFAULT_NAMESPACE_PREFIX: &str = "kubernetes.io/";

const STANDARD_CONTAINER_RESOURCES: [&str; 3] =
    [RESOURCE_CPU, RESOURCE_MEMORY, RESOURCE_EPHEMERAL_STORAGE];

const STANDARD_RESOURCES: [&str; 19] = [
    RESOURCE_CPU,
    RESOURCE_MEMORY,
    RESOURCE_EPHEMERAL_STORAGE,
    "requests.cpu",
    "requests.memory",
    "requests.ephemeral-storage",
    "limits.cpu",
    "limits.memory",
    "limits.ephemeral-storage",
    RESOURCE_PODS,
    "quota",
    "services",
    "replicationcontrollers",
    "resourcequotas",
    "secrets",
    "configmaps",
    "persistentvolumeclaims",
    RESOURCE_STORAGE,
    "requests.storage",
];

const INTEGER_RESOURCES: [&str; 10] = [
    RESOURCE_PODS,
    "quota",
    "services",
    "replicationcontrollers",
    "resourcequotas",
    "secrets",
    "configmaps",
    "persistentvolumeclaims",
    "services.nodeports",
    "services.loadbalancers",
];

/// ResourceName is the name identifying a resource dimension, such as `cpu`
/// or `example.com/gpu`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceName(String);

impl ResourceName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true for names without a domain prefix, or within the
    /// `kubernetes.io/` namespace.
    pub fn is_native(&self) -> bool {
        !self.0.contains('/') || self.0.contains(RESOURCE_DEFAULT_NAMESPACE_PREFIX)
    }

    /// Returns true for huge page resources such as `hugepages-2Mi`.
    pub fn is_huge_pages(&self) -> bool {
        self.0.starts_with(RESOURCE_HUGE_PAGES_PREFIX)
    }

    /// Extended resources are fully qualified names outside the
    /// `kubernetes.io/` namespace.
    pub fn is_extended(&self) -> bool {
        if self.is_native() || self.0.starts_with(RESOURCE_REQUESTS_PREFIX) {
            return false;
        }
        // The quota form of the name must also be valid.
        is_qualified_name(&format!("{}{}", RESOURCE_REQUESTS_PREFIX, self.0)).is_empty()
    }

    /// Returns true for resources a container may request.
    pub fn is_standard_container_resource(&self) -> bool {
        STANDARD_CONTAINER_RESOURCES.contains(&self.as_str()) || self.is_huge_pages()
    }

    /// Returns true for every built-in resource name, including quota names.
    pub fn is_standard(&self) -> bool {
        STANDARD_RESOURCES.contains(&self.as_str())
            || self.is_huge_pages()
            || self
                .0
                .strip_prefix(RESOURCE_REQUESTS_PREFIX)
                .is_some_and(|rest| rest.starts_with(RESOURCE_HUGE_PAGES_PREFIX))
    }

    /// Returns true for resources whose quantities must be whole numbers.
    pub fn is_integer(&self) -> bool {
        INTEGER_RESOURCES.contains(&self.as_str()) || self.is_extended()
    }
}

impl Borrow<str> for ResourceName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ResourceName {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl From<String> for ResourceName {
    fn from(name: String) -> Self {
        Self(name)
    }
}

impl fmt::Display for ResourceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// Resource lists and requirements
// ============================================================================

/// ResourceList maps resource names to quantities.
pub type ResourceList = BTreeMap<ResourceName, Quantity>;

/// ResourceRequirements describes compute resource requests and limits.
///
/// An absent list (`None`) is distinct from a present but empty one.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceRequirements {
    /// Limits describes the maximum amount of compute resources allowed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limits: Option<ResourceList>,
    /// Requests describes the minimum amount of compute resources required.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requests: Option<ResourceList>,
}

impl ResourceRequirements {
    /// Requirements with only requests set.
    pub fn with_requests(requests: ResourceList) -> Self {
        Self {
            limits: None,
            requests: Some(requests),
        }
    }

    /// Requirements with only limits set.
    pub fn with_limits(limits: ResourceList) -> Self {
        Self {
            limits: Some(limits),
            requests: None,
        }
    }
}
