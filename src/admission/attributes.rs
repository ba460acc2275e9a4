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

//! Attributes of a write request under admission.

use super::interfaces::Operation;
use crate::api::core::ApiObject;
use crate::api::node::{RuntimeClass, GROUP_NAME, RUNTIME_CLASS_KIND, RUNTIME_CLASS_RESOURCE};

/// Served version of the node.k8s.io group.
const NODE_VERSION: &str = "v1";

/// GroupVersionResource identifies a resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GroupVersionResource {
    pub group: String,
    pub version: String,
    pub resource: String,
}

impl GroupVersionResource {
    pub fn new(group: &str, version: &str, resource: &str) -> Self {
        Self {
            group: group.to_string(),
            version: version.to_string(),
            resource: resource.to_string(),
        }
    }

    /// True when group and resource match, regardless of version.
    pub fn is(&self, group: &str, resource: &str) -> bool {
        self.group == group && self.resource == resource
    }
}

/// GroupVersionKind identifies a kind.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GroupVersionKind {
    pub group: String,
    pub version: String,
    pub kind: String,
}

impl GroupVersionKind {
    pub fn new(group: &str, version: &str, kind: &str) -> Self {
        Self {
            group: group.to_string(),
            version: version.to_string(),
            kind: kind.to_string(),
        }
    }

    /// Kind qualified by its group, e.g. `RuntimeClass.node.k8s.io`.
    pub fn group_kind(&self) -> String {
        if self.group.is_empty() {
            self.kind.clone()
        } else {
            format!("{}.{}", self.kind, self.group)
        }
    }
}

/// Attributes describes a request to a plugin.
pub trait Attributes {
    /// Name of the object as presented in the request.
    fn get_name(&self) -> &str;

    /// Namespace of the request; empty for cluster-scoped resources.
    fn get_namespace(&self) -> &str;

    fn get_resource(&self) -> &GroupVersionResource;

    fn get_subresource(&self) -> &str;

    fn get_operation(&self) -> Operation;

    /// The incoming object.
    fn get_object(&self) -> Option<&dyn ApiObject>;

    fn get_object_mut(&mut self) -> Option<&mut (dyn ApiObject + 'static)>;

    /// The stored object; only populated for updates.
    fn get_old_object(&self) -> Option<&dyn ApiObject>;

    fn get_kind(&self) -> &GroupVersionKind;
}

/// AttributesRecord is the plain data implementation of Attributes.
pub struct AttributesRecord {
    pub name: String,
    pub namespace: String,
    pub resource: GroupVersionResource,
    pub subresource: String,
    pub operation: Operation,
    pub object: Option<Box<dyn ApiObject>>,
    pub old_object: Option<Box<dyn ApiObject>>,
    pub kind: GroupVersionKind,
}

impl AttributesRecord {
    /// Attributes for a write of a RuntimeClass. The name is taken from the
    /// incoming object.
    pub fn new_runtime_class(
        operation: Operation,
        runtime_class: RuntimeClass,
        old_runtime_class: Option<RuntimeClass>,
    ) -> Self {
        Self {
            name: runtime_class.name().to_string(),
            namespace: String::new(),
            resource: GroupVersionResource::new(GROUP_NAME, NODE_VERSION, RUNTIME_CLASS_RESOURCE),
            subresource: String::new(),
            operation,
            object: Some(Box::new(runtime_class)),
            old_object: old_runtime_class.map(|rc| Box::new(rc) as Box<dyn ApiObject>),
            kind: GroupVersionKind::new(GROUP_NAME, NODE_VERSION, RUNTIME_CLASS_KIND),
        }
    }

    pub fn with_subresource(mut self, subresource: &str) -> Self {
        self.subresource = subresource.to_string();
        self
    }

    pub fn runtime_class(&self) -> Option<&RuntimeClass> {
        self.object
            .as_ref()
            .and_then(|obj| obj.as_any().downcast_ref::<RuntimeClass>())
    }

    pub fn old_runtime_class(&self) -> Option<&RuntimeClass> {
        self.old_object
            .as_ref()
            .and_then(|obj| obj.as_any().downcast_ref::<RuntimeClass>())
    }
}

impl Attributes for AttributesRecord {
    fn get_name(&self) -> &str {
        &self.name
    }

    fn get_namespace(&self) -> &str {
        &self.namespace
    }

    fn get_resource(&self) -> &GroupVersionResource {
        &self.resource
    }

    fn get_subresource(&self) -> &str {
        &self.subresource
    }

    fn get_operation(&self) -> Operation {
        self.operation
    }

    fn get_object(&self) -> Option<&dyn ApiObject> {
        self.object.as_deref()
    }

    fn get_object_mut(&mut self) -> Option<&mut (dyn ApiObject + 'static)> {
        self.object.as_deref_mut()
    }

    fn get_old_object(&self) -> Option<&dyn ApiObject> {
        self.old_object.as_deref()
    }

    fn get_kind(&self) -> &GroupVersionKind {
        &self.kind
    }
}
