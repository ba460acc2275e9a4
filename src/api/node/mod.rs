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

//! The `node.k8s.io` API group: RuntimeClass and its pod overhead.

pub mod defaults;
pub mod validation;

use crate::api::core::{ApiObject, ResourceRequirements};
use crate::api::meta::{ListMeta, ObjectMeta};
use serde::{Deserialize, Serialize};
use std::any::Any;

/// API group of RuntimeClass.
pub const GROUP_NAME: &str = "node.k8s.io";

/// Kind of a single RuntimeClass object.
pub const RUNTIME_CLASS_KIND: &str = "RuntimeClass";

/// Kind of a RuntimeClass list.
pub const RUNTIME_CLASS_LIST_KIND: &str = "RuntimeClassList";

/// Resource name used in request paths.
pub const RUNTIME_CLASS_RESOURCE: &str = "runtimeclasses";

/// Overhead describes the resource overhead associated with running a pod.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Overhead {
    /// PodFixed is the fixed resource overhead charged to a pod, on top of
    /// its containers' requests and limits.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pod_fixed: Option<ResourceRequirements>,
}

impl Overhead {
    pub fn new(pod_fixed: ResourceRequirements) -> Self {
        Self {
            pod_fixed: Some(pod_fixed),
        }
    }
}

/// RuntimeClass defines a class of container runtime supported in the cluster.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuntimeClass {
    #[serde(default)]
    pub metadata: ObjectMeta,
    /// Handler names the runtime configuration the CRI implementation uses
    /// for pods of this class. Immutable once created.
    #[serde(default)]
    pub handler: String,
    /// Overhead is the resource overhead of running a pod with this class.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overhead: Option<Overhead>,
}

impl RuntimeClass {
    /// Create a RuntimeClass with just a name and handler.
    pub fn new(name: &str, handler: &str) -> Self {
        Self {
            metadata: ObjectMeta::named(name),
            handler: handler.to_string(),
            overhead: None,
        }
    }

    /// Create a RuntimeClass with overhead.
    pub fn with_overhead(name: &str, handler: &str, overhead: Overhead) -> Self {
        Self {
            overhead: Some(overhead),
            ..Self::new(name, handler)
        }
    }

    pub fn name(&self) -> &str {
        &self.metadata.name
    }
}

impl ApiObject for RuntimeClass {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn kind(&self) -> &str {
        RUNTIME_CLASS_KIND
    }
}

/// RuntimeClassList is a list of RuntimeClass objects.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuntimeClassList {
    #[serde(default)]
    pub metadata: ListMeta,
    #[serde(default)]
    pub items: Vec<RuntimeClass>,
}

impl ApiObject for RuntimeClassList {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn kind(&self) -> &str {
        RUNTIME_CLASS_LIST_KIND
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::resource::Quantity;

    #[test]
    fn test_decode_runtime_class() {
        let rc: RuntimeClass = serde_json::from_str(
            r#"{
                "metadata": {"name": "kata", "resourceVersion": "7"},
                "handler": "kata-qemu",
                "overhead": {"podFixed": {"requests": {"cpu": "250m", "memory": "120Mi"}}}
            }"#,
        )
        .unwrap();

        assert_eq!(rc.name(), "kata");
        assert_eq!(rc.metadata.resource_version, "7");
        assert_eq!(rc.handler, "kata-qemu");
        let pod_fixed = rc.overhead.unwrap().pod_fixed.unwrap();
        assert!(pod_fixed.limits.is_none());
        let requests = pod_fixed.requests.unwrap();
        assert_eq!(requests.get("cpu"), Some(&Quantity::parse("250m").unwrap()));
        assert_eq!(requests.get("memory").map(|q| q.to_string()), Some("120Mi".to_string()));
    }

    #[test]
    fn test_encode_omits_absent_fields() {
        let rc = RuntimeClass::new("foo", "bar");
        let json = serde_json::to_value(&rc).unwrap();
        assert_eq!(json, serde_json::json!({"metadata": {"name": "foo"}, "handler": "bar"}));

        let rc = RuntimeClass::with_overhead("foo", "bar", Overhead::default());
        let json = serde_json::to_value(&rc).unwrap();
        assert_eq!(json["overhead"], serde_json::json!({}));
    }

    #[test]
    fn test_as_api_object() {
        let mut list = RuntimeClassList {
            metadata: ListMeta::default(),
            items: vec![RuntimeClass::new("a", "b")],
        };
        assert_eq!(list.kind(), "RuntimeClassList");
        let obj: &mut dyn ApiObject = &mut list;
        let downcast = obj.as_any_mut().downcast_mut::<RuntimeClassList>().unwrap();
        assert_eq!(downcast.items.len(), 1);

        let rc = RuntimeClass::new("a", "b");
        let obj: &dyn ApiObject = &rc;
        assert_eq!(obj.kind(), "RuntimeClass");
        assert!(obj.as_any().downcast_ref::<RuntimeClass>().is_some());
    }
}
