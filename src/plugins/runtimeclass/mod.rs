// Copyright 2024 The Kubernetes Authors.
// Licensed under the Apache License, Version 2.0

//! RuntimeClassStrategy admission plugin.
//!
//! Applies the RuntimeClass defaults on create and update, then validates the
//! result. When the `PodOverhead` feature is disabled, the overhead field is
//! dropped from requests that did not already carry it.

use crate::admission::{
    AdmissionError, AdmissionResult, Attributes, Handler, Interface, MutationInterface, Operation,
    ValidationInterface,
};
use crate::api::core::ApiObject;
use crate::api::node::defaults::set_object_defaults_runtime_class;
use crate::api::node::validation::RuntimeClassValidator;
use crate::api::node::{RuntimeClass, GROUP_NAME, RUNTIME_CLASS_RESOURCE};
use serde::Deserialize;
use std::io::Read;
use tracing::{debug, warn};

/// Plugin name for the RuntimeClass strategy.
pub const PLUGIN_NAME: &str = "RuntimeClassStrategy";

const NOT_A_RUNTIME_CLASS: &str =
    "Resource was marked with kind RuntimeClass but was unable to be converted";

/// PluginConfig is the JSON configuration of the plugin.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PluginConfig {
    /// Whether the PodOverhead feature is enabled.
    pub pod_overhead: bool,
}

impl Default for PluginConfig {
    fn default() -> Self {
        Self { pod_overhead: true }
    }
}

impl PluginConfig {
    /// Reads the configuration. No reader, or an empty one, gives the defaults.
    pub fn from_reader(config: Option<&mut dyn Read>) -> AdmissionResult<Self> {
        let Some(reader) = config else {
            return Ok(Self::default());
        };
        let mut raw = String::new();
        reader
            .read_to_string(&mut raw)
            .map_err(|e| AdmissionError::bad_request(format!("failed to read {} config: {}", PLUGIN_NAME, e)))?;
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_json::from_str(&raw)
            .map_err(|e| AdmissionError::bad_request(format!("invalid {} config: {}", PLUGIN_NAME, e)))
    }
}

/// Plugin defaults and validates RuntimeClass writes.
#[derive(Debug, Clone)]
pub struct Plugin {
    handler: Handler,
    config: PluginConfig,
    validator: RuntimeClassValidator,
}

impl Plugin {
    pub fn new() -> Self {
        Self::with_config(PluginConfig::default())
    }

    pub fn with_config(config: PluginConfig) -> Self {
        Self {
            handler: Handler::new_create_update(),
            config,
            validator: RuntimeClassValidator::default(),
        }
    }

    /// Builds the plugin from an optional JSON configuration.
    pub fn from_config(config: Option<&mut dyn Read>) -> AdmissionResult<Self> {
        Ok(Self::with_config(PluginConfig::from_reader(config)?))
    }

    pub fn config(&self) -> &PluginConfig {
        &self.config
    }

    fn should_ignore(&self, attributes: &dyn Attributes) -> bool {
        !attributes.get_subresource().is_empty()
            || !attributes.get_resource().is(GROUP_NAME, RUNTIME_CLASS_RESOURCE)
    }

    /// The old object of an update. Any other operation has none.
    fn old_runtime_class<'a>(
        &self,
        attributes: &'a dyn Attributes,
    ) -> AdmissionResult<Option<&'a RuntimeClass>> {
        if attributes.get_operation() != Operation::Update {
            return Ok(None);
        }
        let old = attributes
            .get_old_object()
            .ok_or_else(|| AdmissionError::bad_request("update of a RuntimeClass without the stored object"))?;
        as_runtime_class(old).map(Some)
    }
}

impl Default for Plugin {
    fn default() -> Self {
        Self::new()
    }
}

impl Interface for Plugin {
    fn handles(&self, operation: Operation) -> bool {
        self.handler.handles(operation)
    }
}

impl MutationInterface for Plugin {
    fn admit(&self, attributes: &mut dyn Attributes) -> AdmissionResult<()> {
        if self.should_ignore(&*attributes) {
            return Ok(());
        }

        let keep_overhead = self.config.pod_overhead
            || self
                .old_runtime_class(&*attributes)?
                .is_some_and(|old| old.overhead.is_some());

        let obj = attributes
            .get_object_mut()
            .ok_or_else(|| AdmissionError::bad_request(NOT_A_RUNTIME_CLASS))?;
        let runtime_class = obj
            .as_any_mut()
            .downcast_mut::<RuntimeClass>()
            .ok_or_else(|| AdmissionError::bad_request(NOT_A_RUNTIME_CLASS))?;

        if !keep_overhead && runtime_class.overhead.take().is_some() {
            debug!(
                runtime_class = %runtime_class.metadata.name,
                "dropped overhead, PodOverhead is disabled"
            );
        }
        set_object_defaults_runtime_class(runtime_class);
        Ok(())
    }
}

impl ValidationInterface for Plugin {
    fn validate(&self, attributes: &dyn Attributes) -> AdmissionResult<()> {
        if self.should_ignore(attributes) {
            return Ok(());
        }

        let obj = attributes
            .get_object()
            .ok_or_else(|| AdmissionError::bad_request(NOT_A_RUNTIME_CLASS))?;
        let runtime_class = as_runtime_class(obj)?;

        let errors = match self.old_runtime_class(attributes)? {
            Some(old) => self.validator.validate_update(runtime_class, old),
            None => self.validator.validate(runtime_class),
        };
        if errors.is_empty() {
            return Ok(());
        }

        warn!(
            runtime_class = %runtime_class.metadata.name,
            operation = %attributes.get_operation(),
            errors = errors.len(),
            "rejected runtime class"
        );
        Err(AdmissionError::invalid(
            attributes.get_kind().group_kind(),
            runtime_class.name(),
            errors,
        ))
    }
}

fn as_runtime_class(obj: &dyn ApiObject) -> AdmissionResult<&RuntimeClass> {
    obj.as_any()
        .downcast_ref::<RuntimeClass>()
        .ok_or_else(|| AdmissionError::bad_request(NOT_A_RUNTIME_CLASS))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::admission::{AttributesRecord, GroupVersionKind, GroupVersionResource};
    use crate::api::core::{ResourceList, ResourceName, ResourceRequirements};
    use crate::api::node::{Overhead, RuntimeClassList};
    use crate::api::resource::Quantity;
    use crate::validation::field::ErrorType;

    fn list(entries: &[(&str, &str)]) -> ResourceList {
        entries
            .iter()
            .map(|(name, value)| (ResourceName::from(*name), Quantity::parse(value).unwrap()))
            .collect()
    }

    fn with_requests(name: &str, handler: &str, requests: &[(&str, &str)]) -> RuntimeClass {
        RuntimeClass::with_overhead(
            name,
            handler,
            Overhead::new(ResourceRequirements::with_requests(list(requests))),
        )
    }

    fn stored(mut rc: RuntimeClass) -> RuntimeClass {
        rc.metadata.resource_version = "1".to_string();
        rc
    }

    #[test]
    fn test_handles() {
        let plugin = Plugin::new();
        assert!(plugin.handles(Operation::Create));
        assert!(plugin.handles(Operation::Update));
        assert!(!plugin.handles(Operation::Delete));
        assert!(!plugin.handles(Operation::Connect));
    }

    #[test]
    fn test_config() {
        assert!(Plugin::from_config(None).unwrap().config().pod_overhead);

        let mut empty: &[u8] = b"  ";
        assert!(Plugin::from_config(Some(&mut empty)).unwrap().config().pod_overhead);

        let mut disabled: &[u8] = br#"{"podOverhead": false}"#;
        assert!(!Plugin::from_config(Some(&mut disabled)).unwrap().config().pod_overhead);

        let mut unrelated: &[u8] = br#"{}"#;
        assert!(Plugin::from_config(Some(&mut unrelated)).unwrap().config().pod_overhead);

        let mut malformed: &[u8] = b"{podOverhead";
        let err = Plugin::from_config(Some(&mut malformed)).unwrap_err();
        assert!(matches!(err, AdmissionError::BadRequest(_)));
        assert!(err.to_string().starts_with("invalid RuntimeClassStrategy config"));
    }

    #[test]
    fn test_admit_defaults_overhead() {
        let plugin = Plugin::new();
        let mut attrs = AttributesRecord::new_runtime_class(
            Operation::Create,
            with_requests("kata", "kata", &[("cpu", "250m")]),
            None,
        );
        plugin.admit(&mut attrs).unwrap();

        let pod_fixed = attrs.runtime_class().unwrap().overhead.as_ref().unwrap().pod_fixed.as_ref().unwrap();
        assert_eq!(pod_fixed.limits, Some(list(&[("cpu", "250m")])));
        assert_eq!(pod_fixed.requests, pod_fixed.limits);
    }

    #[test]
    fn test_admit_without_overhead_is_unchanged() {
        let plugin = Plugin::new();
        let rc = RuntimeClass::new("runc", "runc");
        let mut attrs = AttributesRecord::new_runtime_class(Operation::Create, rc.clone(), None);
        plugin.admit(&mut attrs).unwrap();
        assert_eq!(attrs.runtime_class(), Some(&rc));
    }

    #[test]
    fn test_admit_drops_overhead_when_disabled() {
        let plugin = Plugin::with_config(PluginConfig { pod_overhead: false });

        let mut create = AttributesRecord::new_runtime_class(
            Operation::Create,
            with_requests("kata", "kata", &[("cpu", "1")]),
            None,
        );
        plugin.admit(&mut create).unwrap();
        assert!(create.runtime_class().unwrap().overhead.is_none());

        let mut update_new_field = AttributesRecord::new_runtime_class(
            Operation::Update,
            with_requests("kata", "kata", &[("cpu", "1")]),
            Some(stored(RuntimeClass::new("kata", "kata"))),
        );
        plugin.admit(&mut update_new_field).unwrap();
        assert!(update_new_field.runtime_class().unwrap().overhead.is_none());

        let mut update_in_use = AttributesRecord::new_runtime_class(
            Operation::Update,
            with_requests("kata", "kata", &[("cpu", "2")]),
            Some(stored(with_requests("kata", "kata", &[("cpu", "1")]))),
        );
        plugin.admit(&mut update_in_use).unwrap();
        let overhead = update_in_use.runtime_class().unwrap().overhead.as_ref().unwrap();
        assert_eq!(
            overhead.pod_fixed.as_ref().unwrap().limits,
            Some(list(&[("cpu", "2")]))
        );
    }

    #[test]
    fn test_ignores_other_resources_and_subresources() {
        let plugin = Plugin::new();

        let mut status = AttributesRecord::new_runtime_class(
            Operation::Create,
            RuntimeClass::new("", ""),
            None,
        )
        .with_subresource("status");
        assert!(plugin.admit(&mut status).is_ok());
        assert!(plugin.validate(&status).is_ok());

        let mut pods = AttributesRecord::new_runtime_class(Operation::Create, RuntimeClass::new("", ""), None);
        pods.resource = GroupVersionResource::new("", "v1", "pods");
        pods.kind = GroupVersionKind::new("", "v1", "Pod");
        assert!(plugin.admit(&mut pods).is_ok());
        assert!(plugin.validate(&pods).is_ok());
    }

    #[test]
    fn test_wrong_object_type_is_bad_request() {
        let plugin = Plugin::new();
        let mut attrs = AttributesRecord::new_runtime_class(Operation::Create, RuntimeClass::new("a", "b"), None);
        attrs.object = Some(Box::new(RuntimeClassList::default()));

        assert!(matches!(plugin.admit(&mut attrs), Err(AdmissionError::BadRequest(_))));
        assert!(matches!(plugin.validate(&attrs), Err(AdmissionError::BadRequest(_))));

        attrs.object = None;
        assert!(matches!(plugin.validate(&attrs), Err(AdmissionError::BadRequest(_))));
    }

    #[test]
    fn test_update_without_old_object_is_bad_request() {
        let plugin = Plugin::new();
        let attrs = AttributesRecord::new_runtime_class(Operation::Update, RuntimeClass::new("a", "b"), None);
        assert!(matches!(plugin.validate(&attrs), Err(AdmissionError::BadRequest(_))));
    }

    #[test]
    fn test_validate_create() {
        let plugin = Plugin::new();

        let valid = AttributesRecord::new_runtime_class(Operation::Create, RuntimeClass::new("kata", "kata-qemu"), None);
        assert!(plugin.validate(&valid).is_ok());

        let invalid = AttributesRecord::new_runtime_class(Operation::Create, RuntimeClass::new("kata", ""), None);
        let err = plugin.validate(&invalid).unwrap_err();
        assert_eq!(err.field_errors().len(), 1);
        assert_eq!(err.field_errors()[0].error_type, ErrorType::Required);
        assert_eq!(
            err.to_string(),
            "RuntimeClass.node.k8s.io \"kata\" is invalid: handler: Required value"
        );
    }

    #[test]
    fn test_validate_update() {
        let plugin = Plugin::new();
        let old = stored(RuntimeClass::new("kata", "kata"));

        let changed_overhead = stored(with_requests("kata", "kata", &[("memory", "64Mi")]));
        let attrs = AttributesRecord::new_runtime_class(Operation::Update, changed_overhead, Some(old.clone()));
        assert!(plugin.validate(&attrs).is_ok());

        let changed_handler = stored(RuntimeClass::new("kata", "runc"));
        let attrs = AttributesRecord::new_runtime_class(Operation::Update, changed_handler, Some(old));
        let err = plugin.validate(&attrs).unwrap_err();
        let fields: Vec<_> = err.field_errors().iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["handler"]);
        assert_eq!(err.field_errors()[0].error_type, ErrorType::Immutable);
    }

    #[test]
    fn test_admit_then_validate_accepts_request_only_overhead() {
        let plugin = Plugin::new();
        let mut attrs = AttributesRecord::new_runtime_class(
            Operation::Create,
            with_requests("kata", "kata", &[("cpu", "100m"), ("memory", "10Mi")]),
            None,
        );
        plugin.admit(&mut attrs).unwrap();
        assert!(plugin.validate(&attrs).is_ok());
    }
}
