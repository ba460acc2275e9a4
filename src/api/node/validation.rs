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

//! Validation for RuntimeClass objects.
//!
//! All checks are cumulative: every problem found is returned in one
//! [`ErrorList`], and an empty list means the object is valid.

use super::{Overhead, RuntimeClass};
use crate::api::core::validation::validate_resource_requirements;
use crate::validation::field::{ErrorList, FieldError, Path};
use crate::validation::names::name_is_dns_label;
use crate::validation::objectmeta::{validate_immutable_field, MetadataValidator, ObjectMetaValidator};
use tracing::debug;

/// Validates a new RuntimeClass with the standard metadata rules.
pub fn validate_runtime_class(runtime_class: &RuntimeClass) -> ErrorList {
    RuntimeClassValidator::<ObjectMetaValidator>::default().validate(runtime_class)
}

/// Validates an update of `old` to `new` with the standard metadata rules.
pub fn validate_runtime_class_update(new: &RuntimeClass, old: &RuntimeClass) -> ErrorList {
    RuntimeClassValidator::<ObjectMetaValidator>::default().validate_update(new, old)
}

/// Validates a pod overhead. An absent overhead, or one without `podFixed`,
/// is always valid.
pub fn validate_overhead(overhead: Option<&Overhead>, path: &Path) -> ErrorList {
    match overhead.and_then(|o| o.pod_fixed.as_ref()) {
        Some(pod_fixed) => validate_resource_requirements(pod_fixed, path),
        None => ErrorList::new(),
    }
}

/// RuntimeClassValidator checks RuntimeClass objects, delegating metadata
/// checks to `M`.
#[derive(Debug, Clone, Default)]
pub struct RuntimeClassValidator<M = ObjectMetaValidator> {
    metadata: M,
}

impl<M: MetadataValidator> RuntimeClassValidator<M> {
    pub fn new(metadata: M) -> Self {
        Self { metadata }
    }

    /// Validates a RuntimeClass on create.
    pub fn validate(&self, runtime_class: &RuntimeClass) -> ErrorList {
        let mut all_errs = self
            .metadata
            .validate_object_meta(&runtime_class.metadata, &Path::new("metadata"));
        all_errs.extend(validate_handler(&runtime_class.handler, &Path::new("handler")));
        all_errs.extend(validate_overhead(
            runtime_class.overhead.as_ref(),
            &Path::new("overhead"),
        ));

        debug!(
            runtime_class = %runtime_class.metadata.name,
            errors = all_errs.len(),
            "validated runtime class"
        );
        all_errs
    }

    /// Validates a RuntimeClass update. The new object must pass create
    /// validation, metadata must only change in allowed ways, and the handler
    /// must not change. Overhead may change freely within its own rules.
    pub fn validate_update(&self, new: &RuntimeClass, old: &RuntimeClass) -> ErrorList {
        let mut all_errs = self.validate(new);
        all_errs.extend(self.metadata.validate_object_meta_update(
            &new.metadata,
            &old.metadata,
            &Path::new("metadata"),
        ));
        all_errs.extend(validate_immutable_field(
            &new.handler,
            &old.handler,
            &Path::new("handler"),
        ));

        debug!(
            runtime_class = %new.metadata.name,
            errors = all_errs.len(),
            "validated runtime class update"
        );
        all_errs
    }
}

fn validate_handler(handler: &str, path: &Path) -> ErrorList {
    if handler.is_empty() {
        return vec![FieldError::required(path, "")];
    }
    name_is_dns_label(handler, false)
        .into_iter()
        .map(|msg| FieldError::invalid(path, handler, msg))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::core::{ResourceList, ResourceName, ResourceRequirements};
    use crate::api::meta::ObjectMeta;
    use crate::api::node::defaults::set_defaults_overhead;
    use crate::api::resource::{Format, Quantity};
    use crate::validation::field::ErrorType;
    use proptest::prelude::*;
    use std::cell::Cell;

    fn list(entries: &[(&str, &str)]) -> ResourceList {
        entries
            .iter()
            .map(|(name, value)| (ResourceName::from(*name), Quantity::parse(value).unwrap()))
            .collect()
    }

    fn runtime_class(meta: ObjectMeta, handler: &str) -> RuntimeClass {
        RuntimeClass {
            metadata: meta,
            handler: handler.to_string(),
            overhead: None,
        }
    }

    #[test]
    fn test_validate_runtime_class() {
        struct TestCase {
            name: &'static str,
            rc: RuntimeClass,
            expect_error: bool,
        }

        let tests = vec![
            TestCase {
                name: "invalid name",
                rc: RuntimeClass::new("&!@#", "foo"),
                expect_error: true,
            },
            TestCase {
                name: "invalid Handler name",
                rc: RuntimeClass::new("foo", "&@#$"),
                expect_error: true,
            },
            TestCase {
                name: "invalid empty RuntimeClass",
                rc: runtime_class(ObjectMeta::named("empty"), ""),
                expect_error: true,
            },
            TestCase {
                name: "valid Handler",
                rc: RuntimeClass::new("foo", "bar-baz"),
                expect_error: false,
            },
        ];

        for test in tests {
            let errs = validate_runtime_class(&test.rc);
            assert_eq!(!errs.is_empty(), test.expect_error, "{}: {:?}", test.name, errs);
        }
    }

    #[test]
    fn test_empty_handler_is_required() {
        let errs = validate_runtime_class(&RuntimeClass::new("foo", ""));
        assert_eq!(errs.len(), 1);
        assert_eq!(errs[0].error_type, ErrorType::Required);
        assert_eq!(errs[0].field, "handler");
    }

    #[test]
    fn test_invalid_handler_is_invalid() {
        let errs = validate_runtime_class(&RuntimeClass::new("foo", "Bar_Baz"));
        assert!(!errs.is_empty());
        assert!(errs.iter().all(|e| e.field == "handler" && e.error_type == ErrorType::Invalid));
    }

    #[test]
    fn test_overhead_errors_are_namespaced() {
        let rc = RuntimeClass::with_overhead(
            "foo",
            "bar",
            Overhead::new(ResourceRequirements {
                requests: Some(list(&[("cpu", "10")])),
                limits: Some(list(&[("cpu", "9")])),
            }),
        );
        let errs = validate_runtime_class(&rc);
        assert_eq!(errs.len(), 1);
        assert_eq!(errs[0].field, "overhead.requests[cpu]");
    }

    #[test]
    fn test_errors_from_all_fields_are_collected() {
        let rc = RuntimeClass::with_overhead(
            "&!@#",
            "",
            Overhead::new(ResourceRequirements::with_limits(list(&[("cpu", "-1")]))),
        );
        let errs = validate_runtime_class(&rc);
        assert!(errs.iter().any(|e| e.field == "metadata.name"));
        assert!(errs.iter().any(|e| e.field == "handler"));
        assert!(errs.iter().any(|e| e.field == "overhead.limits[cpu]"));
    }

    #[test]
    fn test_validate_runtime_class_update() {
        struct TestCase {
            name: &'static str,
            new: RuntimeClass,
            expect_error: bool,
        }

        let old = RuntimeClass::new("foo", "bar");
        let mut labelled = ObjectMeta::named("foo");
        labelled.labels.insert("foo".to_string(), "bar".to_string());
        let mut moved = ObjectMeta::named("empty");
        moved.cluster_name = "somethingelse".to_string();

        let tests = vec![
            TestCase {
                name: "valid metadata update",
                new: runtime_class(labelled, "bar"),
                expect_error: false,
            },
            TestCase {
                name: "invalid metadata update",
                new: runtime_class(moved, "bar"),
                expect_error: true,
            },
            TestCase {
                name: "invalid Handler update",
                new: RuntimeClass::new("foo", "somethingelse"),
                expect_error: true,
            },
        ];

        for mut test in tests {
            let mut old = old.clone();
            old.metadata.resource_version = "1".to_string();
            test.new.metadata.resource_version = "1".to_string();

            let errs = validate_runtime_class_update(&test.new, &old);
            assert_eq!(!errs.is_empty(), test.expect_error, "{}: {:?}", test.name, errs);
        }
    }

    #[test]
    fn test_handler_change_is_immutable() {
        let mut old = RuntimeClass::new("foo", "bar");
        old.metadata.resource_version = "1".to_string();
        let mut new = RuntimeClass::new("foo", "baz");
        new.metadata.resource_version = "1".to_string();

        let errs = validate_runtime_class_update(&new, &old);
        assert_eq!(errs.len(), 1);
        assert_eq!(errs[0].error_type, ErrorType::Immutable);
        assert_eq!(errs[0].field, "handler");
    }

    #[test]
    fn test_invalid_new_handler_reports_both_errors() {
        let mut old = RuntimeClass::new("foo", "bar");
        old.metadata.resource_version = "1".to_string();
        let mut new = RuntimeClass::new("foo", "");
        new.metadata.resource_version = "1".to_string();

        let errs = validate_runtime_class_update(&new, &old);
        assert!(errs.iter().any(|e| e.error_type == ErrorType::Required));
        assert!(errs.iter().any(|e| e.error_type == ErrorType::Immutable));
    }

    #[test]
    fn test_overhead_may_change_on_update() {
        let mut old = RuntimeClass::with_overhead(
            "foo",
            "bar",
            Overhead::new(ResourceRequirements::with_requests(list(&[("cpu", "1")]))),
        );
        old.metadata.resource_version = "1".to_string();
        let mut new = RuntimeClass::with_overhead(
            "foo",
            "bar",
            Overhead::new(ResourceRequirements::with_requests(list(&[("memory", "1Gi")]))),
        );
        new.metadata.resource_version = "1".to_string();
        assert!(validate_runtime_class_update(&new, &old).is_empty());
    }

    /// Records calls and accepts everything.
    #[derive(Default)]
    struct StubMetadata {
        creates: Cell<usize>,
        updates: Cell<usize>,
    }

    impl MetadataValidator for StubMetadata {
        fn validate_object_meta(&self, _meta: &ObjectMeta, _path: &Path) -> ErrorList {
            self.creates.set(self.creates.get() + 1);
            ErrorList::new()
        }

        fn validate_object_meta_update(&self, _new: &ObjectMeta, _old: &ObjectMeta, _path: &Path) -> ErrorList {
            self.updates.set(self.updates.get() + 1);
            ErrorList::new()
        }
    }

    #[test]
    fn test_metadata_checks_are_delegated() {
        let validator = RuntimeClassValidator::new(StubMetadata::default());

        // The stub accepts a name the standard rules would reject.
        assert!(validator.validate(&RuntimeClass::new("&!@#", "bar")).is_empty());
        assert_eq!(validator.metadata.creates.get(), 1);

        let errs = validator.validate_update(&RuntimeClass::new("a", "x"), &RuntimeClass::new("b", "y"));
        assert_eq!(errs.len(), 1);
        assert_eq!(errs[0].field, "handler");
        assert_eq!(validator.metadata.creates.get(), 2);
        assert_eq!(validator.metadata.updates.get(), 1);
    }

    #[test]
    fn test_validate_overhead() {
        let success_cases = vec![
            (
                "Overhead with Requests equal to Limits",
                ResourceRequirements {
                    requests: Some(list(&[("cpu", "10"), ("memory", "10G")])),
                    limits: Some(list(&[("cpu", "10"), ("memory", "10G")])),
                },
            ),
            (
                "Overhead with only Limits",
                ResourceRequirements::with_limits(list(&[("cpu", "10"), ("memory", "10G")])),
            ),
            (
                "Overhead with only Requests",
                ResourceRequirements::with_requests(list(&[("cpu", "10"), ("memory", "10G")])),
            ),
            (
                "Overhead with Requests Less Than Limits",
                ResourceRequirements {
                    requests: Some(list(&[("cpu", "9"), ("memory", "9G")])),
                    limits: Some(list(&[("cpu", "10"), ("memory", "10G")])),
                },
            ),
        ];
        for (name, pod_fixed) in success_cases {
            let errs = validate_overhead(Some(&Overhead::new(pod_fixed)), &Path::new("overheads"));
            assert!(errs.is_empty(), "{} unexpected error: {:?}", name, errs);
        }

        let error_cases = vec![
            (
                "Overhead with Requests Larger Than Limits",
                ResourceRequirements {
                    requests: Some(list(&[("cpu", "10"), ("memory", "10G")])),
                    limits: Some(list(&[("cpu", "9"), ("memory", "9G")])),
                },
            ),
            (
                "Invalid Resources with Requests",
                ResourceRequirements::with_requests(list(&[("my.org", "10m")])),
            ),
            (
                "Invalid Resources with Limits",
                ResourceRequirements::with_limits(list(&[("my.org", "9m")])),
            ),
        ];
        for (name, pod_fixed) in error_cases {
            let errs = validate_overhead(Some(&Overhead::new(pod_fixed)), &Path::new("resources"));
            assert!(!errs.is_empty(), "{} expected error", name);
        }
    }

    #[test]
    fn test_absent_overhead_is_valid() {
        assert!(validate_overhead(None, &Path::new("overhead")).is_empty());
        assert!(validate_overhead(Some(&Overhead::default()), &Path::new("overhead")).is_empty());
    }

    #[test]
    fn test_overhead_scenarios() {
        // Defaulted empty overhead.
        let mut overhead = Overhead::default();
        set_defaults_overhead(&mut overhead);
        assert!(validate_overhead(Some(&overhead), &Path::new("overhead")).is_empty());

        // Distinct request and limit within bounds.
        let mut overhead = Overhead::new(ResourceRequirements {
            requests: Some(list(&[("cpu", "6")])),
            limits: Some(list(&[("cpu", "7")])),
        });
        set_defaults_overhead(&mut overhead);
        assert!(validate_overhead(Some(&overhead), &Path::new("overhead")).is_empty());

        // Request above limit.
        let overhead = Overhead::new(ResourceRequirements {
            requests: Some(list(&[("cpu", "10")])),
            limits: Some(list(&[("cpu", "9")])),
        });
        let errs = validate_overhead(Some(&overhead), &Path::new("overhead"));
        assert_eq!(errs.len(), 1);
        assert_eq!(errs[0].error_type, ErrorType::Invalid);
    }

    fn arb_list() -> impl Strategy<Value = Option<ResourceList>> {
        let name = prop::sample::select(vec!["cpu", "memory", "example.com/gpu"])
            .prop_map(|name: &str| ResourceName::from(name));
        let value = (-2i64..8).prop_map(|units| Quantity::new(units, Format::DecimalSI));
        prop::option::of(prop::collection::btree_map(name, value, 0..3))
    }

    proptest! {
        #[test]
        fn prop_valid_defaulted_overhead_is_bounded(requests in arb_list(), limits in arb_list()) {
            let mut overhead = Overhead::new(ResourceRequirements { requests, limits });
            set_defaults_overhead(&mut overhead);

            if validate_overhead(Some(&overhead), &Path::new("overhead")).is_empty() {
                let pod_fixed = overhead.pod_fixed.unwrap();
                let requests = pod_fixed.requests.unwrap();
                let limits = pod_fixed.limits.unwrap();
                for (name, request) in &requests {
                    prop_assert!(request.sign() >= 0);
                    prop_assert!(request <= &limits[name]);
                }
                for limit in limits.values() {
                    prop_assert!(limit.sign() >= 0);
                }
            }
        }

        #[test]
        fn prop_handler_change_is_rejected(old_handler in "[a-z]{1,8}", new_handler in "[a-z]{1,8}") {
            prop_assume!(old_handler != new_handler);
            let mut old = RuntimeClass::new("foo", &old_handler);
            old.metadata.resource_version = "1".to_string();
            let mut new = RuntimeClass::new("foo", &new_handler);
            new.metadata.resource_version = "1".to_string();

            let errs = validate_runtime_class_update(&new, &old);
            prop_assert!(errs.iter().any(|e| e.error_type == ErrorType::Immutable && e.field == "handler"));
        }
    }
}
