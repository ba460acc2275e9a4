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

//! Generic validation building blocks: field errors, name syntax and
//! object metadata checks.

pub mod field;
pub mod names;
pub mod objectmeta;

pub use field::{ErrorList, ErrorType, FieldError, Path};
pub use objectmeta::{MetadataValidator, ObjectMetaValidator};
