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

//! Admission controller interfaces and types.
//!
//! This module provides the core types and traits for implementing admission plugins,
//! plus the AdmissionReview wire envelope and JSON patch documents.

pub mod attributes;
pub mod errors;
mod handler;
mod interfaces;
pub mod patch;
pub mod review;

pub use attributes::{Attributes, AttributesRecord};
pub use errors::{AdmissionError, AdmissionResult};
pub use handler::Handler;
pub use interfaces::{Interface, MutationInterface, Operation, ALL_OPERATIONS};
pub use patch::{escape_json_pointer, Patch, PatchOperation, PatchType};
pub use review::{AdmissionRequest, AdmissionResponse, AdmissionReview};
