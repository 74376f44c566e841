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

//! Toleration injection admission webhook.
//!
//! Pods carrying a configured label receive a configured toleration through a
//! JSON patch returned in the AdmissionReview response. Every other request is
//! admitted unchanged.

pub mod admission;
pub mod api;
pub mod config;
pub mod plugins;
pub mod server;
pub mod webhook;

// Re-export commonly used types
pub use admission::{
    AdmissionError, AdmissionResult, Attributes, Handler, Interface, MutationInterface, Operation,
};
pub use api::core::{Pod, Toleration, TolerationEffect};
pub use webhook::Webhook;
