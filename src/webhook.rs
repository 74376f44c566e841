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

//! Admission decision pipeline.
//!
//! A review moves through decode, attribute construction, the mutation plugin
//! and response assembly. Every stage after a successful content-type check
//! ends in a well-formed AdmissionReview; failures are reported in
//! `response.status.message` instead of an HTTP error.
//!
//! The webhook never denies. A request is either allowed (with or without a
//! patch) or answered with a failure response, and the API server's failure
//! policy decides what happens to the latter. Adding a deny path here changes
//! the contract with every cluster this runs in.

use crate::admission::review::{self, recover_types, recover_uid};
use crate::admission::{
    AdmissionRequest, AdmissionResponse, AdmissionResult, AdmissionReview, Attributes,
    AttributesRecord, MutationInterface,
};
use std::sync::Arc;

/// Webhook runs admission reviews through a mutation plugin.
#[derive(Clone)]
pub struct Webhook {
    plugin: Arc<dyn MutationInterface>,
}

impl Webhook {
    pub fn new(plugin: Arc<dyn MutationInterface>) -> Self {
        Self { plugin }
    }

    /// Decide on a raw request body and return the encoded response body.
    ///
    /// Errors are limited to an unsupported content type, where nothing is
    /// decoded, and a response that could not be encoded.
    pub fn serve(&self, content_type: Option<&str>, body: &[u8]) -> AdmissionResult<Vec<u8>> {
        let review = self.review(content_type, body)?;
        review::encode(&review)
    }

    /// Decide on a raw request body.
    pub fn review(&self, content_type: Option<&str>, body: &[u8]) -> AdmissionResult<AdmissionReview> {
        let (types, request) = match review::decode(content_type, body) {
            Ok(decoded) => decoded,
            Err(err) if !err.is_decode_failure() => return Err(err),
            Err(err) => {
                let uid = recover_uid(body);
                tracing::warn!(uid = uid.as_deref().unwrap_or_default(), error = %err, "Could not decode body");
                return Ok(AdmissionReview::respond(
                    recover_types(body),
                    AdmissionResponse::error(uid.as_deref(), &err),
                ));
            }
        };

        Ok(AdmissionReview::respond(types, self.decide(&request)))
    }

    /// Decide on a decoded request. The response always carries the request's uid.
    pub fn decide(&self, request: &AdmissionRequest) -> AdmissionResponse {
        let uid = request.uid.as_str();

        let Some(operation) = request.operation else {
            tracing::debug!(uid, "Unknown operation");
            return AdmissionResponse::allow(uid);
        };

        let attributes = match AttributesRecord::from_request(request, operation) {
            Ok(attributes) => attributes,
            Err(err) => {
                tracing::warn!(uid, error = %err, "Could not unmarshal raw object");
                return AdmissionResponse::error(Some(uid), &err);
            }
        };

        tracing::info!(
            kind = %attributes.get_kind(),
            resource = attributes.get_resource().resource.as_str(),
            namespace = attributes.get_namespace(),
            name = attributes.get_name(),
            uid = attributes.get_uid(),
            operation = %attributes.get_operation(),
            user = attributes.get_user_info().username.as_str(),
            dry_run = attributes.is_dry_run(),
            "AdmissionReview"
        );

        if !self.plugin.handles(attributes.get_operation()) {
            tracing::debug!(uid, operation = %attributes.get_operation(), "Operation not handled");
            return AdmissionResponse::allow(uid);
        }

        let patch = match self.plugin.admit(&attributes) {
            Ok(patch) if patch.is_empty() => return AdmissionResponse::allow(uid),
            Ok(patch) => patch,
            Err(err) => {
                tracing::warn!(uid, error = %err, "Error creating patch");
                return AdmissionResponse::error(Some(uid), &err);
            }
        };

        match patch.to_vec() {
            Ok(bytes) => AdmissionResponse::allow(uid).with_patch(bytes),
            Err(err) => {
                tracing::warn!(uid, error = %err, "Error creating patch");
                AdmissionResponse::error(Some(uid), &err)
            }
        }
    }
}
