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

//! AdmissionReview envelope exchanged with the API server.
//!
//! The request side is decoded leniently: every field defaults when absent, so
//! only a structurally wrong body (not JSON, or a field of the wrong type) is a
//! decode failure.

use super::attributes::{GroupVersionKind, GroupVersionResource};
use super::errors::{AdmissionError, AdmissionResult};
use super::interfaces::Operation;
use super::patch::PatchType;
use crate::api::core::null_as_default;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;

/// The only media type a review is accepted in.
pub const CONTENT_TYPE_JSON: &str = "application/json";

/// API version used for responses when the request did not name one.
pub const DEFAULT_API_VERSION: &str = "admission.k8s.io/v1";

/// Kind used for responses when the request did not name one.
pub const ADMISSION_REVIEW_KIND: &str = "AdmissionReview";

/// TypeMeta carries the apiVersion and kind of an envelope.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeMeta {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub api_version: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub kind: String,
}

impl TypeMeta {
    /// Fill in the admission.k8s.io defaults for any unset field.
    pub fn or_default_review(mut self) -> Self {
        if self.api_version.is_empty() {
            self.api_version = DEFAULT_API_VERSION.to_string();
        }
        if self.kind.is_empty() {
            self.kind = ADMISSION_REVIEW_KIND.to_string();
        }
        self
    }
}

/// AdmissionReview wraps a request on the way in and a response on the way out.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AdmissionReview {
    #[serde(flatten)]
    pub types: TypeMeta,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request: Option<AdmissionRequest>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<AdmissionResponse>,
}

impl AdmissionReview {
    /// Wrap a response, echoing the request envelope's apiVersion and kind.
    pub fn respond(types: TypeMeta, response: AdmissionResponse) -> Self {
        Self {
            types: types.or_default_review(),
            request: None,
            response: Some(response),
        }
    }
}

/// UserInfo describes the user that issued a request.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UserInfo {
    #[serde(deserialize_with = "null_as_default")]
    pub username: String,
    #[serde(deserialize_with = "null_as_default")]
    pub uid: String,
    #[serde(deserialize_with = "null_as_default")]
    pub groups: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub extra: HashMap<String, Vec<String>>,
}

/// AdmissionRequest describes the attributes of one admission call.
///
/// An explicit `null` decodes like an absent field.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AdmissionRequest {
    /// Correlation identifier, echoed in the response.
    #[serde(deserialize_with = "null_as_default")]
    pub uid: String,
    #[serde(deserialize_with = "null_as_default")]
    pub kind: GroupVersionKind,
    #[serde(deserialize_with = "null_as_default")]
    pub resource: GroupVersionResource,
    #[serde(deserialize_with = "null_as_default")]
    pub sub_resource: String,
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub namespace: String,
    /// `None` when the operation is absent or not one of the four admission
    /// operations. Such requests are admitted unchanged.
    #[serde(deserialize_with = "known_operation", skip_serializing_if = "Option::is_none")]
    pub operation: Option<Operation>,
    #[serde(deserialize_with = "null_as_default")]
    pub user_info: UserInfo,
    /// The submitted object, still in its serialized form.
    pub object: serde_json::Value,
    pub old_object: serde_json::Value,
    #[serde(deserialize_with = "null_as_default")]
    pub dry_run: bool,
}

/// Operations are free strings on the wire; anything unrecognised maps to `None`.
fn known_operation<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Operation>, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?
        .as_deref()
        .and_then(Operation::parse))
}

/// Status carries a human-readable failure description.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Status {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub message: String,
}

/// AdmissionResponse is the decision for one request.
///
/// Build it through [`AdmissionResponse::allow`], [`AdmissionResponse::with_patch`]
/// and [`AdmissionResponse::error`]; these keep a patch from ever being attached
/// to a response that is not allowed.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdmissionResponse {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub uid: String,
    #[serde(default)]
    pub allowed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "base64_patch")]
    pub patch: Option<Vec<u8>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patch_type: Option<PatchType>,
    #[serde(default, rename = "status", skip_serializing_if = "Option::is_none")]
    pub result: Option<Status>,
}

impl AdmissionResponse {
    /// Allow the request unchanged.
    pub fn allow(uid: &str) -> Self {
        Self {
            uid: uid.to_string(),
            allowed: true,
            ..Default::default()
        }
    }

    /// Attach a JSON patch document. This always marks the response allowed.
    pub fn with_patch(mut self, patch: Vec<u8>) -> Self {
        self.allowed = true;
        self.patch = Some(patch);
        self.patch_type = Some(PatchType::JSONPatch);
        self.result = None;
        self
    }

    /// A response describing a failure. It is not allowed and never carries a patch.
    pub fn error(uid: Option<&str>, err: &AdmissionError) -> Self {
        Self {
            uid: uid.unwrap_or_default().to_string(),
            allowed: false,
            patch: None,
            patch_type: None,
            result: Some(Status {
                message: err.to_string(),
            }),
        }
    }
}

/// Serialize patch bytes as standard base64, the way the API server expects them.
mod base64_patch {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(patch: &Option<Vec<u8>>, serializer: S) -> Result<S::Ok, S::Error> {
        match patch {
            Some(bytes) => serializer.serialize_str(&STANDARD.encode(bytes)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Vec<u8>>, D::Error> {
        Option::<String>::deserialize(deserializer)?
            .map(|s| STANDARD.decode(s).map_err(serde::de::Error::custom))
            .transpose()
    }
}

/// Returns true if the content type names application/json. Parameters such
/// as charset are ignored.
pub fn is_json_content_type(content_type: &str) -> bool {
    content_type
        .split(';')
        .next()
        .map(str::trim)
        .is_some_and(|media_type| media_type.eq_ignore_ascii_case(CONTENT_TYPE_JSON))
}

/// Decode an inbound review. A body with the wrong content type is never parsed.
pub fn decode(
    content_type: Option<&str>,
    body: &[u8],
) -> AdmissionResult<(TypeMeta, AdmissionRequest)> {
    let content_type = content_type.unwrap_or_default();
    if !is_json_content_type(content_type) {
        return Err(AdmissionError::UnsupportedContentType(content_type.to_string()));
    }

    let review: AdmissionReview = serde_json::from_slice(body).map_err(AdmissionError::Decode)?;
    let request = review.request.ok_or(AdmissionError::MissingRequest)?;
    Ok((review.types, request))
}

/// Serialize an outbound review.
pub fn encode(review: &AdmissionReview) -> AdmissionResult<Vec<u8>> {
    serde_json::to_vec(review).map_err(AdmissionError::Encode)
}

/// Best-effort lookup of `request.uid` in a body that failed to decode as a review.
pub fn recover_uid(body: &[u8]) -> Option<String> {
    let value: serde_json::Value = serde_json::from_slice(body).ok()?;
    value
        .get("request")?
        .get("uid")?
        .as_str()
        .filter(|uid| !uid.is_empty())
        .map(str::to_string)
}

/// Best-effort lookup of `apiVersion` and `kind` in a body that failed to
/// decode as a review. Fields that cannot be read are left empty.
pub fn recover_types(body: &[u8]) -> TypeMeta {
    let Ok(value) = serde_json::from_slice::<serde_json::Value>(body) else {
        return TypeMeta::default();
    };
    let field = |name: &str| {
        value
            .get(name)
            .and_then(serde_json::Value::as_str)
            .unwrap_or_default()
            .to_string()
    };
    TypeMeta {
        api_version: field("apiVersion"),
        kind: field("kind"),
    }
}
