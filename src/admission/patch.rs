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

//! JSON Patch (RFC 6902) documents and JSON Pointer (RFC 6901) escaping.

use super::errors::{AdmissionError, AdmissionResult};
use serde::{Deserialize, Serialize};

/// PatchType identifies the patch format carried by an admission response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PatchType {
    /// JSONPatch means the patch is an RFC 6902 operation list.
    #[default]
    JSONPatch,
}

/// PatchOperation represents a single JSON Patch operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatchOperation {
    /// Operation type (add, remove, replace, move, copy, test).
    pub op: String,
    /// Path to the target location, as a JSON pointer.
    pub path: String,
    /// Value to use (for add, replace, test).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<serde_json::Value>,
    /// From path (for move, copy).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
}

impl PatchOperation {
    pub fn add(path: &str, value: serde_json::Value) -> Self {
        Self {
            op: "add".to_string(),
            path: path.to_string(),
            value: Some(value),
            from: None,
        }
    }
}

/// Patch is an ordered list of operations. Order is significant: the API
/// server applies operations one after another.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Patch(pub Vec<PatchOperation>);

impl Patch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Serialize the patch to the JSON document sent in an admission response.
    pub fn to_vec(&self) -> AdmissionResult<Vec<u8>> {
        serde_json::to_vec(&self.0).map_err(AdmissionError::Patch)
    }
}

impl FromIterator<PatchOperation> for Patch {
    fn from_iter<I: IntoIterator<Item = PatchOperation>>(iter: I) -> Self {
        Patch(iter.into_iter().collect())
    }
}

/// Escape a key so it can be used as a single JSON pointer path segment.
///
/// `~` must be replaced before `/`, otherwise the `~` introduced by `~1`
/// would be escaped a second time.
pub fn escape_json_pointer(s: &str) -> String {
    s.replace('~', "~0").replace('/', "~1")
}

/// Reverse of [`escape_json_pointer`].
pub fn unescape_json_pointer(s: &str) -> String {
    s.replace("~1", "/").replace("~0", "~")
}
