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

//! Core Kubernetes API types.
//!
//! These are narrow views of the upstream schemas: only the fields the webhook
//! reads are modelled, and anything else in a submitted object is ignored on
//! deserialization.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// Treat an explicit JSON `null` the same as an absent field.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

// ============================================================================
// Toleration Types
// ============================================================================

/// TolerationOperator represents an operator for toleration matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TolerationOperator {
    /// Exists means the key exists, regardless of value.
    Exists,
    /// Equal means the key/value must match exactly.
    Equal,
}

/// TolerationEffect describes the taint effect a toleration matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TolerationEffect {
    NoSchedule,
    PreferNoSchedule,
    NoExecute,
}

impl TolerationEffect {
    pub fn as_str(&self) -> &'static str {
        match self {
            TolerationEffect::NoSchedule => "NoSchedule",
            TolerationEffect::PreferNoSchedule => "PreferNoSchedule",
            TolerationEffect::NoExecute => "NoExecute",
        }
    }

    /// Parse an effect. The empty string is a valid, unset effect and yields
    /// `Ok(None)`; unknown names are rejected.
    pub fn parse(s: &str) -> Result<Option<Self>, String> {
        match s {
            "" => Ok(None),
            "NoSchedule" => Ok(Some(TolerationEffect::NoSchedule)),
            "PreferNoSchedule" => Ok(Some(TolerationEffect::PreferNoSchedule)),
            "NoExecute" => Ok(Some(TolerationEffect::NoExecute)),
            other => Err(format!(
                "unknown toleration effect {:?}: supported values: \"NoSchedule\", \"PreferNoSchedule\", \"NoExecute\"",
                other
            )),
        }
    }
}

impl fmt::Display for TolerationEffect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Toleration represents a toleration that a pod can have.
///
/// Empty strings and unset options are left out when serialized, which is
/// how the API server itself renders tolerations.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Toleration {
    /// Key is the taint key that the toleration applies to.
    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "String::is_empty")]
    pub key: String,
    /// Operator represents a key's relationship to the value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operator: Option<TolerationOperator>,
    /// Value is the taint value the toleration matches to.
    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "String::is_empty")]
    pub value: String,
    /// Effect indicates the taint effect to match. None matches all effects.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effect: Option<TolerationEffect>,
    /// TolerationSeconds represents the period of time the toleration tolerates the taint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub toleration_seconds: Option<i64>,
}

impl Toleration {
    /// Create a toleration from a (key, value, effect) triple.
    pub fn new(key: &str, value: &str, effect: Option<TolerationEffect>) -> Self {
        Self {
            key: key.to_string(),
            operator: None,
            value: value.to_string(),
            effect,
            toleration_seconds: None,
        }
    }
}

impl fmt::Display for Toleration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}={}:{}",
            self.key,
            self.value,
            self.effect.map(|e| e.as_str()).unwrap_or("")
        )
    }
}

// ============================================================================
// Pod
// ============================================================================

/// ObjectMeta holds the metadata fields the webhook reads.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ObjectMeta {
    /// Name of the object. Empty when the name is still to be generated.
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    /// Namespace of the object.
    #[serde(deserialize_with = "null_as_default")]
    pub namespace: String,
    /// GenerateName is the prefix used when the server assigns the name.
    #[serde(rename = "generateName", deserialize_with = "null_as_default")]
    pub generate_name: String,
    /// Labels is an unordered key value map.
    #[serde(deserialize_with = "null_as_default")]
    pub labels: HashMap<String, String>,
}

/// PodSpec holds the spec fields the webhook reads.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PodSpec {
    /// List of tolerations.
    #[serde(deserialize_with = "null_as_default")]
    pub tolerations: Vec<Toleration>,
}

/// Pod represents a Kubernetes Pod.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Pod {
    pub metadata: ObjectMeta,
    pub spec: PodSpec,
}

impl Pod {
    /// Create a new pod with the given name and namespace.
    pub fn new(name: &str, namespace: &str) -> Self {
        Self {
            metadata: ObjectMeta {
                name: name.to_string(),
                namespace: namespace.to_string(),
                ..Default::default()
            },
            spec: PodSpec::default(),
        }
    }

    /// Add a label, returning the pod for chaining.
    pub fn with_label(mut self, key: &str, value: &str) -> Self {
        self.metadata
            .labels
            .insert(key.to_string(), value.to_string());
        self
    }

    /// Name for logging: the name if set, otherwise the generateName prefix.
    pub fn display_name(&self) -> &str {
        if self.metadata.name.is_empty() {
            &self.metadata.generate_name
        } else {
            &self.metadata.name
        }
    }
}
