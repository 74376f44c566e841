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

//! Admission attributes that describe an admission request.

use super::errors::{AdmissionError, AdmissionResult};
use super::interfaces::Operation;
use super::review::{AdmissionRequest, UserInfo};
use crate::api::core::{null_as_default, Pod};
use serde::{Deserialize, Serialize};
use std::fmt;

/// GroupVersionResource identifies a resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupVersionResource {
    #[serde(deserialize_with = "null_as_default")]
    pub group: String,
    #[serde(deserialize_with = "null_as_default")]
    pub version: String,
    #[serde(deserialize_with = "null_as_default")]
    pub resource: String,
}

impl GroupVersionResource {
    pub fn new(group: &str, version: &str, resource: &str) -> Self {
        Self {
            group: group.to_string(),
            version: version.to_string(),
            resource: resource.to_string(),
        }
    }
}

/// GroupVersionKind identifies a kind.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupVersionKind {
    #[serde(deserialize_with = "null_as_default")]
    pub group: String,
    #[serde(deserialize_with = "null_as_default")]
    pub version: String,
    #[serde(deserialize_with = "null_as_default")]
    pub kind: String,
}

impl GroupVersionKind {
    pub fn new(group: &str, version: &str, kind: &str) -> Self {
        Self {
            group: group.to_string(),
            version: version.to_string(),
            kind: kind.to_string(),
        }
    }
}

impl fmt::Display for GroupVersionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.group.is_empty() {
            write!(f, "{}/{}", self.version, self.kind)
        } else {
            write!(f, "{}/{}/{}", self.group, self.version, self.kind)
        }
    }
}

/// Attributes is an interface used by admission plugins to get information about a request
/// that is used to make an admission decision.
pub trait Attributes {
    /// Returns the correlation identifier of the request.
    fn get_uid(&self) -> &str;

    /// Returns the name of the object as presented in the request.
    fn get_name(&self) -> &str;

    /// Returns the namespace associated with the request (if any).
    fn get_namespace(&self) -> &str;

    /// Returns the resource being requested.
    fn get_resource(&self) -> &GroupVersionResource;

    /// Returns the operation being performed.
    fn get_operation(&self) -> Operation;

    /// Returns the kind of object being manipulated.
    fn get_kind(&self) -> &GroupVersionKind;

    /// Returns the user that issued the request.
    fn get_user_info(&self) -> &UserInfo;

    /// Returns the submitted object.
    fn get_pod(&self) -> &Pod;

    /// Check if this request is a dry run.
    fn is_dry_run(&self) -> bool;
}

/// AttributesRecord is a concrete implementation of Attributes.
#[derive(Debug, Clone)]
pub struct AttributesRecord {
    pub uid: String,
    pub name: String,
    pub namespace: String,
    pub resource: GroupVersionResource,
    pub operation: Operation,
    pub kind: GroupVersionKind,
    pub user_info: UserInfo,
    pub pod: Pod,
    pub dry_run: bool,
}

impl AttributesRecord {
    /// Build attributes from a decoded request, unmarshalling the raw object
    /// into the pod view. `operation` is the request's operation once it is
    /// known to be one of the admission operations.
    pub fn from_request(request: &AdmissionRequest, operation: Operation) -> AdmissionResult<Self> {
        let pod = Pod::deserialize(&request.object).map_err(AdmissionError::Unmarshal)?;

        Ok(Self {
            uid: request.uid.clone(),
            name: request.name.clone(),
            namespace: request.namespace.clone(),
            resource: request.resource.clone(),
            operation,
            kind: request.kind.clone(),
            user_info: request.user_info.clone(),
            pod,
            dry_run: request.dry_run,
        })
    }

    /// Helper to create attributes for a Pod resource.
    pub fn new_pod(uid: &str, operation: Operation, pod: Pod) -> Self {
        Self {
            uid: uid.to_string(),
            name: pod.metadata.name.clone(),
            namespace: pod.metadata.namespace.clone(),
            resource: GroupVersionResource::new("", "v1", "pods"),
            operation,
            kind: GroupVersionKind::new("", "v1", "Pod"),
            user_info: UserInfo::default(),
            pod,
            dry_run: false,
        }
    }
}

impl Attributes for AttributesRecord {
    fn get_uid(&self) -> &str {
        &self.uid
    }

    fn get_name(&self) -> &str {
        &self.name
    }

    fn get_namespace(&self) -> &str {
        &self.namespace
    }

    fn get_resource(&self) -> &GroupVersionResource {
        &self.resource
    }

    fn get_operation(&self) -> Operation {
        self.operation
    }

    fn get_kind(&self) -> &GroupVersionKind {
        &self.kind
    }

    fn get_user_info(&self) -> &UserInfo {
        &self.user_info
    }

    fn get_pod(&self) -> &Pod {
        &self.pod
    }

    fn is_dry_run(&self) -> bool {
        self.dry_run
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request_with_object(object: serde_json::Value) -> AdmissionRequest {
        AdmissionRequest {
            uid: "705ab4f5-6393-11e8-b7cc-42010a800002".to_string(),
            kind: GroupVersionKind::new("", "v1", "Pod"),
            resource: GroupVersionResource::new("", "v1", "pods"),
            namespace: "default".to_string(),
            operation: Some(Operation::Create),
            object,
            ..Default::default()
        }
    }

    #[test]
    fn test_attributes_record_from_request() {
        let request = request_with_object(json!({
            "metadata": {"name": "web", "namespace": "default", "labels": {"team": "x"}}
        }));

        let attrs = AttributesRecord::from_request(&request, Operation::Create).unwrap();
        assert_eq!(attrs.get_uid(), "705ab4f5-6393-11e8-b7cc-42010a800002");
        assert_eq!(attrs.get_namespace(), "default");
        assert_eq!(attrs.get_operation(), Operation::Create);
        assert_eq!(attrs.get_resource().resource, "pods");
        assert_eq!(attrs.get_kind().kind, "Pod");
        assert_eq!(attrs.get_pod().metadata.name, "web");
        assert!(!attrs.is_dry_run());
    }

    #[test]
    fn test_attributes_record_unmarshal_error() {
        let request = request_with_object(json!({"metadata": {"labels": ["not", "a", "map"]}}));
        let err = AttributesRecord::from_request(&request, Operation::Create).unwrap_err();
        assert!(matches!(err, AdmissionError::Unmarshal(_)));
    }

    #[test]
    fn test_attributes_record_missing_object() {
        let request = request_with_object(serde_json::Value::Null);
        let err = AttributesRecord::from_request(&request, Operation::Create).unwrap_err();
        assert!(matches!(err, AdmissionError::Unmarshal(_)));
    }

    #[test]
    fn test_attributes_record_new_pod() {
        let pod = Pod::new("test-pod", "default");
        let attrs = AttributesRecord::new_pod("uid-1", Operation::Update, pod);
        assert_eq!(attrs.get_name(), "test-pod");
        assert_eq!(attrs.get_namespace(), "default");
        assert_eq!(attrs.get_operation(), Operation::Update);
        assert_eq!(attrs.get_user_info().username, "");
    }

    #[test]
    fn test_group_version_kind_display() {
        assert_eq!(GroupVersionKind::new("", "v1", "Pod").to_string(), "v1/Pod");
        assert_eq!(
            GroupVersionKind::new("apps", "v1", "Deployment").to_string(),
            "apps/v1/Deployment"
        );
    }
}
