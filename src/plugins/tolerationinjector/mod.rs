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

//! TolerationInjector admission controller.
//!
//! This admission controller adds a fixed set of tolerations to pods that carry
//! a configured label. A pod labelled `MATCH_LABEL_KEY=MATCH_LABEL_VALUE` gets
//! one JSON patch `add` operation per configured toleration, each targeting
//! `/spec/tolerations`. Pods without the label are admitted unchanged.
//!
//! Existing tolerations are not inspected: a pod that is admitted twice with
//! the label gets the tolerations twice. Restrict the handled operations to
//! CREATE when the webhook is registered for updates as well.

use crate::admission::{
    AdmissionError, AdmissionResult, Attributes, Handler, Interface, MutationInterface, Operation,
    Patch, PatchOperation, ALL_OPERATIONS,
};
use crate::api::core::{Pod, Toleration};
use std::collections::HashMap;

/// Plugin name for the TolerationInjector admission controller.
pub const PLUGIN_NAME: &str = "TolerationInjector";

/// JSON pointer to the pod's toleration list.
pub const TOLERATIONS_PATH: &str = "/spec/tolerations";

/// Config holds the injector settings. It is built once at startup and never
/// changes afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Label key a pod must carry to be eligible.
    pub match_label_key: String,
    /// Value the label must have.
    pub match_label_value: String,
    /// Tolerations added to eligible pods, in order.
    pub tolerations: Vec<Toleration>,
    /// Operations the injector acts on. Other operations are admitted unchanged.
    pub operations: Vec<Operation>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            match_label_key: String::new(),
            match_label_value: String::new(),
            tolerations: Vec::new(),
            operations: ALL_OPERATIONS.to_vec(),
        }
    }
}

/// Plugin injects the configured tolerations into matching pods.
pub struct Plugin {
    handler: Handler,
    config: Config,
}

impl Plugin {
    /// Create a new TolerationInjector admission controller.
    pub fn new(config: Config) -> Self {
        Self {
            handler: Handler::new(&config.operations),
            config,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The operations this plugin acts on, deduplicated.
    pub fn operations(&self) -> Vec<Operation> {
        self.handler.operations()
    }
}

impl Interface for Plugin {
    fn handles(&self, operation: Operation) -> bool {
        self.handler.handles(operation)
    }
}

impl MutationInterface for Plugin {
    fn admit(&self, attributes: &dyn Attributes) -> AdmissionResult<Patch> {
        let pod = attributes.get_pod();

        if !should_inject(
            &pod.metadata.labels,
            &self.config.match_label_key,
            &self.config.match_label_value,
        ) {
            tracing::info!(
                namespace = attributes.get_namespace(),
                name = pod.display_name(),
                "Skipping inject"
            );
            return Ok(Patch::new());
        }

        let patch = patch_config(pod, &self.config.tolerations)?;
        tracing::info!(
            namespace = attributes.get_namespace(),
            name = pod.display_name(),
            operations = patch.len(),
            "Injecting tolerations"
        );
        Ok(patch)
    }
}

/// Returns true if the labels contain `match_key` with exactly `match_value`.
///
/// Matching is literal. An empty `match_key` only matches a label whose key is
/// the empty string, so an unset configuration never selects every pod.
pub fn should_inject(labels: &HashMap<String, String>, match_key: &str, match_value: &str) -> bool {
    tracing::trace!(match_key, match_value, labels = ?labels, "Checking labels for injection");
    let matched = labels
        .get(match_key)
        .is_some_and(|value| value == match_value);
    tracing::debug!(match_key, matched, "Label match evaluated");
    matched
}

/// Build the patch that adds `tolerations` to `pod`.
pub fn patch_config(pod: &Pod, tolerations: &[Toleration]) -> AdmissionResult<Patch> {
    Ok(add_tolerations(&pod.spec.tolerations, tolerations)?
        .into_iter()
        .collect())
}

/// Emit one `add` operation per toleration in `to_add`, preserving order.
///
/// Each operation's value is a single-element list holding that toleration.
/// `current` is not used for deduplication.
pub fn add_tolerations(
    current: &[Toleration],
    to_add: &[Toleration],
) -> AdmissionResult<Vec<PatchOperation>> {
    tracing::trace!(existing = current.len(), adding = to_add.len(), "Building toleration patch");
    to_add
        .iter()
        .map(|toleration| {
            tracing::debug!(%toleration, "Adding toleration");
            let value = serde_json::to_value([toleration]).map_err(AdmissionError::Patch)?;
            Ok(PatchOperation::add(TOLERATIONS_PATH, value))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::admission::AttributesRecord;
    use crate::api::core::TolerationEffect;
    use serde_json::json;

    fn labels(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn dedicated() -> Toleration {
        Toleration::new("dedicated", "special", Some(TolerationEffect::NoSchedule))
    }

    fn config() -> Config {
        Config {
            match_label_key: "team".to_string(),
            match_label_value: "x".to_string(),
            tolerations: vec![dedicated()],
            ..Default::default()
        }
    }

    #[test]
    fn test_should_inject_exact_match() {
        assert!(should_inject(&labels(&[("team", "x")]), "team", "x"));
        assert!(should_inject(&labels(&[("app", "web"), ("team", "x")]), "team", "x"));
    }

    #[test]
    fn test_should_inject_value_mismatch() {
        assert!(!should_inject(&labels(&[("team", "x")]), "team", "y"));
        assert!(!should_inject(&labels(&[("team", "xy")]), "team", "x"));
        assert!(!should_inject(&labels(&[("team", "")]), "team", "x"));
    }

    #[test]
    fn test_should_inject_no_prefix_match() {
        assert!(!should_inject(&labels(&[("team-a", "x")]), "team", "x"));
        assert!(!should_inject(&labels(&[("example.com/team", "x")]), "team", "x"));
    }

    #[test]
    fn test_should_inject_empty_key_is_not_match_all() {
        assert!(!should_inject(&labels(&[("team", "x")]), "", ""));
        assert!(!should_inject(&labels(&[]), "", ""));
        assert!(should_inject(&labels(&[("", "")]), "", ""));
    }

    #[test]
    fn test_add_tolerations_single() {
        let ops = add_tolerations(&[], &[dedicated()]).unwrap();
        assert_eq!(ops.len(), 1);
        assert_eq!(
            serde_json::to_value(&ops[0]).unwrap(),
            json!({
                "op": "add",
                "path": "/spec/tolerations",
                "value": [{"key": "dedicated", "value": "special", "effect": "NoSchedule"}]
            })
        );
    }

    #[test]
    fn test_add_tolerations_preserves_order() {
        let second = Toleration::new("gpu", "", Some(TolerationEffect::NoExecute));
        let ops = add_tolerations(&[], &[dedicated(), second]).unwrap();
        assert_eq!(ops.len(), 2);
        assert_eq!(ops[0].value, Some(json!([{"key": "dedicated", "value": "special", "effect": "NoSchedule"}])));
        assert_eq!(ops[1].value, Some(json!([{"key": "gpu", "effect": "NoExecute"}])));
        assert!(ops.iter().all(|op| op.op == "add" && op.path == TOLERATIONS_PATH));
    }

    #[test]
    fn test_add_tolerations_does_not_deduplicate() {
        let ops = add_tolerations(&[dedicated()], &[dedicated()]).unwrap();
        assert_eq!(ops.len(), 1);
    }

    #[test]
    fn test_add_tolerations_nothing_to_add() {
        assert!(add_tolerations(&[dedicated()], &[]).unwrap().is_empty());
    }

    #[test]
    fn test_admit_matching_pod() {
        let plugin = Plugin::new(config());
        let mut pod = Pod::new("web", "default").with_label("team", "x");
        pod.spec.tolerations = vec![Toleration::new("existing", "a", None)];
        let attrs = AttributesRecord::new_pod("uid", Operation::Create, pod);

        let patch = plugin.admit(&attrs).unwrap();
        assert_eq!(patch.len(), 1);
        let doc: serde_json::Value = serde_json::from_slice(&patch.to_vec().unwrap()).unwrap();
        assert_eq!(
            doc,
            json!([{
                "op": "add",
                "path": "/spec/tolerations",
                "value": [{"key": "dedicated", "value": "special", "effect": "NoSchedule"}]
            }])
        );
    }

    #[test]
    fn test_admit_non_matching_pod() {
        let plugin = Plugin::new(config());
        let pod = Pod::new("web", "default").with_label("team", "y");
        let attrs = AttributesRecord::new_pod("uid", Operation::Create, pod);

        assert!(plugin.admit(&attrs).unwrap().is_empty());
    }

    #[test]
    fn test_admit_unset_config_matches_nothing() {
        let plugin = Plugin::new(Config {
            tolerations: vec![dedicated()],
            ..Default::default()
        });
        let pod = Pod::new("web", "default").with_label("team", "x");
        let attrs = AttributesRecord::new_pod("uid", Operation::Create, pod);

        assert!(plugin.admit(&attrs).unwrap().is_empty());
    }

    #[test]
    fn test_handles_defaults_to_all_operations() {
        let plugin = Plugin::new(config());
        assert!(plugin.handles(Operation::Create));
        assert!(plugin.handles(Operation::Update));
        assert!(plugin.handles(Operation::Delete));
        assert!(plugin.handles(Operation::Connect));
    }

    #[test]
    fn test_handles_restricted_operations() {
        let plugin = Plugin::new(Config {
            operations: vec![Operation::Create],
            ..config()
        });
        assert!(plugin.handles(Operation::Create));
        assert!(!plugin.handles(Operation::Update));
        assert_eq!(plugin.config().operations, vec![Operation::Create]);
        assert_eq!(plugin.operations(), vec![Operation::Create]);
    }
}
