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

//! Process configuration.
//!
//! Every setting can be given as a flag or through its environment variable.
//! Unset label and toleration settings default to the empty string.

use crate::admission::{AdmissionError, AdmissionResult, Operation, ALL_OPERATIONS};
use crate::api::core::{Toleration, TolerationEffect};
use crate::plugins::tolerationinjector;
use clap::Parser;
use std::net::SocketAddr;

/// Toleration webhook CLI
#[derive(Debug, Clone, Parser)]
#[command(name = "toleration-webhook")]
#[command(about = "Mutating admission webhook that injects a toleration into labelled pods", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Listen address
    #[arg(short, long, env = "WEBHOOK_LISTEN_ADDR", default_value = "0.0.0.0:8080")]
    pub listen: SocketAddr,

    /// Label key a pod must carry to receive the toleration
    #[arg(long, env = "MATCH_LABEL_KEY", default_value = "")]
    pub match_label_key: String,

    /// Value the match label must have
    #[arg(long, env = "MATCH_LABEL_VALUE", default_value = "")]
    pub match_label_value: String,

    /// Key of the injected toleration
    #[arg(long, env = "TOLERATION_KEY", default_value = "")]
    pub toleration_key: String,

    /// Value of the injected toleration
    #[arg(long, env = "TOLERATION_VALUE", default_value = "")]
    pub toleration_value: String,

    /// Effect of the injected toleration (NoSchedule, PreferNoSchedule, NoExecute or empty)
    #[arg(long, env = "TOLERATION_EFFECT", default_value = "")]
    pub toleration_effect: String,

    /// Operations to inject on, comma separated
    #[arg(
        long,
        env = "WEBHOOK_OPERATIONS",
        value_delimiter = ',',
        value_parser = parse_operation,
        default_values_t = ALL_OPERATIONS
    )]
    pub operations: Vec<Operation>,

    /// Log level
    #[arg(long, env = "WEBHOOK_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Enable JSON logging
    #[arg(long, env = "WEBHOOK_LOG_JSON")]
    pub log_json: bool,
}

fn parse_operation(s: &str) -> Result<Operation, String> {
    Operation::parse(s.trim()).ok_or_else(|| {
        format!(
            "unknown operation {:?}: supported values: CREATE, UPDATE, DELETE, CONNECT",
            s
        )
    })
}

impl Cli {
    /// Build the injector configuration. The toleration effect is validated here
    /// so a misconfigured process fails at startup rather than per request.
    pub fn injector_config(&self) -> AdmissionResult<tolerationinjector::Config> {
        let effect =
            TolerationEffect::parse(&self.toleration_effect).map_err(AdmissionError::invalid_config)?;

        if self.match_label_key.is_empty() {
            tracing::warn!("MATCH_LABEL_KEY is unset; only pods with an empty label key will match");
        }

        Ok(tolerationinjector::Config {
            match_label_key: self.match_label_key.clone(),
            match_label_value: self.match_label_value.clone(),
            tolerations: vec![Toleration::new(
                &self.toleration_key,
                &self.toleration_value,
                effect,
            )],
            operations: self.operations.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["toleration-webhook"]).unwrap();
        assert_eq!(cli.listen, "0.0.0.0:8080".parse::<SocketAddr>().unwrap());
        assert_eq!(cli.log_level, "info");
        assert!(!cli.log_json);

        let config = cli.injector_config().unwrap();
        assert_eq!(config.match_label_key, "");
        assert_eq!(config.match_label_value, "");
        assert_eq!(config.tolerations, vec![Toleration::new("", "", None)]);
        assert_eq!(config.operations.len(), 4);
    }

    #[test]
    fn test_flags() {
        let cli = Cli::try_parse_from([
            "toleration-webhook",
            "--listen",
            "127.0.0.1:8443",
            "--match-label-key",
            "team",
            "--match-label-value",
            "x",
            "--toleration-key",
            "dedicated",
            "--toleration-value",
            "special",
            "--toleration-effect",
            "NoSchedule",
            "--operations",
            "CREATE,update",
        ])
        .unwrap();

        let config = cli.injector_config().unwrap();
        assert_eq!(config.match_label_key, "team");
        assert_eq!(config.match_label_value, "x");
        assert_eq!(
            config.tolerations,
            vec![Toleration::new(
                "dedicated",
                "special",
                Some(TolerationEffect::NoSchedule)
            )]
        );
        assert_eq!(config.operations, vec![Operation::Create, Operation::Update]);
    }

    #[test]
    fn test_invalid_effect_rejected() {
        let cli = Cli::try_parse_from(["toleration-webhook", "--toleration-effect", "Sometimes"]).unwrap();
        let err = cli.injector_config().unwrap_err();
        assert!(matches!(err, AdmissionError::InvalidConfig(_)));
        assert!(err.to_string().contains("Sometimes"));
    }

    #[test]
    fn test_invalid_operation_rejected() {
        assert!(Cli::try_parse_from(["toleration-webhook", "--operations", "PATCH"]).is_err());
    }
}
