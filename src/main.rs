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

//! Toleration webhook server.

use anyhow::Context;
use clap::Parser;
use std::sync::Arc;
use toleration_webhook::config::Cli;
use toleration_webhook::plugins::tolerationinjector::{self, Plugin};
use toleration_webhook::server;
use toleration_webhook::Webhook;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| cli.log_level.clone().into());

    if cli.log_json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    let plugin = Plugin::new(cli.injector_config()?);
    let config = plugin.config();
    tracing::info!(
        plugin = tolerationinjector::PLUGIN_NAME,
        match_label_key = %config.match_label_key,
        match_label_value = %config.match_label_value,
        tolerations = ?config.tolerations,
        operations = ?plugin.operations(),
        "Loaded configuration"
    );

    let webhook = Arc::new(Webhook::new(Arc::new(plugin)));
    let router = server::create_router(webhook);

    let listener = tokio::net::TcpListener::bind(cli.listen)
        .await
        .with_context(|| format!("failed to bind {}", cli.listen))?;
    tracing::info!(addr = %cli.listen, "Starting webhook server");

    server::serve(listener, router, server::shutdown_signal())
        .await
        .context("webhook server failed")?;

    tracing::info!("Webhook server stopped");
    Ok(())
}
