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

//! HTTP transport for the webhook.
//!
//! TLS is terminated in front of this server.

use crate::admission::review::CONTENT_TYPE_JSON;
use crate::admission::AdmissionError;
use crate::webhook::Webhook;
use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, State},
    http::{header::CONTENT_TYPE, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

/// Largest review body accepted.
pub const MAX_REVIEW_BYTES: usize = 8 * 1024 * 1024;

/// Create the webhook router.
pub fn create_router(webhook: Arc<Webhook>) -> Router {
    Router::new()
        .route("/", post(mutate))
        .route("/mutate", post(mutate))
        .route("/healthz", get(healthz))
        .layer(DefaultBodyLimit::max(MAX_REVIEW_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(webhook)
}

async fn mutate(State(webhook): State<Arc<Webhook>>, headers: HeaderMap, body: Bytes) -> Response {
    let content_type = headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok());

    match webhook.serve(content_type, &body) {
        Ok(bytes) => ([(CONTENT_TYPE, CONTENT_TYPE_JSON)], bytes).into_response(),
        Err(err @ AdmissionError::UnsupportedContentType(_)) => {
            tracing::warn!(error = %err, "Wrong content type");
            StatusCode::UNSUPPORTED_MEDIA_TYPE.into_response()
        }
        Err(err) => {
            tracing::error!(error = %err, "Error marshalling decision");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

async fn healthz() -> &'static str {
    "ok"
}

/// Serve the router on `listener` until `shutdown` resolves.
pub async fn serve<F>(listener: TcpListener, router: Router, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await
}

/// Resolves on Ctrl-C, or SIGTERM on unix.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::warn!("Failed to listen for Ctrl-C: {}", err);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::warn!("Failed to listen for SIGTERM: {}", err);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
