// Copyright 2026 S3Gate Team
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

//! Application initialization and runtime.
//!
//! Wires the configured origin and credentials into the request pipeline
//! and runs the HTTP server with graceful shutdown.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use s3gate_api::{create_router, AppState, StaticKeys};
use s3gate_core::FsOrigin;
use tokio::net::TcpListener;
use tracing::info;

use crate::config::{Config, OriginKind};

/// How long in-flight requests may drain after a shutdown signal.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(15);

/// Main application.
pub struct App {
    config: Config,
    state: AppState,
}

impl App {
    /// Creates the application from its configuration.
    pub async fn new(config: Config) -> Result<Self> {
        if config.auth.access_key_id.is_empty() || config.auth.secret_access_key.is_empty() {
            bail!("S3GATE_ACCESS_KEY_ID and S3GATE_SECRET_ACCESS_KEY must be set");
        }

        let origin = match config.origin.kind {
            OriginKind::Fs => {
                info!(root = %config.origin.root, "using filesystem origin");
                Arc::new(
                    FsOrigin::new(&config.origin.root, &config.auth.region)
                        .await
                        .context("failed to open filesystem origin")?,
                )
            }
            other => bail!("origin backend {other:?} is not wired into this build"),
        };

        let secrets = Arc::new(StaticKeys::new(
            &config.auth.access_key_id,
            &config.auth.secret_access_key,
            &config.auth.region,
        ));

        let state = AppState::new(origin, secrets)
            .with_max_body_size(config.limits.max_body_size)
            .with_read_body_timeout(Duration::from_secs(config.limits.read_body_timeout_secs));

        Ok(Self { config, state })
    }

    /// Runs the HTTP server until a shutdown signal arrives.
    pub async fn run(self) -> Result<()> {
        let addr: SocketAddr = self
            .config
            .server
            .bind
            .parse()
            .with_context(|| format!("invalid bind address: {}", self.config.server.bind))?;

        let router = create_router(self.state);
        let listener = TcpListener::bind(addr).await?;
        info!("listening on http://{addr}");

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        info!("server shutdown complete");
        Ok(())
    }
}

/// Resolves on SIGINT or SIGTERM, then arms the drain deadline.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c().await.expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received Ctrl+C, draining in-flight requests"),
        _ = terminate => info!("received terminate signal, draining in-flight requests"),
    }

    // In-flight requests get a bounded drain; a hung request must not
    // keep the process alive forever.
    tokio::spawn(async {
        tokio::time::sleep(SHUTDOWN_GRACE).await;
        tracing::error!(
            "graceful shutdown deadline ({}s) exceeded, exiting",
            SHUTDOWN_GRACE.as_secs()
        );
        std::process::exit(1);
    });
}
