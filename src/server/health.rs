use crate::client::McpClient;
use crate::config::ManagerConfig;
use crate::error::{Error, Result};
use crate::transport::HttpTransport;
use std::time::Duration;

/// Probes a server's control endpoint for liveness.
///
/// A probe opens a short-lived session, sends a ping and closes the session.
/// [`check`](HealthChecker::check) never fails: refused connections, timeouts
/// and protocol errors all read as unhealthy.
#[derive(Debug, Clone)]
pub struct HealthChecker {
    host: String,
    endpoint_path: String,
    timeout: Duration,
}

impl HealthChecker {
    pub fn new(host: impl Into<String>, endpoint_path: impl Into<String>, timeout: Duration) -> Self {
        Self {
            host: host.into(),
            endpoint_path: endpoint_path.into(),
            timeout,
        }
    }

    pub fn from_config(config: &ManagerConfig) -> Self {
        Self::new(
            config.host.clone(),
            config.endpoint_path.clone(),
            config.health_check_timeout(),
        )
    }

    pub fn endpoint(&self, port: u16) -> String {
        format!("http://{}:{}{}", self.host, port, self.endpoint_path)
    }

    /// Pings the server on `port`, reporting why it is unhealthy.
    pub async fn probe(&self, port: u16) -> Result<()> {
        let transport = HttpTransport::new(format!("port-{}", port), self.endpoint(port), Some(self.timeout))?;
        let client = McpClient::new(format!("port-{}", port), transport);

        client
            .initialize()
            .await
            .map_err(|e| Error::HealthCheckFailed(e.to_string()))?;
        let outcome = client.ping().await;
        if let Err(e) = client.close().await {
            tracing::trace!(port, error = %e, "Failed to close health session");
        }

        outcome.map_err(|e| Error::HealthCheckFailed(e.to_string()))
    }

    /// `true` only if a full ping round trip succeeds.
    pub async fn check(&self, port: u16) -> bool {
        match self.probe(port).await {
            Ok(()) => true,
            Err(e) => {
                tracing::debug!(port, error = %e, "Server unhealthy");
                false
            }
        }
    }
}
