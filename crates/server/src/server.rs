//! HTTP server configuration and startup

use std::net::SocketAddr;

use tokio::net::TcpListener;
use tracing::info;

use swapc_core::{AppConfig, ServerConfig};

use crate::service::{router, PriceService};

/// HTTP server wrapper
pub struct HttpServer {
    config: ServerConfig,
    service: PriceService,
}

impl HttpServer {
    pub fn with_service(config: ServerConfig, service: PriceService) -> Self {
        Self { config, service }
    }

    /// Get reference to the service
    pub fn service(&self) -> &PriceService {
        &self.service
    }

    /// Start the server
    pub async fn start(&self) -> anyhow::Result<()> {
        self.serve(std::future::pending()).await
    }

    /// Start with graceful shutdown
    pub async fn start_with_shutdown(
        &self,
        shutdown: tokio::sync::oneshot::Receiver<()>,
    ) -> anyhow::Result<()> {
        self.serve(async move {
            shutdown.await.ok();
            info!("Shutdown signal received");
        })
        .await
    }

    async fn serve<F>(&self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let addr: SocketAddr = self.address().parse()?;
        let listener = TcpListener::bind(addr).await?;

        info!("HTTP server listening on {}", listener.local_addr()?);

        axum::serve(listener, router(self.service.clone()))
            .with_graceful_shutdown(shutdown)
            .await?;

        Ok(())
    }

    /// Get server address
    pub fn address(&self) -> String {
        format!("{}:{}", self.config.host, self.config.port)
    }
}

/// Builder for server configuration
pub struct HttpServerBuilder {
    config: ServerConfig,
    service: Option<PriceService>,
}

impl HttpServerBuilder {
    pub fn new() -> Self {
        Self {
            config: ServerConfig::default(),
            service: None,
        }
    }

    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.config.host = host.into();
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    pub fn service(mut self, service: PriceService) -> Self {
        self.service = Some(service);
        self
    }

    /// Falls back to a service built from default settings
    pub fn build(self) -> anyhow::Result<HttpServer> {
        let service = match self.service {
            Some(service) => service,
            None => PriceService::from_config(&AppConfig::default())?,
        };
        Ok(HttpServer::with_service(self.config, service))
    }
}

impl Default for HttpServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
