//! The HTTP surface of slotscope.
//!
//! Serves `GET /storage/{address}` from a shared [`StorageService`], plus a `GET /health`
//! probe.

/// Error types for the server
pub mod error;

mod args;
mod routes;

pub use args::{ServeArgs, ServeArgsBuilder};
pub use error::Error;
pub use routes::{configure, ErrorBody, HealthBody, StorageBody, CACHE_CONTROL_VALUE};

use actix_web::{dev::ServerHandle, web, App, HttpServer};
use slotscope_common::constants::chain_name;
use slotscope_config::Configuration;
use slotscope_storage::StorageService;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::info;

/// Configures and starts the HTTP server.
#[derive(Debug)]
pub struct ServerBuilder {
    bind: String,
    port: u16,
    service: Arc<StorageService>,
}

impl ServerBuilder {
    /// A builder serving `service` on 127.0.0.1:3000.
    pub fn new(service: StorageService) -> Self {
        Self { bind: "127.0.0.1".to_owned(), port: 3000, service: Arc::new(service) }
    }

    /// The address to listen on.
    pub fn bind(mut self, v: &str) -> Self {
        v.clone_into(&mut self.bind);
        self
    }

    /// The port to listen on.
    pub fn port(mut self, v: u16) -> Self {
        self.port = v;
        self
    }

    /// Bind the listener and start serving in a background task.
    ///
    /// Returns a handle to stop the server and the task to await for its completion.
    pub fn run(self) -> Result<(ServerHandle, JoinHandle<Result<(), Error>>), Error> {
        let service = web::Data::from(self.service);

        let server = HttpServer::new(move || App::new().app_data(service.clone()).configure(configure))
            .bind((self.bind.as_str(), self.port))?
            .run();
        info!("listening on http://{}:{}", self.bind, self.port);

        let handle = server.handle();
        let task = tokio::spawn(async move { server.await.map_err(Error::from) });
        Ok((handle, task))
    }
}

/// The `serve` command: run the HTTP server until it is stopped.
pub async fn serve(args: ServeArgs) -> Result<(), Error> {
    let config = Configuration::load()?;
    let service = StorageService::from_config(&config)?;

    let bind = args.bind.unwrap_or(config.bind);
    let port = args.port.unwrap_or(config.port);
    let chains: Vec<String> = service.chains().into_iter().map(chain_name).collect();
    info!("serving chains {}", chains.join(", "));

    let (_handle, task) = ServerBuilder::new(service).bind(&bind).port(port).run()?;
    task.await.map_err(|e| Error::Task(e.to_string()))?
}
