//! JSON-RPC Server
//!
//! Implements the JSON-RPC 2.0 server over HTTP on localhost.

use crate::handler::RpcHandler;
use crate::types::{CreateJobRequest, EstimateRequest, JobIdRequest, ListJobsRequest};
use jsonrpsee::server::{Server, ServerHandle};
use jsonrpsee::RpcModule;
use sitebatch_core::application::BatchJobService;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

const DEFAULT_RPC_HOST: &str = "127.0.0.1";
const DEFAULT_RPC_PORT: u16 = 9630;

/// RPC Server Configuration
#[derive(Debug, Clone)]
pub struct RpcServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for RpcServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_RPC_HOST.to_string(),
            port: DEFAULT_RPC_PORT,
        }
    }
}

/// Register a method whose params deserialize into `$req` and that is
/// served by `RpcHandler::$method`
macro_rules! register {
    ($module:expr, $handler:expr, $name:literal, $req:ty, $method:ident) => {{
        let handler = Arc::clone(&$handler);
        $module.register_async_method($name, move |params, _, _| {
            let handler = handler.clone();
            async move {
                let req: $req = params.parse()?;
                handler.$method(req).await
            }
        })?;
    }};
}

/// Build the RPC module with every method registered
pub fn build_module(
    handler: Arc<RpcHandler>,
) -> Result<RpcModule<()>, jsonrpsee::core::RegisterMethodError> {
    let mut module = RpcModule::new(());

    register!(module, handler, "jobs.create.v1", CreateJobRequest, create);
    register!(module, handler, "jobs.start.v1", JobIdRequest, start);
    register!(module, handler, "jobs.pause.v1", JobIdRequest, pause);
    register!(module, handler, "jobs.resume.v1", JobIdRequest, resume);
    register!(module, handler, "jobs.cancel.v1", JobIdRequest, cancel);
    register!(module, handler, "jobs.get.v1", JobIdRequest, get);

    // Filter is optional, so params may be omitted entirely
    let list_handler = Arc::clone(&handler);
    module.register_async_method("jobs.list.v1", move |params, _, _| {
        let handler = list_handler.clone();
        async move {
            let req: Option<ListJobsRequest> = params.parse()?;
            handler.list(req.unwrap_or_default()).await
        }
    })?;

    register!(module, handler, "schedule.estimate.v1", EstimateRequest, estimate);

    Ok(module)
}

/// RPC Server
pub struct RpcServer {
    config: RpcServerConfig,
    handler: Arc<RpcHandler>,
}

impl RpcServer {
    pub fn new(config: RpcServerConfig, service: Arc<BatchJobService>) -> Self {
        Self {
            config,
            handler: Arc::new(RpcHandler::new(service)),
        }
    }

    /// Start the JSON-RPC server
    ///
    /// Returns the bound address (useful with port 0) and the server handle.
    /// Security: binds to the configured host only, 127.0.0.1 by default
    pub async fn start(self) -> Result<(SocketAddr, ServerHandle), String> {
        let addr = format!("{}:{}", self.config.host, self.config.port);

        info!(
            host = %self.config.host,
            port = %self.config.port,
            "Starting JSON-RPC server"
        );

        let server = Server::builder()
            .build(&addr)
            .await
            .map_err(|e| format!("Failed to build server on {}: {}", addr, e))?;
        let local_addr = server
            .local_addr()
            .map_err(|e| format!("Failed to read bound address: {}", e))?;

        let module = build_module(self.handler).map_err(|e| e.to_string())?;

        info!(addr = %local_addr, "JSON-RPC server started successfully");

        let handle = server.start(module);
        Ok((local_addr, handle))
    }
}
