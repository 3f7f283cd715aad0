//! JSON-RPC API Layer
//!
//! Implements the JSON-RPC 2.0 server for the SiteBatch job engine.
//! Method names are versioned (`jobs.start.v1`); parameters are named objects.

pub mod error;
pub mod handler;
pub mod server;
pub mod types;

pub use server::{RpcServer, RpcServerConfig};
