//! Cloneguard Server - HTTP REST API for code clone detection
//!
//! Exposes the detection cascade over HTTP:
//!
//! - `POST /detect` - check one submission against the corpus and index it
//! - `GET /health` - liveness probe
//! - `GET /ready` - readiness probe
//! - `GET /` - API information
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use server::ServerConfig;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ServerConfig::load()?;
//!     server::start_server(config).await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod routes;
pub mod server;
pub mod state;

pub use config::ServerConfig;
pub use error::{ServerError, ServerResult};
pub use server::{build_router, start_server};
pub use state::ServerState;
