//! # chirpy
//!
//! A small HTTP service: chirp validation, a counted static file server, and
//! the admin endpoints that read and reset that count.
//!
//! | Method | Path | |
//! |---|---|---|
//! | GET | `/api/healthz` | `200 OK`, body `OK` |
//! | GET | `/admin/metrics` | HTML page with the file-server hit count |
//! | GET | `/api/reset` | hit count := 0, body `OK` |
//! | POST | `/api/validate_chirp` | `{"body": …}` → `{"cleaned_body": …}` or `{"error": …}` |
//! | GET, HEAD | `/app/*` | files under the configured static root |
//!
//! Underneath is a minimal framework: radix-tree routing via [`matchit`],
//! hyper for HTTP/1.1 and HTTP/2, a middleware chain, and graceful shutdown.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use chirpy::{app, config, Server};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), chirpy::Error> {
//!     let cfg = config::load_or_default(config::DEFAULT_CONFIG_FILE)?;
//!     let router = app::build_router(app::AppState::new(&cfg));
//!     Server::bind(cfg.listen).serve(router).await
//! }
//! ```

mod error;
mod handler;
mod method;
mod request;
mod response;
mod router;
mod server;
mod status;

pub mod app;
pub mod chirp;
pub mod config;
pub mod files;
pub mod health;
pub mod metrics;
pub mod middleware;

pub use error::{Error, Result};
pub use handler::{BoxFuture, Handler};
pub use method::Method;
pub use request::Request;
pub use response::{ContentType, IntoResponse, Json, Response, ResponseBuilder};
pub use router::Router;
pub use server::{serve_with_shutdown, shutdown_signal, Server, MAX_BODY_BYTES};
pub use status::Status;
