//! Route table and the state shared across handlers.

use std::sync::Arc;

use crate::chirp::{self, WordFilter};
use crate::config::Config;
use crate::files::{self, FileServer};
use crate::health;
use crate::method::Method;
use crate::metrics::{self, HitCounter};
use crate::middleware::{self, CountHits, Trace};
use crate::request::Request;
use crate::response::Response;
use crate::router::Router;
use crate::status::Status;

/// Everything the handlers share. Cloning is cheap.
#[derive(Clone, Debug)]
pub struct AppState {
    pub hits: Arc<HitCounter>,
    pub filter: Arc<WordFilter>,
    pub files: Arc<FileServer>,
}

impl AppState {
    pub fn new(cfg: &Config) -> Self {
        Self {
            hits: Arc::new(HitCounter::new()),
            filter: Arc::new(WordFilter::new(&cfg.forbidden_words)),
            files: Arc::new(FileServer::new("/app", &cfg.static_root)),
        }
    }
}

/// Builds the full chirpy route table.
///
/// | Method | Path | |
/// |---|---|---|
/// | GET, HEAD | `/api/healthz` | readiness |
/// | GET, HEAD | `/admin/metrics` | hit count page |
/// | GET, HEAD | `/api/reset` | hit count := 0 |
/// | POST | `/api/validate_chirp` | chirp validation |
/// | GET, HEAD | `/app/*` | static files, counted |
///
/// Every GET route also answers HEAD; hyper drops the body on the wire.
pub fn build_router(state: AppState) -> Router {
    let app_route = |files: &Arc<FileServer>| {
        middleware::wrap(
            CountHits::new(Arc::clone(&state.hits)),
            files::handler(Arc::clone(files)),
        )
    };

    Router::new()
        .on(Method::Get,  "/api/healthz",        health::readiness)
        .on(Method::Head, "/api/healthz",        health::readiness)
        .on(Method::Get,  "/admin/metrics",      metrics::report(Arc::clone(&state.hits)))
        .on(Method::Head, "/admin/metrics",      metrics::report(Arc::clone(&state.hits)))
        .on(Method::Get,  "/api/reset",          metrics::reset(Arc::clone(&state.hits)))
        .on(Method::Head, "/api/reset",          metrics::reset(Arc::clone(&state.hits)))
        .on(Method::Post, "/api/validate_chirp", chirp::handler(Arc::clone(&state.filter)))
        .on(Method::Get,  "/app",                to_app_root)
        .on(Method::Head, "/app",                to_app_root)
        .on(Method::Get,  "/app/",               app_route(&state.files))
        .on(Method::Head, "/app/",               app_route(&state.files))
        .on(Method::Get,  "/app/{*path}",        app_route(&state.files))
        .on(Method::Head, "/app/{*path}",        app_route(&state.files))
        .layer(Trace)
}

async fn to_app_root(_req: Request) -> Response {
    Response::builder()
        .status(Status::MovedPermanently)
        .header("location", "/app/")
        .no_body()
}
