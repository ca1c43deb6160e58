//! File-server hit counting and the admin endpoints that expose it.
//!
//! | Endpoint | Handler | Effect |
//! |---|---|---|
//! | `GET /admin/metrics` | [`report`] | HTML page with the current count |
//! | `GET /api/reset` | [`reset`] | count := 0, plaintext `OK` |
//!
//! The counter itself is bumped by [`CountHits`](crate::middleware::CountHits)
//! on the routes it wraps.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::handler::Handler;
use crate::request::Request;
use crate::response::{ContentType, Response};

/// Process-lifetime request counter.
///
/// Atomic, so concurrent increments are never lost. A reset racing with an
/// increment may land on either side of it.
#[derive(Debug, Default)]
pub struct HitCounter {
    hits: AtomicU64,
}

impl HitCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn reset(&self) {
        self.hits.store(0, Ordering::Relaxed);
    }
}

/// Renders the admin page for `hits`.
pub fn render(hits: u64) -> String {
    format!(
        "<html> <body> <h1>Welcome, Chirpy Admin</h1> <p>Chirpy has been visited {hits} times!</p></body></html>"
    )
}

/// `GET /admin/metrics`.
pub fn report(counter: Arc<HitCounter>) -> impl Handler {
    move |_req: Request| {
        let hits = counter.get();
        async move { Response::builder().bytes(ContentType::Html, render(hits)) }
    }
}

/// `GET /api/reset`.
pub fn reset(counter: Arc<HitCounter>) -> impl Handler {
    move |_req: Request| {
        counter.reset();
        tracing::debug!("hit counter reset");
        async { Response::text("OK") }
    }
}
