//! Readiness check.
//!
//! `GET /api/healthz` answers `200 OK` with body `OK` for as long as the
//! process can answer HTTP at all. It has no dependencies to check.

use crate::{Request, Response};

/// Always `200 OK`, `text/plain`, body `"OK"`.
pub async fn readiness(_req: Request) -> Response {
    Response::text("OK")
}
