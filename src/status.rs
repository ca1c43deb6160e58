//! HTTP status codes as a typed enum.
//!
//! Use [`Status`] anywhere a status code is accepted: `Response::status()`,
//! `Response::builder().status()`, or as a bare handler return value.
//!
//! ```rust
//! use chirpy::{Response, Status};
//!
//! // status-only, no body
//! Response::status(Status::InternalServerError);
//!
//! Response::builder()
//!     .status(Status::MovedPermanently)
//!     .header("location", "/app/")
//!     .no_body();
//!
//! // return Status directly from a handler
//! async fn gone(_req: chirpy::Request) -> Status {
//!     Status::NotFound
//! }
//! ```

/// The status codes chirpy answers with.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Status {
    // ── 2xx Success ───────────────────────────────────────────────────────────
    Ok,                  // 200

    // ── 3xx Redirection ───────────────────────────────────────────────────────
    MovedPermanently,    // 301

    // ── 4xx Client errors ─────────────────────────────────────────────────────
    BadRequest,          // 400
    Forbidden,           // 403
    NotFound,            // 404
    MethodNotAllowed,    // 405
    ContentTooLarge,     // 413

    // ── 5xx Server errors ─────────────────────────────────────────────────────
    InternalServerError, // 500
}

impl From<Status> for u16 {
    fn from(s: Status) -> u16 {
        match s {
            Status::Ok                  => 200,
            Status::MovedPermanently    => 301,
            Status::BadRequest          => 400,
            Status::Forbidden           => 403,
            Status::NotFound            => 404,
            Status::MethodNotAllowed    => 405,
            Status::ContentTooLarge     => 413,
            Status::InternalServerError => 500,
        }
    }
}
