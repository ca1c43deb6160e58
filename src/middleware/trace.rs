//! Per-request tracing span with method, path, status and latency.

use std::time::Instant;

use tracing::{info, info_span, Instrument};

use super::{Middleware, Next};
use crate::handler::BoxFuture;
use crate::request::Request;

/// Opens an `info`-level `request` span around the rest of the chain and
/// logs the response status and latency when it completes.
pub struct Trace;

impl Middleware for Trace {
    fn call(&self, req: Request, next: Next) -> BoxFuture {
        let span = info_span!("request", method = %req.method(), path = %req.path());
        Box::pin(
            async move {
                let start = Instant::now();
                let res = next.run(req).await;
                info!(
                    status = res.code(),
                    latency_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "response"
                );
                res
            }
            .instrument(span),
        )
    }
}
