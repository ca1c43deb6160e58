//! Middleware layer.
//!
//! Middleware intercepts a request before its handler runs and sees the
//! response afterwards. It is the place for cross-cutting concerns: request
//! tracing, hit counting.
//!
//! There are two ways to apply one:
//!
//! - [`wrap`] composes a middleware with a single handler and returns a new
//!   handler. Only that route is affected.
//! - [`Router::layer`](crate::Router::layer) runs a middleware around every
//!   request the router sees, including 404 and 405 fallbacks.
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use chirpy::{Method, Request, Response, Router};
//! use chirpy::metrics::HitCounter;
//! use chirpy::middleware::{self, CountHits, Trace};
//!
//! # async fn page(_: Request) -> Response { Response::text("") }
//! let hits = Arc::new(HitCounter::new());
//! let app = Router::new()
//!     .on(Method::Get, "/app/", middleware::wrap(CountHits::new(hits), page))
//!     .layer(Trace);
//! ```

mod hits;
mod trace;

use std::sync::Arc;

pub use hits::CountHits;
pub use trace::Trace;

use crate::handler::{BoxFuture, BoxedHandler, Handler};
use crate::request::Request;

/// A request interceptor.
///
/// Implementations decide whether and when to call `next.run(req)`; whatever
/// future they return is what the client eventually gets.
pub trait Middleware: Send + Sync + 'static {
    fn call(&self, req: Request, next: Next) -> BoxFuture;
}

pub(crate) type Layers = Arc<[Arc<dyn Middleware>]>;

/// The rest of the chain: remaining middleware, then the handler.
pub struct Next {
    handler: BoxedHandler,
    layers: Layers,
    index: usize,
}

impl Next {
    pub(crate) fn new(handler: BoxedHandler, layers: Layers) -> Self {
        Self { handler, layers, index: 0 }
    }

    /// Passes `req` to the next middleware, or to the handler if none is left.
    pub fn run(self, req: Request) -> BoxFuture {
        let layer = self.layers.get(self.index).cloned();
        match layer {
            Some(middleware) => {
                let next = Next { index: self.index + 1, ..self };
                middleware.call(req, next)
            }
            None => self.handler.call(req),
        }
    }
}

/// Composes `middleware` with `handler` into a new handler.
pub fn wrap<M: Middleware, H: Handler>(middleware: M, handler: H) -> impl Handler {
    let inner = handler.into_boxed_handler();
    let layers: Layers = Arc::from(vec![Arc::new(middleware) as Arc<dyn Middleware>]);
    move |req: Request| Next::new(Arc::clone(&inner), Arc::clone(&layers)).run(req)
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use bytes::Bytes;

    use super::*;
    use crate::response::Response;

    /// Records its tag on the way in and on the way out.
    struct Tag(&'static str, Arc<Mutex<Vec<String>>>);

    impl Middleware for Tag {
        fn call(&self, req: Request, next: Next) -> BoxFuture {
            let tag = self.0;
            let log = Arc::clone(&self.1);
            Box::pin(async move {
                log.lock().unwrap().push(format!("{tag}>"));
                let res = next.run(req).await;
                log.lock().unwrap().push(format!("<{tag}"));
                res
            })
        }
    }

    struct ShortCircuit;

    impl Middleware for ShortCircuit {
        fn call(&self, _req: Request, _next: Next) -> BoxFuture {
            Box::pin(async { Response::text("blocked") })
        }
    }

    fn get() -> Request {
        http::Request::builder().uri("/").body(Bytes::new()).unwrap().into()
    }

    #[tokio::test]
    async fn layers_run_outermost_first() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let handler = {
            let log = Arc::clone(&log);
            move |_req: Request| {
                let log = Arc::clone(&log);
                async move {
                    log.lock().unwrap().push("handler".to_owned());
                    "done"
                }
            }
        };
        let layers: Layers = Arc::from(vec![
            Arc::new(Tag("a", Arc::clone(&log))) as Arc<dyn Middleware>,
            Arc::new(Tag("b", Arc::clone(&log))),
        ]);

        let res = Next::new(handler.into_boxed_handler(), layers).run(get()).await;

        assert_eq!(res.body(), b"done");
        assert_eq!(*log.lock().unwrap(), ["a>", "b>", "handler", "<b", "<a"]);
    }

    #[tokio::test]
    async fn middleware_can_skip_the_handler() {
        async fn unreachable_handler(_req: Request) -> Response {
            panic!("handler must not run");
        }

        let wrapped = wrap(ShortCircuit, unreachable_handler).into_boxed_handler();
        assert_eq!(wrapped.call(get()).await.body(), b"blocked");
    }
}
