//! Handler trait and type erasure.
//!
//! # How async handlers are stored
//!
//! The router holds handlers of *different* types (plain `async fn`s,
//! closures capturing shared state, middleware-wrapped handlers) in one
//! `HashMap<Method, Tree>`. They are hidden behind `dyn ErasedHandler` so the
//! map stores one concrete type:
//!
//! ```text
//! async fn healthz(req: Request) -> Response { … }   ← user writes this
//!        ↓ router.on(Method::Get, "/api/healthz", healthz)
//! healthz.into_boxed_handler()                       ← Handler blanket impl
//!        ↓
//! Arc::new(FnHandler(healthz))                       ← heap-allocated wrapper
//!        ↓  stored as BoxedHandler = Arc<dyn ErasedHandler>
//! handler.call(req)  at request time                 ← one vtable dispatch
//! ```

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::request::Request;
use crate::response::{IntoResponse, Response};

// ── Internal types ────────────────────────────────────────────────────────────

/// A heap-allocated, type-erased future that resolves to a [`Response`].
///
/// Returned by [`Middleware::call`](crate::middleware::Middleware::call) and
/// [`Next::run`](crate::middleware::Next::run).
pub type BoxFuture = Pin<Box<dyn Future<Output = Response> + Send + 'static>>;

/// Internal dispatch interface.
///
/// `#[doc(hidden)] pub` rather than `pub(crate)` because it appears in the
/// return type of the public `Handler` trait's `into_boxed_handler` method.
#[doc(hidden)]
pub trait ErasedHandler {
    fn call(&self, req: Request) -> BoxFuture;
}

/// A type-erased handler shared across concurrent requests.
#[doc(hidden)]
pub type BoxedHandler = Arc<dyn ErasedHandler + Send + Sync + 'static>;

// ── Public Handler trait ──────────────────────────────────────────────────────

/// Implemented for every valid route handler.
///
/// You never implement this yourself. It is satisfied by any `async fn` or
/// closure with the shape:
///
/// ```text
/// Fn(Request) -> impl Future<Output = impl IntoResponse>
/// ```
///
/// Closures are how handlers reach shared state: clone an `Arc` into a
/// `move` closure and return an `async move` block.
///
/// The trait is **sealed**: only the blanket impl below can satisfy it.
pub trait Handler: private::Sealed + Send + Sync + 'static {
    #[doc(hidden)]
    fn into_boxed_handler(self) -> BoxedHandler;
}

mod private {
    pub trait Sealed {}
}

// ── Blanket implementations ───────────────────────────────────────────────────

impl<F, Fut, R> private::Sealed for F
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
}

impl<F, Fut, R> Handler for F
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
    fn into_boxed_handler(self) -> BoxedHandler {
        Arc::new(FnHandler(self))
    }
}

// ── Concrete wrapper ──────────────────────────────────────────────────────────

/// Holds a concrete handler `F` and implements [`ErasedHandler`] for it.
struct FnHandler<F>(F);

impl<F, Fut, R> ErasedHandler for FnHandler<F>
where
    F: Fn(Request) -> Fut + Send + Sync,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
    fn call(&self, req: Request) -> BoxFuture {
        let fut = (self.0)(req);
        Box::pin(async move { fut.await.into_response() })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use bytes::Bytes;

    use super::*;
    use crate::status::Status;

    fn get(path: &str) -> Request {
        http::Request::builder().uri(path).body(Bytes::new()).unwrap().into()
    }

    async fn reject(_req: Request) -> Status {
        Status::BadRequest
    }

    #[tokio::test]
    async fn async_fn_is_a_handler() {
        let h = reject.into_boxed_handler();
        assert_eq!(h.call(get("/")).await.code(), 400);
    }

    #[tokio::test]
    async fn closure_can_capture_state() {
        let calls = Arc::new(AtomicUsize::new(0));
        let h = {
            let calls = Arc::clone(&calls);
            move |req: Request| {
                let calls = Arc::clone(&calls);
                async move {
                    calls.fetch_add(1, Ordering::Relaxed);
                    format!("saw {}", req.path())
                }
            }
        }
        .into_boxed_handler();

        let res = h.call(get("/x")).await;
        assert_eq!(res.body(), b"saw /x");
        h.call(get("/y")).await;
        assert_eq!(calls.load(Ordering::Relaxed), 2);
    }
}
