//! Radix-tree request router.
//!
//! One tree per HTTP method, O(path-length) lookup. You register a path, you
//! get a handler. Router-wide middleware runs around every request, fallbacks
//! included.

use std::collections::HashMap;
use std::sync::Arc;

use matchit::Router as MatchitRouter;

use crate::handler::{BoxedHandler, Handler};
use crate::method::Method;
use crate::middleware::{Layers, Middleware, Next};
use crate::request::Request;
use crate::response::Response;
use crate::status::Status;

/// The application router.
///
/// Build it once at startup and pass it to [`Server::serve`](crate::Server::serve).
/// Each [`Router::on`] call returns `self` so registrations chain naturally.
pub struct Router {
    routes: HashMap<Method, MatchitRouter<BoxedHandler>>,
    layers: Layers,
    not_found: BoxedHandler,
}

enum Route {
    Found(BoxedHandler, HashMap<String, String>),
    MethodNotAllowed(Vec<Method>),
    NotFound,
}

impl Router {
    pub fn new() -> Self {
        Self {
            routes: HashMap::new(),
            layers: Arc::from(Vec::new()),
            not_found: not_found.into_boxed_handler(),
        }
    }

    /// Register a handler for a method + path pair. Returns `self` for chaining.
    ///
    /// Path parameters use `{name}` syntax and catch-alls `{*name}`;
    /// `req.param("name")` retrieves them:
    ///
    /// ```rust,no_run
    /// # use chirpy::{Method, Request, Response, Router};
    /// # async fn healthz(_: Request) -> Response { Response::text("") }
    /// # async fn serve_file(_: Request) -> Response { Response::text("") }
    /// Router::new()
    ///     .on(Method::Get, "/api/healthz",  healthz)
    ///     .on(Method::Get, "/app/{*path}",  serve_file);
    /// ```
    ///
    /// # Panics
    ///
    /// Panics if `path` is not a valid route or conflicts with one already
    /// registered for `method`.
    pub fn on(mut self, method: Method, path: &str, handler: impl Handler) -> Self {
        self.routes
            .entry(method)
            .or_default()
            .insert(path, handler.into_boxed_handler())
            .unwrap_or_else(|e| panic!("invalid route `{method} {path}`: {e}"));
        self
    }

    /// Runs `middleware` around every request. Layers added first run
    /// outermost.
    pub fn layer(mut self, middleware: impl Middleware) -> Self {
        let mut layers = self.layers.to_vec();
        layers.push(Arc::new(middleware));
        self.layers = layers.into();
        self
    }

    /// Routes one request through the middleware stack to its handler.
    ///
    /// Unknown paths answer `404`; a path registered under other methods
    /// answers `405` with an `allow` header.
    pub async fn handle(&self, mut req: Request) -> Response {
        let handler = match self.lookup(req.method(), req.path()) {
            Route::Found(handler, params) => {
                req.params = params;
                handler
            }
            Route::MethodNotAllowed(allow) => method_not_allowed(&allow),
            Route::NotFound => Arc::clone(&self.not_found),
        };

        Next::new(handler, Arc::clone(&self.layers)).run(req).await
    }

    fn lookup(&self, method: &str, path: &str) -> Route {
        if let Ok(method) = method.parse::<Method>() {
            if let Some(matched) = self.routes.get(&method).and_then(|tree| tree.at(path).ok()) {
                let params = matched.params.iter()
                    .map(|(k, v)| (k.to_owned(), v.to_owned()))
                    .collect();
                return Route::Found(Arc::clone(matched.value), params);
            }
        }

        let mut allow: Vec<Method> = self.routes.iter()
            .filter(|(_, tree)| tree.at(path).is_ok())
            .map(|(method, _)| *method)
            .collect();
        if allow.is_empty() {
            return Route::NotFound;
        }
        allow.sort();
        Route::MethodNotAllowed(allow)
    }
}

impl Default for Router {
    fn default() -> Self { Self::new() }
}

async fn not_found(_req: Request) -> (Status, &'static str) {
    (Status::NotFound, "404 page not found\n")
}

fn method_not_allowed(allow: &[Method]) -> BoxedHandler {
    let allow = allow.iter().map(|m| m.as_str()).collect::<Vec<_>>().join(", ");
    let handler = move |_req: Request| {
        let allow = allow.clone();
        async move {
            Response::builder()
                .status(Status::MethodNotAllowed)
                .header("allow", &allow)
                .text("Method Not Allowed\n")
        }
    };
    handler.into_boxed_handler()
}
