//! Hit counting.

use std::sync::Arc;

use super::{Middleware, Next};
use crate::handler::BoxFuture;
use crate::metrics::HitCounter;
use crate::request::Request;

/// Increments a shared [`HitCounter`] once per request, before the wrapped
/// handler runs. The count includes requests the handler answers with an
/// error status.
pub struct CountHits {
    counter: Arc<HitCounter>,
}

impl CountHits {
    pub fn new(counter: Arc<HitCounter>) -> Self {
        Self { counter }
    }
}

impl Middleware for CountHits {
    fn call(&self, req: Request, next: Next) -> BoxFuture {
        self.counter.increment();
        next.run(req)
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use super::*;
    use crate::handler::Handler;
    use crate::middleware::wrap;
    use crate::status::Status;

    async fn missing(_req: Request) -> Status {
        Status::NotFound
    }

    #[tokio::test]
    async fn counts_every_request_even_failures() {
        let counter = Arc::new(HitCounter::new());
        let handler = wrap(CountHits::new(Arc::clone(&counter)), missing).into_boxed_handler();

        for _ in 0..3 {
            let req = http::Request::builder().uri("/app/nope").body(Bytes::new()).unwrap();
            assert_eq!(handler.call(req.into()).await.code(), 404);
        }
        assert_eq!(counter.get(), 3);
    }
}
