//! Outgoing HTTP response type and the [`IntoResponse`] conversion trait.
//!
//! Build a [`Response`] in your handler and return it, or return anything
//! that implements [`IntoResponse`]: a `&'static str`, a [`Status`], a
//! [`Json`] payload, or a `(Status, T)` pair to override the status.
//! Use [`Json::with_status`] rather than a pair for JSON error bodies.

use bytes::Bytes;
use http_body_util::Full;
use serde::Serialize;
use tracing::error;

use crate::status::Status;

// ── ContentType ───────────────────────────────────────────────────────────────

/// Content-type values chirpy sends, for use with [`ResponseBuilder::bytes`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ContentType {
    Css,          // text/css; charset=utf-8
    Gif,          // image/gif
    Html,         // text/html; charset=utf-8
    Ico,          // image/x-icon
    Jpeg,         // image/jpeg
    Js,           // text/javascript; charset=utf-8
    Json,         // application/json
    OctetStream,  // application/octet-stream
    Pdf,          // application/pdf
    Png,          // image/png
    Svg,          // image/svg+xml
    Text,         // text/plain; charset=utf-8
    Wasm,         // application/wasm
    Webp,         // image/webp
    Xml,          // text/xml; charset=utf-8
}

impl ContentType {
    pub(crate) fn as_str(&self) -> &'static str {
        match self {
            Self::Css         => "text/css; charset=utf-8",
            Self::Gif         => "image/gif",
            Self::Html        => "text/html; charset=utf-8",
            Self::Ico         => "image/x-icon",
            Self::Jpeg        => "image/jpeg",
            Self::Js          => "text/javascript; charset=utf-8",
            Self::Json        => "application/json",
            Self::OctetStream => "application/octet-stream",
            Self::Pdf         => "application/pdf",
            Self::Png         => "image/png",
            Self::Svg         => "image/svg+xml",
            Self::Text        => "text/plain; charset=utf-8",
            Self::Wasm        => "application/wasm",
            Self::Webp        => "image/webp",
            Self::Xml         => "text/xml; charset=utf-8",
        }
    }

    /// Looks up a content type by file extension (without the dot,
    /// case-insensitive).
    pub fn from_extension(ext: &str) -> Option<Self> {
        let ct = match ext.to_ascii_lowercase().as_str() {
            "css"          => Self::Css,
            "gif"          => Self::Gif,
            "htm" | "html" => Self::Html,
            "ico"          => Self::Ico,
            "jpeg" | "jpg" => Self::Jpeg,
            "js" | "mjs"   => Self::Js,
            "json"         => Self::Json,
            "pdf"          => Self::Pdf,
            "png"          => Self::Png,
            "svg"          => Self::Svg,
            "txt"          => Self::Text,
            "wasm"         => Self::Wasm,
            "webp"         => Self::Webp,
            "xml"          => Self::Xml,
            _              => return None,
        };
        Some(ct)
    }
}

// ── Response ─────────────────────────────────────────────────────────────────

/// An outgoing HTTP response.
///
/// # Shortcuts (200 OK, no custom headers needed)
///
/// ```rust
/// use chirpy::{Response, Status};
///
/// Response::json(br#"{"cleaned_body":"hi"}"#.to_vec());
/// Response::text("OK");
/// Response::status(Status::InternalServerError);
/// ```
///
/// # Builder (custom status or headers)
///
/// ```rust
/// use chirpy::{Response, ContentType, Status};
///
/// Response::builder()
///     .status(Status::BadRequest)
///     .json(br#"{"error":"Chirp is too long"}"#.to_vec());
///
/// Response::builder()
///     .bytes(ContentType::Html, "<p>hi</p>");
/// ```
#[derive(Debug)]
pub struct Response {
    pub(crate) body: Bytes,
    pub(crate) headers: Vec<(String, String)>,
    pub(crate) status: u16,
}

impl Response {
    /// `200 OK` with `application/json`.
    pub fn json(body: impl Into<Bytes>) -> Self {
        Self::builder().json(body)
    }

    /// `200 OK` with `text/plain; charset=utf-8`.
    pub fn text(body: impl Into<String>) -> Self {
        Self::builder().text(body)
    }

    /// Response with no body.
    pub fn status(code: Status) -> Self {
        Self { body: Bytes::new(), headers: Vec::new(), status: code.into() }
    }

    /// Builder for responses that need a custom status or extra headers.
    pub fn builder() -> ResponseBuilder {
        ResponseBuilder { headers: Vec::new(), status: Status::Ok.into() }
    }

    /// The numeric status code.
    pub fn code(&self) -> u16 { self.status }

    /// The body bytes.
    pub fn body(&self) -> &[u8] { &self.body }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Converts into the `http` type hyper writes to the wire.
    ///
    /// A header that `http` rejects degrades the whole response to a bare 500.
    pub(crate) fn into_inner(self) -> http::Response<Full<Bytes>> {
        let mut builder = http::Response::builder().status(self.status);
        for (name, value) in &self.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        builder.body(Full::new(self.body)).unwrap_or_else(|e| {
            error!("invalid response: {e}");
            let mut res = http::Response::new(Full::default());
            *res.status_mut() = http::StatusCode::INTERNAL_SERVER_ERROR;
            res
        })
    }
}

// ── ResponseBuilder ───────────────────────────────────────────────────────────

/// Fluent builder for [`Response`].
///
/// Obtain via [`Response::builder()`]. Defaults to `Status::Ok` (200).
/// Terminated by a typed body method, so you always know what you're sending.
pub struct ResponseBuilder {
    headers: Vec<(String, String)>,
    status: u16,
}

impl ResponseBuilder {
    pub fn status(mut self, code: Status) -> Self {
        self.status = code.into();
        self
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_owned(), value.to_owned()));
        self
    }

    /// Terminate with a JSON body (`application/json`).
    pub fn json(self, body: impl Into<Bytes>) -> Response {
        self.bytes(ContentType::Json, body)
    }

    /// Terminate with a plain-text body (`text/plain; charset=utf-8`).
    pub fn text(self, body: impl Into<String>) -> Response {
        self.bytes(ContentType::Text, body.into())
    }

    /// Terminate with a typed body. Use this for HTML, images, etc.
    pub fn bytes(self, content_type: ContentType, body: impl Into<Bytes>) -> Response {
        self.finish(content_type.as_str(), body.into())
    }

    /// Terminate with no body (e.g. `Status::MovedPermanently`).
    pub fn no_body(self) -> Response {
        Response { body: Bytes::new(), headers: self.headers, status: self.status }
    }

    fn finish(self, content_type: &str, body: Bytes) -> Response {
        let mut headers = vec![("content-type".to_owned(), content_type.to_owned())];
        headers.extend(self.headers);
        Response { body, headers, status: self.status }
    }
}

// ── IntoResponse ──────────────────────────────────────────────────────────────

/// Conversion into an HTTP [`Response`].
///
/// Implement on your own types to return them directly from handlers.
pub trait IntoResponse {
    fn into_response(self) -> Response;
}

impl IntoResponse for Response {
    fn into_response(self) -> Response { self }
}

impl IntoResponse for &'static str {
    fn into_response(self) -> Response { Response::text(self) }
}

impl IntoResponse for String {
    fn into_response(self) -> Response { Response::text(self) }
}

/// Return a [`Status`] directly from a handler: `return Status::NotFound`
impl IntoResponse for Status {
    fn into_response(self) -> Response { Response::status(self) }
}

/// Overrides the status of any other response: `(Status::BadRequest, Json(err))`.
impl<T: IntoResponse> IntoResponse for (Status, T) {
    fn into_response(self) -> Response {
        let mut res = self.1.into_response();
        res.status = self.0.into();
        res
    }
}

/// A serde-serialisable JSON body.
///
/// If serialisation fails the client gets a bare `500` and the error is
/// logged; the failure never reaches the wire.
pub struct Json<T>(pub T);

impl<T: Serialize> Json<T> {
    /// Serialises with `status`. A serialisation failure is still a bare 500.
    pub fn with_status(self, status: Status) -> Response {
        match serde_json::to_vec(&self.0) {
            Ok(bytes) => Response::builder().status(status).json(bytes),
            Err(e) => {
                error!("error marshalling JSON: {e}");
                Response::status(Status::InternalServerError)
            }
        }
    }
}

impl<T: Serialize> IntoResponse for Json<T> {
    fn into_response(self) -> Response {
        self.with_status(Status::Ok)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use serde::ser::Error as _;
    use serde::Serializer;

    use super::*;

    struct Unserialisable;

    impl Serialize for Unserialisable {
        fn serialize<S: Serializer>(&self, _: S) -> Result<S::Ok, S::Error> {
            Err(S::Error::custom("nope"))
        }
    }

    #[test]
    fn json_sets_content_type() {
        let mut body = BTreeMap::new();
        body.insert("cleaned_body", "hi");
        let res = Json(body).into_response();
        assert_eq!(res.code(), 200);
        assert_eq!(res.header("Content-Type"), Some("application/json"));
        assert_eq!(res.body(), br#"{"cleaned_body":"hi"}"#);
    }

    #[test]
    fn json_failure_is_bare_500() {
        for res in [
            Json(Unserialisable).into_response(),
            Json(Unserialisable).with_status(Status::BadRequest),
        ] {
            assert_eq!(res.code(), 500);
            assert!(res.body().is_empty());
            assert_eq!(res.header("content-type"), None);
        }
    }

    #[test]
    fn json_with_status() {
        let res = Json(["x"]).with_status(Status::BadRequest);
        assert_eq!(res.code(), 400);
        assert_eq!(res.body(), br#"["x"]"#);
    }

    #[test]
    fn status_override_keeps_headers() {
        let res = (Status::NotFound, "404 page not found\n").into_response();
        assert_eq!(res.code(), 404);
        assert_eq!(res.header("content-type"), Some("text/plain; charset=utf-8"));
    }

    #[test]
    fn builder_puts_content_type_first() {
        let res = Response::builder()
            .status(Status::MovedPermanently)
            .header("location", "/app/")
            .no_body();
        assert_eq!(res.code(), 301);
        assert_eq!(res.header("Location"), Some("/app/"));

        let res = Response::builder().header("x-a", "b").bytes(ContentType::Html, "<p/>");
        assert_eq!(res.headers[0].0, "content-type");
        assert_eq!(res.headers[1].0, "x-a");
    }

    #[test]
    fn into_inner_rejects_bad_header() {
        let res = Response::builder().header("bad header", "x").text("hi").into_inner();
        assert_eq!(res.status(), http::StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn extension_lookup() {
        assert_eq!(ContentType::from_extension("HTML"), Some(ContentType::Html));
        assert_eq!(ContentType::from_extension("png"), Some(ContentType::Png));
        assert_eq!(ContentType::from_extension("unknown"), None);
    }
}
