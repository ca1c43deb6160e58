//! Static file serving.
//!
//! A [`FileServer`] maps the part of the request path after its mount prefix
//! onto a root directory:
//!
//! - the path is percent-decoded, then cleaned as a rooted path (`.` and
//!   empty segments dropped, `..` pops a segment but never leaves the root);
//! - a directory without a trailing slash redirects to one, serves its
//!   `index.html` if present, or renders a listing;
//! - a file with a trailing slash redirects to the slash-less form;
//! - a direct request for `.../index.html` redirects to its directory.
//!
//! Redirects are relative, keep the query string, and are answered with
//! `301`. `HEAD` gets the same
//! status and headers as `GET` with an empty body.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use bytes::Bytes;
use tracing::{debug, error};

use crate::handler::Handler;
use crate::request::Request;
use crate::response::{ContentType, IntoResponse, Response};
use crate::status::Status;

/// Serves files under `root` for request paths starting with `prefix`.
#[derive(Debug)]
pub struct FileServer {
    prefix: String,
    root: PathBuf,
}

impl FileServer {
    /// `prefix` is stripped from the request path before it is resolved
    /// against `root`, e.g. `FileServer::new("/app", "./public")`.
    pub fn new(prefix: impl Into<String>, root: impl Into<PathBuf>) -> Self {
        let prefix = prefix.into().trim_end_matches('/').to_owned();
        Self { prefix, root: root.into() }
    }

    /// Answers one `GET` or `HEAD` request.
    pub async fn serve(&self, req: &Request) -> Response {
        let head = req.method() == "HEAD";
        let raw = req.path().strip_prefix(self.prefix.as_str()).unwrap_or(req.path());

        let Some(upath) = percent_decode(raw) else {
            return (Status::BadRequest, "400 Bad Request\n").into_response();
        };
        let upath = if upath.starts_with('/') { upath } else { format!("/{upath}") };

        if upath.ends_with("/index.html") {
            return redirect(req, "./");
        }

        let segments = clean(&upath);
        let fs_path = segments.iter().fold(self.root.clone(), |p, s| p.join(s));

        let meta = match tokio::fs::metadata(&fs_path).await {
            Ok(meta) => meta,
            Err(e) => return io_error(&fs_path, &e),
        };

        if meta.is_dir() {
            if !upath.ends_with('/') {
                return redirect(req, &format!("{}/", escape_path(base(&upath))));
            }
            let index = fs_path.join("index.html");
            if matches!(tokio::fs::metadata(&index).await, Ok(m) if m.is_file()) {
                return serve_file(&index, head).await;
            }
            return match list_dir(&fs_path).await {
                Ok(html) => with_length(ContentType::Html, html.into(), head),
                Err(e) => io_error(&fs_path, &e),
            };
        }

        if upath.ends_with('/') {
            return redirect(req, &format!("../{}", escape_path(base(&upath))));
        }
        serve_file(&fs_path, head).await
    }
}

/// `GET|HEAD {prefix}/{*path}`.
pub fn handler(files: Arc<FileServer>) -> impl Handler {
    move |req: Request| {
        let files = Arc::clone(&files);
        async move { files.serve(&req).await }
    }
}

async fn serve_file(path: &Path, head: bool) -> Response {
    let content = match tokio::fs::read(path).await {
        Ok(content) => content,
        Err(e) => return io_error(path, &e),
    };

    let content_type = path
        .extension()
        .and_then(|ext| ext.to_str())
        .and_then(ContentType::from_extension)
        .unwrap_or_else(|| sniff(&content));

    with_length(content_type, content.into(), head)
}

/// For `HEAD` the body is dropped but its length is still advertised.
fn with_length(content_type: ContentType, body: Bytes, head: bool) -> Response {
    if head {
        Response::builder()
            .header("content-length", &body.len().to_string())
            .bytes(content_type, Bytes::new())
    } else {
        Response::builder().bytes(content_type, body)
    }
}

fn sniff(content: &[u8]) -> ContentType {
    if std::str::from_utf8(content).is_ok() {
        ContentType::Text
    } else {
        ContentType::OctetStream
    }
}

fn redirect(req: &Request, location: &str) -> Response {
    let location = match req.query() {
        Some(query) if !query.is_empty() => format!("{location}?{query}"),
        _ => location.to_owned(),
    };
    Response::builder()
        .status(Status::MovedPermanently)
        .header("location", &location)
        .no_body()
}

fn io_error(path: &Path, e: &io::Error) -> Response {
    match e.kind() {
        io::ErrorKind::NotFound | io::ErrorKind::NotADirectory => {
            debug!(path = %path.display(), "not found");
            (Status::NotFound, "404 page not found\n").into_response()
        }
        io::ErrorKind::PermissionDenied => {
            debug!(path = %path.display(), "permission denied");
            (Status::Forbidden, "403 Forbidden\n").into_response()
        }
        _ => {
            error!(path = %path.display(), "serving file: {e}");
            (Status::InternalServerError, "500 Internal Server Error\n").into_response()
        }
    }
}

async fn list_dir(dir: &Path) -> io::Result<String> {
    let mut entries = Vec::new();
    let mut read = tokio::fs::read_dir(dir).await?;
    while let Some(entry) = read.next_entry().await? {
        let mut name = entry.file_name().to_string_lossy().into_owned();
        if entry.file_type().await?.is_dir() {
            name.push('/');
        }
        entries.push(name);
    }
    entries.sort();

    let mut html = String::from(
        "<!doctype html>\n<meta name=\"viewport\" content=\"width=device-width\">\n<pre>\n",
    );
    for name in &entries {
        html.push_str(&format!("<a href=\"{}\">{}</a>\n", escape_path(name), escape_html(name)));
    }
    html.push_str("</pre>\n");
    Ok(html)
}

/// Resolves `path` as rooted: the result never climbs above `/`.
fn clean(path: &str) -> Vec<&str> {
    let mut out = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                out.pop();
            }
            s => out.push(s),
        }
    }
    out
}

/// Last non-empty segment of `path`, `/` for the root.
fn base(path: &str) -> &str {
    path.trim_end_matches('/').rsplit('/').next().filter(|s| !s.is_empty()).unwrap_or("/")
}

/// Decodes `%XX` escapes. `None` for a malformed escape, a non-UTF-8 result
/// or an embedded NUL.
fn percent_decode(s: &str) -> Option<String> {
    fn hex(b: u8) -> Option<u8> {
        match b {
            b'0'..=b'9' => Some(b - b'0'),
            b'a'..=b'f' => Some(b - b'a' + 10),
            b'A'..=b'F' => Some(b - b'A' + 10),
            _ => None,
        }
    }

    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hi = hex(*bytes.get(i + 1)?)?;
            let lo = hex(*bytes.get(i + 2)?)?;
            out.push(hi << 4 | lo);
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    if out.contains(&0) {
        return None;
    }
    String::from_utf8(out).ok()
}

/// Percent-escapes everything but unreserved characters and `/`.
fn escape_path(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for b in s.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' | b'/' => {
                out.push(b as char)
            }
            _ => out.push_str(&format!("%{b:02X}")),
        }
    }
    out
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&#34;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;

    fn request(method: &str, path: &str) -> Request {
        http::Request::builder()
            .method(method)
            .uri(path)
            .body(Bytes::new())
            .unwrap()
            .into()
    }

    fn site() -> (TempDir, FileServer) {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("index.html"), "<h1>home</h1>").unwrap();
        fs::write(dir.path().join("logo.png"), [0x89, b'P', b'N', b'G', 0xff]).unwrap();
        fs::write(dir.path().join("notes"), "plain words").unwrap();
        fs::create_dir(dir.path().join("assets")).unwrap();
        fs::write(dir.path().join("assets/a&b.css"), "body{}").unwrap();
        fs::create_dir(dir.path().join("assets/img")).unwrap();
        let server = FileServer::new("/app", dir.path());
        (dir, server)
    }

    #[test]
    fn clean_never_escapes_root() {
        assert_eq!(clean("/a/./b//c"), ["a", "b", "c"]);
        assert_eq!(clean("/../../etc/passwd"), ["etc", "passwd"]);
        assert_eq!(clean("/a/b/../../../c"), ["c"]);
        assert!(clean("/").is_empty());
    }

    #[test]
    fn decode_rejects_bad_escapes() {
        assert_eq!(percent_decode("/a%20b").as_deref(), Some("/a b"));
        assert_eq!(percent_decode("/%2e%2E/x").as_deref(), Some("/../x"));
        assert_eq!(percent_decode("/%zz"), None);
        assert_eq!(percent_decode("/%4"), None);
        assert_eq!(percent_decode("/%00"), None);
        assert_eq!(percent_decode("/%ff"), None);
    }

    #[test]
    fn base_segment() {
        assert_eq!(base("/assets"), "assets");
        assert_eq!(base("/assets/img/"), "img");
        assert_eq!(base("/"), "/");
    }

    #[tokio::test]
    async fn root_serves_index() {
        let (_dir, files) = site();
        let res = files.serve(&request("GET", "/app/")).await;
        assert_eq!(res.code(), 200);
        assert_eq!(res.header("content-type"), Some("text/html; charset=utf-8"));
        assert_eq!(res.body(), b"<h1>home</h1>");
    }

    #[tokio::test]
    async fn index_html_redirects_to_directory() {
        let (_dir, files) = site();
        let res = files.serve(&request("GET", "/app/index.html")).await;
        assert_eq!(res.code(), 301);
        assert_eq!(res.header("location"), Some("./"));
    }

    #[tokio::test]
    async fn content_type_by_extension_then_sniffed() {
        let (_dir, files) = site();
        let png = files.serve(&request("GET", "/app/logo.png")).await;
        assert_eq!(png.header("content-type"), Some("image/png"));

        let notes = files.serve(&request("GET", "/app/notes")).await;
        assert_eq!(notes.header("content-type"), Some("text/plain; charset=utf-8"));
        assert_eq!(notes.body(), b"plain words");
    }

    #[tokio::test]
    async fn directory_without_slash_redirects() {
        let (_dir, files) = site();
        let res = files.serve(&request("GET", "/app/assets")).await;
        assert_eq!(res.code(), 301);
        assert_eq!(res.header("location"), Some("assets/"));
    }

    #[tokio::test]
    async fn file_with_slash_redirects() {
        let (_dir, files) = site();
        let res = files.serve(&request("GET", "/app/notes/")).await;
        assert_eq!(res.code(), 301);
        assert_eq!(res.header("location"), Some("../notes"));
    }

    #[tokio::test]
    async fn directory_listing_is_sorted_and_escaped() {
        let (_dir, files) = site();
        let res = files.serve(&request("GET", "/app/assets/")).await;
        assert_eq!(res.code(), 200);
        let body = std::str::from_utf8(res.body()).unwrap();
        assert_eq!(
            body,
            "<!doctype html>\n<meta name=\"viewport\" content=\"width=device-width\">\n<pre>\n\
             <a href=\"a%26b.css\">a&amp;b.css</a>\n\
             <a href=\"img/\">img/</a>\n\
             </pre>\n"
        );
    }

    #[tokio::test]
    async fn missing_file_is_404() {
        let (_dir, files) = site();
        let res = files.serve(&request("GET", "/app/nope.txt")).await;
        assert_eq!(res.code(), 404);
        assert_eq!(res.body(), b"404 page not found\n");

        let res = files.serve(&request("GET", "/app/notes/deeper")).await;
        assert_eq!(res.code(), 404);
    }

    #[tokio::test]
    async fn traversal_stays_in_root() {
        let outer = tempfile::tempdir().unwrap();
        let root = outer.path().join("public");
        fs::create_dir(&root).unwrap();
        fs::write(root.join("notes"), "plain words").unwrap();
        fs::write(outer.path().join("secret.txt"), "hidden").unwrap();
        let files = FileServer::new("/app", &root);

        let res = files.serve(&request("GET", "/app/../secret.txt")).await;
        assert_eq!(res.code(), 404);
        let res = files.serve(&request("GET", "/app/%2e%2e/%2e%2e/secret.txt")).await;
        assert_eq!(res.code(), 404);
        let res = files.serve(&request("GET", "/app/%2e%2e/notes")).await;
        assert_eq!(res.body(), b"plain words");
    }

    #[tokio::test]
    async fn bad_escape_is_400() {
        let (_dir, files) = site();
        let res = files.serve(&request("GET", "/app/%zz")).await;
        assert_eq!(res.code(), 400);
    }

    #[tokio::test]
    async fn head_has_length_but_no_body() {
        let (_dir, files) = site();
        let res = files.serve(&request("HEAD", "/app/notes")).await;
        assert_eq!(res.code(), 200);
        assert!(res.body().is_empty());
        assert_eq!(res.header("content-length"), Some("11"));
        assert_eq!(res.header("content-type"), Some("text/plain; charset=utf-8"));
    }

    #[tokio::test]
    async fn redirects_keep_the_query() {
        let (_dir, files) = site();
        for (path, location) in [
            ("/app/assets?v=2", "assets/?v=2"),
            ("/app/notes/?a=1&b", "../notes?a=1&b"),
            ("/app/index.html?x", "./?x"),
            ("/app/assets?", "assets/"),
        ] {
            let res = files.serve(&request("GET", path)).await;
            assert_eq!(res.code(), 301, "{path}");
            assert_eq!(res.header("location"), Some(location), "{path}");
        }
    }

    #[test]
    fn io_errors_map_to_statuses() {
        let path = Path::new("/srv/app/secret");
        for (kind, code, body) in [
            (io::ErrorKind::NotFound, 404, "404 page not found\n"),
            (io::ErrorKind::NotADirectory, 404, "404 page not found\n"),
            (io::ErrorKind::PermissionDenied, 403, "403 Forbidden\n"),
            (io::ErrorKind::Other, 500, "500 Internal Server Error\n"),
            (io::ErrorKind::InvalidData, 500, "500 Internal Server Error\n"),
        ] {
            let res = io_error(path, &io::Error::from(kind));
            assert_eq!(res.code(), code, "{kind:?}");
            assert_eq!(res.body(), body.as_bytes(), "{kind:?}");
        }
    }
}
