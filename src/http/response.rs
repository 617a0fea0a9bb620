use std::fs::{self, File, Metadata};
use std::path::{Component, Path, PathBuf};

use memmap2::Mmap;

use crate::buffer::ByteBuffer;
use crate::http::mime;

const HTTP_VERSION: &str = "HTTP/1.1";

/// HTTP status codes the server answers with.
///
/// - `Ok` (200): the file is served
/// - `BadRequest` (400): malformed request, also the fallback for unknown codes
/// - `Forbidden` (403): the file is not world-readable
/// - `NotFound` (404): missing file or a directory
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCode {
    /// 200 OK
    Ok,
    /// 400 Bad Request
    BadRequest,
    /// 403 Forbidden
    Forbidden,
    /// 404 Not Found
    NotFound,
}

impl StatusCode {
    pub fn from_u16(code: u16) -> Option<Self> {
        match code {
            200 => Some(StatusCode::Ok),
            400 => Some(StatusCode::BadRequest),
            403 => Some(StatusCode::Forbidden),
            404 => Some(StatusCode::NotFound),
            _ => None,
        }
    }

    /// Returns the numeric HTTP status code.
    ///
    /// # Example
    ///
    /// ```
    /// # use tinyweb::http::response::StatusCode;
    /// assert_eq!(StatusCode::Ok.as_u16(), 200);
    /// assert_eq!(StatusCode::NotFound.as_u16(), 404);
    /// ```
    pub fn as_u16(&self) -> u16 {
        match self {
            StatusCode::Ok => 200,
            StatusCode::BadRequest => 400,
            StatusCode::Forbidden => 403,
            StatusCode::NotFound => 404,
        }
    }

    /// Returns the standard HTTP reason phrase for this status code.
    pub fn reason_phrase(&self) -> &'static str {
        match self {
            StatusCode::Ok => "OK",
            StatusCode::BadRequest => "Bad Request",
            StatusCode::Forbidden => "Forbidden",
            StatusCode::NotFound => "Not Found",
        }
    }

    /// The canned page served in place of the requested path, if any.
    pub fn error_page(&self) -> Option<&'static str> {
        match self {
            StatusCode::Ok => None,
            StatusCode::BadRequest => Some("/400.html"),
            StatusCode::Forbidden => Some("/403.html"),
            StatusCode::NotFound => Some("/404.html"),
        }
    }
}

/// Builds the response for one request into a [`ByteBuffer`].
///
/// The status line and headers are written into the buffer. A successfully
/// opened file is memory-mapped and kept here instead of being copied, so the
/// caller sends [`file`](Self::file) right after the buffer contents. The
/// mapping lives until [`unmap_file`](Self::unmap_file), the next
/// [`init`](Self::init), or drop, whichever comes first.
#[derive(Debug, Default)]
pub struct Response {
    code: Option<u16>,
    keep_alive: bool,
    path: String,
    doc_root: PathBuf,
    file: Option<Mmap>,
}

impl Response {
    pub fn new() -> Self {
        Self::default()
    }

    /// Prepares for a new response, releasing any mapping still held.
    ///
    /// `code` forces a status; `None` lets the filesystem decide.
    pub fn init(
        &mut self,
        doc_root: impl Into<PathBuf>,
        path: impl Into<String>,
        keep_alive: bool,
        code: Option<u16>,
    ) {
        self.unmap_file();
        self.code = code;
        self.keep_alive = keep_alive;
        self.path = path.into();
        self.doc_root = doc_root.into();
    }

    /// The status code, resolved once [`make_response`](Self::make_response) ran.
    pub fn code(&self) -> Option<u16> {
        self.code
    }

    /// The path actually served, which is the canned page for error codes.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn file(&self) -> Option<&[u8]> {
        self.file.as_deref()
    }

    pub fn file_len(&self) -> usize {
        self.file.as_ref().map_or(0, |m| m.len())
    }

    pub fn unmap_file(&mut self) {
        if let Some(map) = self.file.take() {
            tracing::trace!(len = map.len(), "unmapping file");
        }
    }

    pub fn make_response(&mut self, buf: &mut ByteBuffer) {
        let code = self.resolve_code();
        self.code = Some(code);
        self.error_html();
        self.add_status_line(buf);
        self.add_headers(buf);
        self.add_content(buf);
    }

    fn full_path(&self) -> PathBuf {
        self.doc_root.join(self.path.trim_start_matches('/'))
    }

    fn resolve_code(&self) -> u16 {
        if escapes_root(&self.path) {
            tracing::warn!(path = %self.path, "path traversal attempt blocked");
            return StatusCode::Forbidden.as_u16();
        }
        match fs::metadata(self.full_path()) {
            Err(_) => StatusCode::NotFound.as_u16(),
            Ok(meta) if meta.is_dir() => StatusCode::NotFound.as_u16(),
            Ok(meta) if !world_readable(&meta) => StatusCode::Forbidden.as_u16(),
            Ok(_) => self.code.unwrap_or(StatusCode::Ok.as_u16()),
        }
    }

    fn error_html(&mut self) {
        let page = self
            .code
            .and_then(StatusCode::from_u16)
            .and_then(|status| status.error_page());
        if let Some(page) = page {
            self.path = page.to_string();
        }
    }

    fn status(&self) -> StatusCode {
        self.code
            .and_then(StatusCode::from_u16)
            .unwrap_or(StatusCode::BadRequest)
    }

    fn add_status_line(&mut self, buf: &mut ByteBuffer) {
        let status = self.status();
        self.code = Some(status.as_u16());
        buf.append_str(&format!(
            "{} {} {}\r\n",
            HTTP_VERSION,
            status.as_u16(),
            status.reason_phrase()
        ));
    }

    fn add_headers(&self, buf: &mut ByteBuffer) {
        if self.keep_alive {
            buf.append_str("Connection: keep-alive\r\n");
            buf.append_str("keep-alive: max=6, timeout=120\r\n");
        } else {
            buf.append_str("Connection: close\r\n");
        }
        buf.append_str(&format!("Content-Type: {}\r\n", mime::content_type(&self.path)));
    }

    fn add_content(&mut self, buf: &mut ByteBuffer) {
        let path = self.full_path();
        let file = match File::open(&path) {
            Ok(file) => file,
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "cannot open file");
                self.error_content(buf, "File NotFound!");
                return;
            }
        };

        match map_file(&file) {
            Ok(Some(map)) => {
                tracing::debug!(path = %path.display(), len = map.len(), "mapped file");
                buf.append_str(&format!("Content-Length: {}\r\n\r\n", map.len()));
                self.file = Some(map);
            }
            Ok(None) => buf.append_str("Content-Length: 0\r\n\r\n"),
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "cannot map file");
                self.error_content(buf, "File NotFound!");
            }
        }
    }

    /// Writes a small inline HTML page for when no file can be served.
    pub fn error_content(&self, buf: &mut ByteBuffer, message: &str) {
        let status = self.status();
        let body = format!(
            "<html><title>Error</title><body bgcolor=\"ffffff\">{} : {}\n<p>{}</p><hr><em>TinyWeb</em></body></html>",
            status.as_u16(),
            status.reason_phrase(),
            message
        );
        buf.append_str(&format!("Content-Length: {}\r\n\r\n", body.len()));
        buf.append_str(&body);
    }
}

/// Maps `file` read-only. Empty files have nothing to map.
fn map_file(file: &File) -> std::io::Result<Option<Mmap>> {
    if file.metadata()?.len() == 0 {
        return Ok(None);
    }
    // SAFETY: the map is read-only and private to this response. Files under
    // the document root are not modified while they are being served.
    let map = unsafe { Mmap::map(file)? };
    Ok(Some(map))
}

fn escapes_root(path: &str) -> bool {
    Path::new(path)
        .components()
        .any(|c| matches!(c, Component::ParentDir))
}

#[cfg(unix)]
fn world_readable(meta: &Metadata) -> bool {
    use std::os::unix::fs::PermissionsExt;
    meta.permissions().mode() & 0o004 != 0
}

#[cfg(not(unix))]
fn world_readable(_meta: &Metadata) -> bool {
    true
}
