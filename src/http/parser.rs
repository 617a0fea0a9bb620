use std::sync::Arc;

use crate::auth::UserVerifier;
use crate::buffer::ByteBuffer;
use crate::http::form::{self, URLENCODED};
use crate::http::request::Request;

const CRLF: &[u8] = b"\r\n";

/// Extensionless routes that are served from their `.html` page.
const DEFAULT_HTML: [&str; 6] = [
    "/index",
    "/register",
    "/login",
    "/welcome",
    "/video",
    "/picture",
];

/// Where the parser currently is within a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseState {
    RequestLine,
    Headers,
    Body,
    Finish,
}

/// Outcome of a successful [`RequestParser::parse`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseStatus {
    /// The request is fully parsed.
    Complete,
    /// More bytes are needed; call again once they arrive.
    Incomplete,
}

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("malformed request line")]
    InvalidRequestLine,
}

/// Incremental HTTP/1.1 request parser.
///
/// The parser keeps its state between calls, so it can be fed a buffer that
/// fills up across several socket reads. Bytes are only consumed from the
/// buffer once a whole line has been handled.
pub struct RequestParser {
    state: ParseState,
    request: Request,
    users: Arc<dyn UserVerifier>,
}

impl RequestParser {
    pub fn new(users: Arc<dyn UserVerifier>) -> Self {
        Self {
            state: ParseState::RequestLine,
            request: Request::default(),
            users,
        }
    }

    /// Clears the previous request and starts over at the request line.
    pub fn init(&mut self) {
        self.state = ParseState::RequestLine;
        self.request = Request::default();
    }

    pub fn state(&self) -> ParseState {
        self.state
    }

    pub fn request(&self) -> &Request {
        &self.request
    }

    pub fn path(&self) -> &str {
        &self.request.path
    }

    pub fn is_keep_alive(&self) -> bool {
        self.request.is_keep_alive()
    }

    pub fn form_value(&self, key: &str) -> &str {
        self.request.form_value(key)
    }

    /// Consumes as many complete lines from `buf` as possible.
    ///
    /// Returns `Incomplete` when the buffer runs out before the request is
    /// finished; nothing past the last complete line is consumed. A request
    /// line that does not match `METHOD SP TARGET SP HTTP/VERSION` is a hard
    /// error and the connection should not be parsed any further.
    pub fn parse(&mut self, buf: &mut ByteBuffer) -> Result<ParseStatus, ParseError> {
        while buf.readable_bytes() > 0 && self.state != ParseState::Finish {
            let data = buf.peek();
            let (line, consumed) = match find_crlf(data) {
                Some(end) => (String::from_utf8_lossy(&data[..end]).into_owned(), end + 2),
                // The body is the only part not terminated by CRLF.
                None if self.state == ParseState::Body => {
                    (String::from_utf8_lossy(data).into_owned(), data.len())
                }
                None => break,
            };

            match self.state {
                ParseState::RequestLine => {
                    self.parse_request_line(&line)?;
                    self.parse_path();
                }
                ParseState::Headers => {
                    if !self.parse_header(&line) {
                        // End of the header block; nothing after it means no body.
                        self.state = if buf.readable_bytes() == consumed {
                            ParseState::Finish
                        } else {
                            ParseState::Body
                        };
                    }
                }
                ParseState::Body => self.parse_body(line),
                ParseState::Finish => unreachable!("loop exits on Finish"),
            }

            buf.retrieve(consumed);
        }

        tracing::debug!(
            method = %self.request.method,
            path = %self.request.path,
            version = %self.request.version,
            state = ?self.state,
            "parsed request"
        );

        Ok(match self.state {
            ParseState::Finish => ParseStatus::Complete,
            _ => ParseStatus::Incomplete,
        })
    }

    fn parse_request_line(&mut self, line: &str) -> Result<(), ParseError> {
        let mut parts = line.split(' ');
        let (Some(method), Some(target), Some(protocol), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            tracing::warn!("request line does not have three parts");
            return Err(ParseError::InvalidRequestLine);
        };
        let Some(version) = protocol.strip_prefix("HTTP/") else {
            tracing::warn!("request line without HTTP/ version");
            return Err(ParseError::InvalidRequestLine);
        };

        self.request.method = method.to_string();
        self.request.path = target.to_string();
        self.request.version = version.to_string();
        self.state = ParseState::Headers;
        Ok(())
    }

    fn parse_path(&mut self) {
        let path = &mut self.request.path;
        if *path == "/" {
            *path = "/index.html".to_string();
        } else if DEFAULT_HTML.contains(&path.as_str()) {
            path.push_str(".html");
        }
    }

    /// Records `NAME ":" [" "] VALUE`. Returns false for anything else.
    fn parse_header(&mut self, line: &str) -> bool {
        let Some((name, value)) = line.split_once(':') else {
            return false;
        };
        let value = value.strip_prefix(' ').unwrap_or(value);
        self.request.headers.insert(name.to_string(), value.to_string());
        true
    }

    fn parse_body(&mut self, line: String) {
        tracing::debug!(len = line.len(), "request body");
        self.request.body = line;
        self.parse_post();
        self.state = ParseState::Finish;
    }

    fn parse_post(&mut self) {
        if self.request.method != "POST" || self.request.header("Content-Type") != Some(URLENCODED) {
            return;
        }
        self.request.form = form::decode_urlencoded(&mut self.request.body);

        if let Some(is_login) = verification_target(&self.request.path) {
            let verified = self.users.verify(
                self.request.form_value("username"),
                self.request.form_value("password"),
                is_login,
            );
            self.request.path = if verified { "/welcome.html" } else { "/error.html" }.to_string();
        }
    }
}

/// Pages whose form submission goes through user verification, and whether
/// it is a login (as opposed to a registration).
fn verification_target(path: &str) -> Option<bool> {
    match path {
        "/register.html" => Some(false),
        "/login.html" => Some(true),
        _ => None,
    }
}

fn find_crlf(data: &[u8]) -> Option<usize> {
    data.windows(CRLF.len()).position(|w| w == CRLF)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::MemoryUserStore;

    #[test]
    fn parse_simple_get() {
        let mut parser = RequestParser::new(Arc::new(MemoryUserStore::new()));
        let mut buf = ByteBuffer::default();
        buf.append(b"GET / HTTP/1.1\r\nHost: example.com\r\n\r\n");

        let status = parser.parse(&mut buf).unwrap();

        assert_eq!(status, ParseStatus::Complete);
        assert_eq!(parser.path(), "/index.html");
        assert_eq!(parser.request().header("Host"), Some("example.com"));
        assert_eq!(buf.readable_bytes(), 0);
    }
}
