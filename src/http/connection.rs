use std::io::{self, IoSlice};
use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpStream;
use tokio::time::timeout;

use crate::buffer::ByteBuffer;
use crate::http::parser::{ParseStatus, RequestParser};
use crate::http::response::{Response, StatusCode};
use crate::server::ServerContext;

pub struct Connection {
    stream: TcpStream,
    ctx: Arc<ServerContext>,
    read_buf: ByteBuffer,
    write_buf: ByteBuffer,
    parser: RequestParser,
    response: Response,
    file_sent: usize,
    state: ConnectionState,
}

pub enum ConnectionState {
    Reading,
    Processing,
    Writing(bool), // bool = keep_alive?
    Closed,
}

enum ReadOutcome {
    Complete,
    Malformed,
    Closed,
}

impl Connection {
    pub fn new(stream: TcpStream, ctx: Arc<ServerContext>) -> Self {
        let parser = RequestParser::new(Arc::clone(&ctx.users));
        Self {
            stream,
            ctx,
            read_buf: ByteBuffer::default(),
            write_buf: ByteBuffer::default(),
            parser,
            response: Response::new(),
            file_sent: 0,
            state: ConnectionState::Reading,
        }
    }

    pub async fn run(&mut self) -> anyhow::Result<()> {
        loop {
            match self.state {
                ConnectionState::Reading => match self.read_request().await? {
                    ReadOutcome::Complete => self.state = ConnectionState::Processing,
                    ReadOutcome::Malformed => {
                        let code = StatusCode::BadRequest;
                        self.prepare_response(code.error_page().unwrap_or("/"), false, Some(code.as_u16()));
                        self.state = ConnectionState::Writing(false);
                    }
                    ReadOutcome::Closed => self.state = ConnectionState::Closed,
                },

                ConnectionState::Processing => {
                    let keep_alive = self.parser.is_keep_alive();
                    let path = self.parser.path().to_string();
                    self.prepare_response(&path, keep_alive, None);
                    self.state = ConnectionState::Writing(keep_alive);
                }

                ConnectionState::Writing(keep_alive) => {
                    let result = self.write_response().await;
                    // Release the mapping whether or not the write succeeded.
                    self.response.unmap_file();
                    result?;

                    if keep_alive {
                        self.parser.init();
                        self.state = ConnectionState::Reading; // go back for next request
                    } else {
                        self.state = ConnectionState::Closed;
                    }
                }

                ConnectionState::Closed => break,
            }
        }

        Ok(())
    }

    async fn read_request(&mut self) -> anyhow::Result<ReadOutcome> {
        loop {
            // Try parsing whatever we already have
            if self.read_buf.readable_bytes() > 0 {
                match self.parser.parse(&mut self.read_buf) {
                    Ok(ParseStatus::Complete) => return Ok(ReadOutcome::Complete),
                    Ok(ParseStatus::Incomplete) => {}
                    Err(e) => {
                        tracing::warn!(error = %e, "bad request");
                        return Ok(ReadOutcome::Malformed);
                    }
                }
            }

            match timeout(self.ctx.idle_timeout, self.stream.readable()).await {
                Ok(ready) => ready.context("waiting for client data")?,
                Err(_) => {
                    tracing::debug!("idle timeout, closing connection");
                    return Ok(ReadOutcome::Closed);
                }
            }

            let stream = &self.stream;
            match self.read_buf.read_with(|bufs| stream.try_read_vectored(bufs)) {
                // Client closed connection
                Ok(0) => return Ok(ReadOutcome::Closed),
                Ok(n) => tracing::trace!(bytes = n, "read from client"),
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => continue,
                Err(e) => return Err(e).context("reading from client"),
            }
        }
    }

    fn prepare_response(&mut self, path: &str, keep_alive: bool, code: Option<u16>) {
        self.write_buf.retrieve_all();
        self.file_sent = 0;
        self.response
            .init(self.ctx.doc_root.clone(), path, keep_alive, code);
        self.response.make_response(&mut self.write_buf);

        tracing::info!(
            method = %self.parser.request().method,
            path = %path,
            status = ?self.response.code(),
            keep_alive,
            "response ready"
        );
    }

    /// Sends the header buffer followed by the mapped file, if any, resuming
    /// after short writes.
    async fn write_response(&mut self) -> anyhow::Result<()> {
        loop {
            let file_left = self.response.file_len() - self.file_sent;
            if self.write_buf.readable_bytes() == 0 && file_left == 0 {
                self.write_buf.retrieve_all();
                return Ok(());
            }

            self.stream
                .writable()
                .await
                .context("waiting to write response")?;

            let result = if file_left == 0 {
                let stream = &self.stream;
                self.write_buf.write_with(|bytes| stream.try_write(bytes))
            } else {
                self.write_vectored()
            };

            match result {
                Ok(0) => anyhow::bail!("connection closed while writing"),
                Ok(n) => tracing::trace!(bytes = n, "wrote to client"),
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => continue,
                Err(e) => return Err(e).context("writing response"),
            }
        }
    }

    fn write_vectored(&mut self) -> io::Result<usize> {
        let header_left = self.write_buf.readable_bytes();
        let file = self.response.file().unwrap_or_default();
        let bufs = [
            IoSlice::new(self.write_buf.peek()),
            IoSlice::new(&file[self.file_sent..]),
        ];
        let n = self.stream.try_write_vectored(&bufs)?;

        let from_header = n.min(header_left);
        self.write_buf.retrieve(from_header);
        self.file_sent += n - from_header;
        Ok(n)
    }
}
