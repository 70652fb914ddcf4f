//! Minimal HTTP endpoint serving the live page and the event stream.
//!
//! The server owns a dedicated thread running a current-thread Tokio
//! runtime, so it works whether or not the host test framework runs inside
//! a runtime of its own. Routes:
//!
//! - `GET /` serves the embedded page.
//! - `GET /events` streams line-delimited JSON until the sentinel.
//!
//! Other paths answer `404`, other methods `405`.

use std::net::SocketAddr;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;
use tokio::task::JoinSet;

use crate::error::LiveError;
use crate::stream::EventStream;

const PAGE: &str = include_str!("page.html");
const MAX_HEADER_LINES: usize = 100;
const DRAIN_TIMEOUT: Duration = Duration::from_secs(2);

pub(crate) struct LiveServer {
    addr: SocketAddr,
    shutdown: Option<oneshot::Sender<()>>,
    thread: Option<JoinHandle<()>>,
}

impl LiveServer {
    /// Bind `addr` and start serving `stream`.
    pub(crate) fn start(addr: SocketAddr, stream: Arc<EventStream>) -> Result<Self, LiveError> {
        let listener = std::net::TcpListener::bind(addr)?;
        listener.set_nonblocking(true)?;
        let addr = listener.local_addr()?;
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        let (shutdown, stop) = oneshot::channel();
        let thread = thread::Builder::new()
            .name("stepwise-live".to_owned())
            .spawn(move || runtime.block_on(serve(listener, stream, stop)))?;
        tracing::info!(%addr, "live progress server listening");
        Ok(Self {
            addr,
            shutdown: Some(shutdown),
            thread: Some(thread),
        })
    }

    pub(crate) const fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Stop accepting, let open streams drain, and join the thread.
    pub(crate) fn stop(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                tracing::error!("live server thread panicked");
            }
            tracing::info!(addr = %self.addr, "live progress server stopped");
        }
    }
}

impl Drop for LiveServer {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn serve(
    listener: std::net::TcpListener,
    stream: Arc<EventStream>,
    mut stop: oneshot::Receiver<()>,
) {
    let listener = match TcpListener::from_std(listener) {
        Ok(listener) => listener,
        Err(error) => {
            tracing::error!(%error, "live server could not adopt its listener");
            return;
        }
    };
    let mut connections = JoinSet::new();
    loop {
        tokio::select! {
            _ = &mut stop => break,
            accepted = listener.accept() => {
                let (socket, peer) = match accepted {
                    Ok(accepted) => accepted,
                    Err(error) => {
                        tracing::warn!(%error, "failed to accept live client");
                        continue;
                    }
                };
                tracing::debug!(%peer, "live client connected");
                connections.spawn(handle(socket, Arc::clone(&stream)));
            }
            Some(_) = connections.join_next(), if !connections.is_empty() => {}
        }
    }
    drop(listener);
    let drained = tokio::time::timeout(DRAIN_TIMEOUT, async {
        while connections.join_next().await.is_some() {}
    })
    .await;
    if drained.is_err() {
        tracing::warn!(open = connections.len(), "closing live clients that did not drain");
        connections.abort_all();
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Route {
    Page,
    Events,
    NotFound,
    MethodNotAllowed,
}

fn route(request_line: &str) -> Route {
    let mut parts = request_line.split_whitespace();
    let method = parts.next().unwrap_or_default();
    let target = parts.next().unwrap_or_default();
    let path = target.split('?').next().unwrap_or_default();
    if method != "GET" {
        return Route::MethodNotAllowed;
    }
    match path {
        "/" | "/index.html" => Route::Page,
        "/events" => Route::Events,
        _ => Route::NotFound,
    }
}

fn head(status: &str, content_type: &str, length: Option<usize>, extra: &str) -> String {
    let length = length
        .map(|length| format!("Content-Length: {length}\r\n"))
        .unwrap_or_default();
    format!(
        "HTTP/1.1 {status}\r\nContent-Type: {content_type}\r\nCache-Control: no-cache\r\nConnection: close\r\n{extra}{length}\r\n"
    )
}

async fn handle(socket: TcpStream, stream: Arc<EventStream>) {
    if let Err(error) = respond(socket, &stream).await {
        tracing::debug!(%error, "live client connection ended");
    }
}

async fn respond(socket: TcpStream, stream: &EventStream) -> std::io::Result<()> {
    let (read, mut write) = socket.into_split();
    let mut reader = BufReader::new(read);
    let mut request_line = String::new();
    reader.read_line(&mut request_line).await?;
    let mut header = String::new();
    for _ in 0..MAX_HEADER_LINES {
        header.clear();
        if reader.read_line(&mut header).await? == 0 || header.trim().is_empty() {
            break;
        }
    }

    match route(&request_line) {
        Route::Page => {
            let head = head("200 OK", "text/html; charset=utf-8", Some(PAGE.len()), "");
            write.write_all(head.as_bytes()).await?;
            write.write_all(PAGE.as_bytes()).await?;
        }
        Route::Events => {
            let mut subscription = stream.subscribe();
            let head = head("200 OK", "application/x-ndjson", None, "");
            write.write_all(head.as_bytes()).await?;
            write.flush().await?;
            while let Some(line) = subscription.next().await {
                write.write_all(line.as_bytes()).await?;
                write.flush().await?;
            }
        }
        Route::NotFound => {
            let body = "not found\n";
            let head = head("404 Not Found", "text/plain", Some(body.len()), "");
            write.write_all(head.as_bytes()).await?;
            write.write_all(body.as_bytes()).await?;
        }
        Route::MethodNotAllowed => {
            let head = head("405 Method Not Allowed", "text/plain", Some(0), "Allow: GET\r\n");
            write.write_all(head.as_bytes()).await?;
        }
    }
    write.shutdown().await
}
