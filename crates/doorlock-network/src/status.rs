//! Plain-text HTTP status endpoint.
//!
//! `GET /` answers `200 text/plain` with a fixed body so a person on the
//! local network can check that the appliance is alive. Any other path is
//! `404`; other methods on `/` are `405`.

use std::io;
use std::net::SocketAddr;

use doorlock_core::constants::STATUS_BODY;
use http_body_util::Full;
use hyper::body::{Bytes, Incoming};
use hyper::header::{ALLOW, CONTENT_TYPE, HeaderValue};
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder;
use tokio::net::{TcpListener, TcpStream};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

pub type StatusResponse = Response<Full<Bytes>>;

/// Status endpoint bound to a TCP listener.
///
/// # Example
///
/// ```no_run
/// use doorlock_network::StatusServer;
/// use tokio_util::sync::CancellationToken;
///
/// # async fn example() -> std::io::Result<()> {
/// let server = StatusServer::bind("0.0.0.0:8080".parse().unwrap()).await?;
/// let cancel = CancellationToken::new();
/// tokio::spawn(server.serve(cancel.clone()));
/// // ...
/// cancel.cancel();
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct StatusServer {
    listener: TcpListener,
}

impl StatusServer {
    pub async fn bind(addr: SocketAddr) -> io::Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        Ok(Self { listener })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accept connections until `cancel` fires.
    pub async fn serve(self, cancel: CancellationToken) -> io::Result<()> {
        info!(addr = %self.local_addr()?, "Status endpoint listening");
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!("Status endpoint stopped");
                    return Ok(());
                }
                accepted = self.listener.accept() => match accepted {
                    Ok((stream, peer)) => {
                        tokio::spawn(handle_connection(stream, peer));
                    }
                    Err(e) => {
                        warn!(error = %e, "Failed to accept status connection");
                    }
                }
            }
        }
    }
}

async fn handle_connection(stream: TcpStream, peer: SocketAddr) {
    let io = TokioIo::new(stream);
    let service = hyper::service::service_fn(|request: Request<Incoming>| async move {
        Ok::<_, std::convert::Infallible>(respond(request.method(), request.uri().path()))
    });

    if let Err(e) = Builder::new(TokioExecutor::new())
        .serve_connection(io, service)
        .await
    {
        debug!(%peer, error = %e, "Status connection error");
    }
}

/// Build the response for a request line.
pub fn respond(method: &Method, path: &str) -> StatusResponse {
    match (method, path) {
        (&Method::GET, "/") => text_response(StatusCode::OK, STATUS_BODY),
        (_, "/") => {
            let mut response = text_response(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed");
            response
                .headers_mut()
                .insert(ALLOW, HeaderValue::from_static("GET"));
            response
        }
        _ => text_response(StatusCode::NOT_FOUND, "Not found"),
    }
}

fn text_response(status: StatusCode, body: &'static str) -> StatusResponse {
    let mut response = Response::new(Full::new(Bytes::from_static(body.as_bytes())));
    *response.status_mut() = status;
    response.headers_mut().insert(
        CONTENT_TYPE,
        HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    response
}
