//! HTTP server and graceful shutdown.
//!
//! On SIGTERM (what the deployment platform sends before recycling an
//! instance) or Ctrl-C the server stops accepting new connections, lets
//! every in-flight connection task run to completion, and returns from
//! [`Server::serve`] so `main` exits cleanly. Nothing is dropped mid-write:
//! a mutating request either finished its whole-document save or never
//! started it.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;
use http::{Method, StatusCode};
use http_body_util::{BodyExt, Full};
use hyper::service::service_fn;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as ConnBuilder;
use tokio::net::TcpListener;
use tracing::{debug, error, info};

use crate::error::Error;
use crate::middleware::Cors;
use crate::request::Request;
use crate::response::Response;
use crate::router::Router;

/// The HTTP server.
pub struct Server {
    addr: SocketAddr,
    cors: Option<Cors>,
}

/// Shared per-process state: the routing table and the CORS policy.
struct App {
    router: Router,
    cors: Option<Cors>,
}

impl Server {
    /// Configures the server to bind to `addr` when [`serve`](Server::serve)
    /// is called.
    ///
    /// # Panics
    ///
    /// Panics if `addr` is not a valid `host:port` string.
    pub fn bind(addr: &str) -> Self {
        let addr: SocketAddr = addr.parse().expect("invalid socket address");
        Self { addr, cors: None }
    }

    /// Answers `OPTIONS` preflights and decorates every response with the
    /// given CORS policy.
    pub fn cors(mut self, cors: Cors) -> Self {
        self.cors = Some(cors);
        self
    }

    /// Starts accepting connections and dispatching them through `router`.
    ///
    /// Returns only after a full graceful shutdown (SIGTERM or Ctrl-C,
    /// followed by all in-flight requests completing).
    pub async fn serve(self, router: Router) -> Result<(), Error> {
        let listener = TcpListener::bind(self.addr).await?;

        // One Arc shared by every connection task; the routing table is
        // never copied.
        let app = Arc::new(App { router, cors: self.cors });

        info!(addr = %self.addr, "listening");

        // Every connection task lands in the JoinSet so shutdown can wait
        // for all of them.
        let mut tasks = tokio::task::JoinSet::new();

        // The shutdown future is polled across loop iterations, so it must
        // be pinned once, outside the loop.
        let shutdown = shutdown_signal();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                // `biased` checks arms top-to-bottom: a pending SIGTERM wins
                // over any backlog of queued connections.
                biased;

                () = &mut shutdown => {
                    info!(in_flight = tasks.len(), "shutdown signal received, draining connections");
                    break;
                }

                res = listener.accept() => {
                    let (stream, remote_addr) = match res {
                        Ok(v) => v,
                        Err(e) => {
                            error!("accept error: {e}");
                            continue;
                        }
                    };

                    let app = Arc::clone(&app);
                    let io = TokioIo::new(stream);

                    tasks.spawn(async move {
                        // The closure runs once per request on the
                        // connection, not once per connection.
                        let svc = service_fn(move |req| {
                            let app = Arc::clone(&app);
                            async move { dispatch(app, req).await }
                        });

                        // `auto` negotiates HTTP/1.1 or HTTP/2 per client.
                        if let Err(e) = ConnBuilder::new(TokioExecutor::new())
                            .serve_connection(io, svc)
                            .await
                        {
                            error!(peer = %remote_addr, "connection error: {e}");
                        }
                    });
                }

                // Reap finished tasks so the JoinSet stays bounded on
                // long-running instances.
                Some(_) = tasks.join_next(), if !tasks.is_empty() => {}
            }
        }

        while tasks.join_next().await.is_some() {}

        info!("stopped");
        Ok(())
    }
}

// ── Request dispatch ──────────────────────────────────────────────────────────

/// Routes one request and produces one response.
///
/// The error type is [`Infallible`] — every failure becomes a status code
/// (400, 404, 500) so hyper never sees an error.
async fn dispatch(
    app: Arc<App>,
    req: hyper::Request<hyper::body::Incoming>,
) -> Result<http::Response<Full<Bytes>>, Infallible> {
    let method = req.method().clone();
    let path = req.uri().path().to_owned();

    let response = match &app.cors {
        Some(cors) if cors.is_preflight(&method) => cors.preflight(),
        Some(cors) => {
            let mut response = route(&app.router, method.clone(), path.clone(), req).await;
            cors.decorate(&mut response);
            response
        }
        None => route(&app.router, method.clone(), path.clone(), req).await,
    };

    debug!(%method, %path, status = %response.status_code(), "handled");
    Ok(response.into_inner())
}

async fn route(
    router: &Router,
    method: Method,
    path: String,
    req: hyper::Request<hyper::body::Incoming>,
) -> Response {
    let Some((handler, params)) = router.lookup(&method, &path) else {
        return Response::status(StatusCode::NOT_FOUND);
    };

    // Collect the body up front; handlers see complete bytes. Body-size
    // limits belong to the reverse proxy in front of this service.
    let (parts, body) = req.into_parts();
    let body = match body.collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) => {
            error!("failed to read request body: {e}");
            return Response::status(StatusCode::BAD_REQUEST);
        }
    };

    handler
        .call(Request::new(method, path, parts.headers, body, params))
        .await
}

// ── Shutdown signal ───────────────────────────────────────────────────────────

/// Resolves on the first shutdown signal the process receives: SIGTERM or
/// SIGINT (Ctrl-C) on Unix, Ctrl-C elsewhere.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let sigterm = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    // On non-Unix platforms the SIGTERM arm never resolves.
    #[cfg(not(unix))]
    let sigterm = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c   => {}
        () = sigterm  => {}
    }
}
