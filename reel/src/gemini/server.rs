// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use super::request::{Request, read_request_line};
use super::response::Response;
use super::router::Router;
use crate::config::ValidatedConfig;
use log::{debug, error, info, warn};
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;
use tokio::task::JoinSet;
use tokio::time::{Duration, timeout};
use tokio_rustls::TlsAcceptor;

#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub read_timeout: Duration,
    pub write_timeout: Duration,
    pub shutdown_timeout: Duration,
    /// Requests for any other host are refused with 53.
    pub domain: String,
}

impl ServerSettings {
    pub fn from_config(config: &ValidatedConfig) -> Self {
        Self {
            read_timeout: config.server.read_timeout(),
            write_timeout: config.server.write_timeout(),
            shutdown_timeout: config.server.shutdown_timeout(),
            domain: config.tls.domain.clone(),
        }
    }
}

pub struct ServerHandle {
    pub local_addr: SocketAddr,
    pub shutdown: oneshot::Sender<()>,
    pub task: tokio::task::JoinHandle<()>,
}

impl ServerHandle {
    /// Stop accepting and wait for in-flight connections to drain.
    pub async fn stop(self) {
        let _ = self.shutdown.send(());
        if let Err(err) = self.task.await {
            error!("Gemini server task failed: {}", err);
        }
    }
}

pub async fn bind_listener(host: &str, port: u16) -> io::Result<TcpListener> {
    TcpListener::bind((host, port)).await.map_err(|err| {
        io::Error::new(
            err.kind(),
            format!("Failed to bind {}:{}: {}", host, port, err),
        )
    })
}

pub fn spawn_server(
    listener: TcpListener,
    acceptor: TlsAcceptor,
    router: Arc<Router>,
    settings: ServerSettings,
) -> io::Result<ServerHandle> {
    let local_addr = listener.local_addr()?;
    let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();
    let settings = Arc::new(settings);

    let task = tokio::spawn(async move {
        let mut connections = JoinSet::new();

        loop {
            tokio::select! {
                _ = &mut shutdown_rx => {
                    break;
                }
                Some(joined) = connections.join_next(), if !connections.is_empty() => {
                    if let Err(err) = joined {
                        error!("Gemini connection task failed: {}", err);
                    }
                }
                accept_result = listener.accept() => {
                    match accept_result {
                        Ok((stream, peer)) => {
                            let acceptor = acceptor.clone();
                            let router = router.clone();
                            let settings = settings.clone();
                            connections.spawn(async move {
                                handle_connection(stream, peer, acceptor, router, settings).await;
                            });
                        }
                        Err(err) => {
                            warn!("Gemini accept failed: {}", err);
                        }
                    }
                }
            }
        }

        drop(listener);
        let in_flight = connections.len();
        if in_flight > 0 {
            info!("Waiting for {} connection(s) to finish", in_flight);
        }
        let drained = timeout(settings.shutdown_timeout, async {
            while connections.join_next().await.is_some() {}
        })
        .await;
        if drained.is_err() {
            warn!(
                "Shutdown timeout of {}s elapsed, aborting {} connection(s)",
                settings.shutdown_timeout.as_secs(),
                connections.len()
            );
            connections.abort_all();
        }
        info!("Gemini server stopped");
    });

    Ok(ServerHandle {
        local_addr,
        shutdown: shutdown_tx,
        task,
    })
}

async fn handle_connection(
    stream: TcpStream,
    peer: SocketAddr,
    acceptor: TlsAcceptor,
    router: Arc<Router>,
    settings: Arc<ServerSettings>,
) {
    let started = Instant::now();

    let mut tls = match timeout(settings.read_timeout, acceptor.accept(stream)).await {
        Ok(Ok(tls)) => tls,
        Ok(Err(err)) => {
            debug!("TLS handshake with {} failed: {}", peer, err);
            return;
        }
        Err(_) => {
            debug!("TLS handshake with {} timed out", peer);
            return;
        }
    };

    let (target, response) = match timeout(settings.read_timeout, read_request_line(&mut tls)).await
    {
        Err(_) => {
            debug!("Request from {} timed out", peer);
            return;
        }
        Ok(Err(err)) => ("-".to_string(), Response::bad_request(err.to_string())),
        Ok(Ok(line)) => match Request::parse(&line) {
            Err(err) => (
                String::from_utf8_lossy(&line).into_owned(),
                Response::bad_request(err.to_string()),
            ),
            Ok(request) => {
                let target = request.url().to_string();
                let response = dispatch(request, &router, &settings).await;
                (target, response)
            }
        },
    };

    let written = timeout(settings.write_timeout, async {
        tls.write_all(&response.to_bytes()).await?;
        tls.shutdown().await
    })
    .await;
    match written {
        Ok(Ok(())) => {}
        Ok(Err(err)) => debug!("Failed to write response to {}: {}", peer, err),
        Err(_) => debug!("Writing response to {} timed out", peer),
    }

    info!(
        "{} \"{}\" {} {}ms",
        peer,
        target,
        response.status,
        started.elapsed().as_millis()
    );
}

async fn dispatch(request: Request, router: &Arc<Router>, settings: &ServerSettings) -> Response {
    let host_matches = request
        .host()
        .is_some_and(|host| host.eq_ignore_ascii_case(&settings.domain));
    if !host_matches {
        return Response::proxy_refused();
    }

    let router = router.clone();
    let path = request.path().to_string();
    match tokio::task::spawn_blocking(move || router.respond(&path)).await {
        Ok(response) => response,
        Err(err) => {
            error!("Request handler for {} failed: {}", request.path(), err);
            Response::internal_error()
        }
    }
}
