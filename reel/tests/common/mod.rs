// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

#![allow(dead_code)]

use reel::bootstrap::bootstrap_runtime;
use reel::catalog::Catalog;
use reel::config::ValidatedConfig;
use reel::gemini::{Router, ServerHandle, ServerSettings, StaticFiles, bind_listener, spawn_server};
use reel::runtime_paths::{PathOverrides, RuntimePaths};
use reel::templates::FilmTemplates;
use reel::tls;
use reel::util::test_fixtures::TestFixtureRoot;
use rustls::pki_types::pem::PemObject;
use rustls::pki_types::{CertificateDer, ServerName};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio_rustls::{TlsAcceptor, TlsConnector};

pub const ALIEN: &str = r#"
title = "Alien"
author = "Ridley Scott"
year = 1979
description = ["In space no one can hear you scream."]
tags = ["Sci-Fi", "Horror"]
"#;

pub const AMELIE: &str = r#"
title = "Le Fabuleux Destin d'Amélie Poulain"
year = 2001
tags = ["Comédie", "Romance"]
"#;

pub const METROPOLIS: &str = r#"
title = "Metropolis"
author = "Fritz Lang"
year = 1927
tags = ["sci-fi"]
"#;

pub struct TestHarness {
    pub fixture: TestFixtureRoot,
    pub config: ValidatedConfig,
    pub runtime_paths: RuntimePaths,
    pub catalog: Arc<Catalog>,
    pub router: Arc<Router>,
}

pub struct Reply {
    pub header: String,
    pub body: String,
}

impl TestHarness {
    /// Bootstrapped runtime root with three films and a welcome page.
    pub fn new(prefix: &str) -> Self {
        let fixture = TestFixtureRoot::new_unique(prefix).expect("fixture root");
        let bootstrap =
            bootstrap_runtime(fixture.path(), &PathOverrides::default()).expect("bootstrap");
        seed_films(&fixture);
        Self::from_bootstrap(fixture, bootstrap.validated_config, bootstrap.runtime_paths)
    }

    pub fn from_bootstrap(
        fixture: TestFixtureRoot,
        config: ValidatedConfig,
        runtime_paths: RuntimePaths,
    ) -> Self {
        let catalog = Arc::new(Catalog::new(
            runtime_paths.films_dir.clone(),
            config.catalog.on_scan_error,
        ));
        let templates = FilmTemplates::from_config(&config.films).expect("templates compile");
        let router = Arc::new(Router::new(
            catalog.clone(),
            templates,
            StaticFiles::new(runtime_paths.public_dir.clone()),
        ));
        Self {
            fixture,
            config,
            runtime_paths,
            catalog,
            router,
        }
    }

    pub fn get(&self, path: &str) -> Reply {
        let response = self.router.respond(path);
        let header = format!("{} {}", response.status, response.meta);
        Reply {
            header,
            body: String::from_utf8(response.body).expect("utf-8 body"),
        }
    }

    /// Serve over TLS on an ephemeral loopback port.
    pub async fn start_server(&self) -> ServerHandle {
        let _ = rustls::crypto::ring::default_provider().install_default();
        let tls_config =
            tls::load_rustls_config(&self.runtime_paths, &self.config.tls).expect("tls config");
        let acceptor = TlsAcceptor::from(Arc::new(tls_config));
        let listener = bind_listener("127.0.0.1", 0).await.expect("bind");
        spawn_server(
            listener,
            acceptor,
            self.router.clone(),
            ServerSettings::from_config(&self.config),
        )
        .expect("spawn server")
    }

    /// Send one raw request line and read the full response.
    pub async fn fetch(&self, addr: SocketAddr, request_line: &str) -> Reply {
        let mut tls = self.connect(addr).await;
        tls.write_all(format!("{}\r\n", request_line).as_bytes())
            .await
            .expect("write request");
        read_reply(&mut tls).await
    }

    pub async fn connect(
        &self,
        addr: SocketAddr,
    ) -> tokio_rustls::client::TlsStream<TcpStream> {
        let cert_path = self
            .runtime_paths
            .certs_dir
            .join(format!("{}.crt", self.config.tls.domain));
        let mut roots = rustls::RootCertStore::empty();
        for cert in CertificateDer::pem_file_iter(&cert_path).expect("cert file") {
            roots.add(cert.expect("cert")).expect("trust cert");
        }
        let client_config = rustls::ClientConfig::builder()
            .with_root_certificates(roots)
            .with_no_client_auth();
        let connector = TlsConnector::from(Arc::new(client_config));
        let stream = TcpStream::connect(addr).await.expect("connect");
        let server_name = ServerName::try_from(self.config.tls.domain.as_str())
            .expect("server name")
            .to_owned();
        connector
            .connect(server_name, stream)
            .await
            .expect("tls handshake")
    }
}

pub async fn read_reply(tls: &mut tokio_rustls::client::TlsStream<TcpStream>) -> Reply {
    let mut raw = Vec::new();
    tls.read_to_end(&mut raw).await.expect("read response");
    let text = String::from_utf8(raw).expect("utf-8 response");
    let (header, body) = text.split_once("\r\n").expect("header line");
    Reply {
        header: header.to_string(),
        body: body.to_string(),
    }
}

pub fn seed_films(fixture: &TestFixtureRoot) {
    fixture.write_film("alien", ALIEN).expect("write alien");
    fixture.write_film("amelie", AMELIE).expect("write amelie");
    fixture
        .write_film("classics/metropolis", METROPOLIS)
        .expect("write metropolis");
}
