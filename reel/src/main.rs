// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use log::{error, info};
use reel::bootstrap::{self, BootstrapResult};
use reel::catalog::Catalog;
use reel::config::ValidatedConfig;
use reel::gemini::{Router, ServerSettings, StaticFiles, bind_listener, spawn_server};
use reel::runtime_paths::{PathOverrides, RuntimePaths};
use reel::templates::FilmTemplates;
use reel::{tls, util};
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_rustls::TlsAcceptor;

const HELP_TEXT: &str = "\
Usage: reel [options]

Serves a film catalog over Gemini.

Options:
  -C <root>            Runtime root (default: current directory)
  --config <file>      Config file (default: <root>/config.yaml)
  --port <n>           Listen port, overrides server.port
  --films-dir <dir>    Film descriptors (default: <root>/films)
  --public-dir <dir>   Static files (default: <root>/public)
  --certs-dir <dir>    TLS certificates (default: <root>/certs)
  -h, --help           Show this help
";

fn main() {
    let exit_code = run();
    std::process::exit(exit_code);
}

fn run() -> i32 {
    let parsed_args = match parse_args() {
        Ok(args) => args,
        Err(error) => {
            eprintln!("❌ Invalid command line arguments: {}", error);
            eprintln!("❌ Use --help to list the supported options.");
            return 1;
        }
    };

    if matches!(parsed_args.mode, RunMode::Help) {
        print!("{}", HELP_TEXT);
        return 0;
    }

    let mut bootstrap =
        match bootstrap::bootstrap_runtime(&parsed_args.runtime_root, &parsed_args.overrides) {
            Ok(result) => result,
            Err(error) => {
                eprintln!("❌ Bootstrap error: {}", error);
                eprintln!("❌ Application cannot start with invalid configuration.");
                return 1;
            }
        };
    if let Some(port) = parsed_args.port {
        bootstrap.validated_config.server.port = port;
    }

    if let Err(error) =
        util::init_stdout_logging(util::parse_level(&bootstrap.validated_config.logging.level))
    {
        eprintln!("❌ Failed to initialize logging: {}", error);
        return 1;
    }

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(error) => {
            error!("Failed to start async runtime: {}", error);
            return 1;
        }
    };

    match runtime.block_on(run_server(bootstrap)) {
        Ok(()) => 0,
        Err(error) => {
            error!("{}", error);
            1
        }
    }
}

async fn run_server(bootstrap: BootstrapResult) -> Result<(), String> {
    let BootstrapResult {
        validated_config: config,
        runtime_paths,
        ..
    } = bootstrap;

    let _ = rustls::crypto::ring::default_provider().install_default();
    log_startup_info(&config, &runtime_paths);

    let templates = FilmTemplates::from_config(&config.films).map_err(|err| err.to_string())?;
    let catalog = Arc::new(Catalog::new(
        runtime_paths.films_dir.clone(),
        config.catalog.on_scan_error,
    ));

    if config.catalog.eager {
        let startup_catalog = catalog.clone();
        tokio::task::spawn_blocking(move || startup_catalog.populate())
            .await
            .map_err(|err| format!("Catalog scan task failed: {}", err))?
            .map_err(|err| format!("Failed to load film catalog: {}", err))?;
    }

    let tls_config = tls::load_rustls_config(&runtime_paths, &config.tls)
        .map_err(|err| format!("Failed to prepare TLS: {}", err))?;
    let acceptor = TlsAcceptor::from(Arc::new(tls_config));

    let router = Arc::new(Router::new(
        catalog,
        templates,
        StaticFiles::new(runtime_paths.public_dir.clone()),
    ));
    let (host, port) = config.server.address_tuple();
    let listener = bind_listener(host, port)
        .await
        .map_err(|err| err.to_string())?;
    let server = spawn_server(listener, acceptor, router, ServerSettings::from_config(&config))
        .map_err(|err| err.to_string())?;
    info!(
        "Serving gemini://{}:{}/ on {}",
        config.tls.domain, server.local_addr.port(), server.local_addr
    );

    shutdown_requested(tokio::signal::ctrl_c()).await;
    server.stop().await;
    Ok(())
}

/// Resolves once the shutdown signal fires. Without a signal handler the server
/// keeps running until the process is killed.
async fn shutdown_requested<F>(signal: F)
where
    F: Future<Output = io::Result<()>>,
{
    match signal.await {
        Ok(()) => info!("Shutting down..."),
        Err(err) => {
            error!(
                "Failed to listen for shutdown signal, serving until killed: {}",
                err
            );
            std::future::pending::<()>().await;
        }
    }
}

fn log_startup_info(config: &ValidatedConfig, runtime_paths: &RuntimePaths) {
    info!("Starting reel {}", env!("CARGO_PKG_VERSION"));
    info!(
        "Listening address: {}:{} (domain {})",
        config.server.host, config.server.port, config.tls.domain
    );
    info!(
        "Catalog: {} population, scan errors {:?}",
        if config.catalog.eager { "eager" } else { "lazy" },
        config.catalog.on_scan_error
    );
    info!(
        "Films directory (canonical): {}",
        runtime_paths.films_dir.display()
    );
    info!(
        "Public directory (canonical): {}",
        runtime_paths.public_dir.display()
    );
    info!(
        "Certs directory (canonical): {}",
        runtime_paths.certs_dir.display()
    );
    info!("Config file: {}", runtime_paths.config_file.display());
    info!("Runtime root: {}", runtime_paths.root.display());
}

#[derive(Debug, PartialEq, Eq)]
enum RunMode {
    Serve,
    Help,
}

#[derive(Debug)]
struct ParsedArgs {
    runtime_root: PathBuf,
    overrides: PathOverrides,
    port: Option<u16>,
    mode: RunMode,
}

fn parse_args() -> Result<ParsedArgs, String> {
    parse_args_from(std::env::args().skip(1))
}

fn parse_args_from<I>(args: I) -> Result<ParsedArgs, String>
where
    I: IntoIterator<Item = String>,
{
    let args: Vec<String> = args.into_iter().collect();
    if args.iter().any(|arg| is_help_flag(arg)) {
        return Ok(ParsedArgs {
            runtime_root: PathBuf::from("."),
            overrides: PathOverrides::default(),
            port: None,
            mode: RunMode::Help,
        });
    }

    let mut args = args.into_iter();
    let mut runtime_root = PathBuf::from(".");
    let mut overrides = PathOverrides::default();
    let mut port = None;

    while let Some(arg) = args.next() {
        let (flag, inline) = match arg.split_once('=') {
            Some((flag, value)) if flag.starts_with("--") => (flag.to_string(), Some(value.to_string())),
            _ => (arg, None),
        };
        if flag == "--" {
            continue;
        }

        let mut value = || {
            inline
                .clone()
                .or_else(|| args.next())
                .ok_or_else(|| format!("Missing value for {}", flag))
        };
        match flag.as_str() {
            "-C" => runtime_root = PathBuf::from(value()?),
            "--config" => overrides.config_file = Some(PathBuf::from(value()?)),
            "--films-dir" => overrides.films_dir = Some(PathBuf::from(value()?)),
            "--public-dir" => overrides.public_dir = Some(PathBuf::from(value()?)),
            "--certs-dir" => overrides.certs_dir = Some(PathBuf::from(value()?)),
            "--port" => {
                let raw = value()?;
                let parsed = raw
                    .parse::<u16>()
                    .map_err(|_| format!("Invalid port: {}", raw))?;
                port = Some(parsed);
            }
            _ => return Err(format!("Unknown argument: {}", flag)),
        }
    }

    Ok(ParsedArgs {
        runtime_root: make_runtime_root_absolute(runtime_root)?,
        overrides,
        port,
        mode: RunMode::Serve,
    })
}

fn is_help_flag(arg: &str) -> bool {
    arg == "-h" || arg == "--help"
}

fn make_runtime_root_absolute(runtime_root: PathBuf) -> Result<PathBuf, String> {
    if runtime_root.is_absolute() {
        return Ok(runtime_root);
    }

    let current_dir = std::env::current_dir()
        .map_err(|error| format!("Failed to resolve current directory: {}", error))?;
    Ok(current_dir.join(runtime_root))
}

#[cfg(test)]
mod tests {
    use super::{RunMode, parse_args_from, shutdown_requested};
    use std::io;
    use std::path::PathBuf;
    use std::time::Duration;

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    #[test]
    fn parse_args_defaults_to_serve_in_current_dir() {
        let parsed = parse_args_from(Vec::new()).expect("parse args");
        assert_eq!(parsed.mode, RunMode::Serve);
        assert!(parsed.runtime_root.is_absolute());
        assert_eq!(parsed.port, None);
        assert_eq!(parsed.overrides.films_dir, None);
    }

    #[test]
    fn parse_args_accepts_runtime_root_and_port() {
        let parsed = parse_args_from(args(&["-C", "runtime", "--port", "1966"])).expect("parse args");
        assert!(parsed.runtime_root.ends_with("runtime"));
        assert_eq!(parsed.port, Some(1966));
    }

    #[test]
    fn parse_args_accepts_directory_overrides() {
        let parsed = parse_args_from(args(&[
            "--films-dir",
            "/srv/films",
            "--public-dir=/srv/public",
            "--certs-dir",
            "certs",
            "--config",
            "alt.yaml",
        ]))
        .expect("parse args");
        assert_eq!(parsed.overrides.films_dir, Some(PathBuf::from("/srv/films")));
        assert_eq!(parsed.overrides.public_dir, Some(PathBuf::from("/srv/public")));
        assert_eq!(parsed.overrides.certs_dir, Some(PathBuf::from("certs")));
        assert_eq!(parsed.overrides.config_file, Some(PathBuf::from("alt.yaml")));
    }

    #[test]
    fn parse_args_ignores_double_dash() {
        let parsed = parse_args_from(args(&["--", "-C", "runtime"])).expect("parse args");
        assert!(parsed.runtime_root.ends_with("runtime"));
    }

    #[test]
    fn parse_args_rejects_bad_input() {
        for bad in [
            args(&["--port", "ninety"]),
            args(&["--port", "70000"]),
            args(&["-C"]),
            args(&["serve"]),
        ] {
            assert!(parse_args_from(bad).is_err());
        }
    }

    #[test]
    fn parse_args_accepts_help_flag_anywhere() {
        let parsed = parse_args_from(args(&["--port", "1", "-h"])).expect("parse args");
        assert_eq!(parsed.mode, RunMode::Help);
        let parsed = parse_args_from(args(&["--help"])).expect("parse args");
        assert_eq!(parsed.mode, RunMode::Help);
    }

    #[tokio::test]
    async fn shutdown_signal_stops_waiting() {
        let waited =
            tokio::time::timeout(Duration::from_secs(1), shutdown_requested(async { Ok(()) }))
                .await;
        assert!(waited.is_ok());
    }

    #[tokio::test]
    async fn broken_signal_handler_keeps_serving() {
        let failing = async { Err(io::Error::other("no signal driver")) };
        let waited =
            tokio::time::timeout(Duration::from_millis(50), shutdown_requested(failing)).await;
        assert!(waited.is_err());
    }
}
