// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use crate::config::TlsConfig;
use crate::runtime_paths::RuntimePaths;
use log::{info, warn};
use rcgen::{CertificateParams, DistinguishedName, DnType, KeyPair};
use rustls::pki_types::pem::PemObject;
use rustls::pki_types::{CertificateDer, PrivateKeyDer};
use rustls::server::{ClientHello, ResolvesServerCert};
use rustls::sign::CertifiedKey;
use std::fs::{self, File};
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use std::time::{Duration as StdDuration, SystemTime};
use time::OffsetDateTime;
use x509_parser::pem::parse_x509_pem;
use x509_parser::prelude::{FromDer, X509Certificate};

const RELOAD_DEBOUNCE: StdDuration = StdDuration::from_secs(1);

/// PEM certificate and key stored as `<certs>/<domain>.crt` and `<certs>/<domain>.key`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateFiles {
    pub cert_path: PathBuf,
    pub key_path: PathBuf,
}

impl CertificateFiles {
    pub fn for_domain(certs_dir: &Path, domain: &str) -> Self {
        Self {
            cert_path: certs_dir.join(format!("{}.crt", domain)),
            key_path: certs_dir.join(format!("{}.key", domain)),
        }
    }
}

pub fn load_rustls_config(
    runtime_paths: &RuntimePaths,
    tls: &TlsConfig,
) -> io::Result<rustls::ServerConfig> {
    let files = CertificateFiles::for_domain(&runtime_paths.certs_dir, &tls.domain);
    ensure_self_signed(&runtime_paths.certs_dir, &files, tls)?;

    if let Ok(not_after) = cert_not_after(&files.cert_path) {
        info!(
            "TLS certificate for {} valid until {}",
            tls.domain, not_after
        );
    }

    let resolver = ReloadingCertResolver::new(files)?;
    Ok(rustls::ServerConfig::builder()
        .with_no_client_auth()
        .with_cert_resolver(Arc::new(resolver)))
}

/// Returns true when a new certificate was written.
pub fn ensure_self_signed(
    certs_dir: &Path,
    files: &CertificateFiles,
    tls: &TlsConfig,
) -> io::Result<bool> {
    if files.cert_path.exists()
        && files.key_path.exists()
        && !cert_is_expired(&files.cert_path).unwrap_or(true)
        && load_private_key(&files.key_path).is_ok()
    {
        return Ok(false);
    }

    info!(
        "Creating certificate for {} valid for {} days",
        tls.domain, tls.duration_days
    );

    let mut params = CertificateParams::new(vec![tls.domain.clone()])
        .map_err(|err| io::Error::new(io::ErrorKind::InvalidInput, err))?;
    let mut dn = DistinguishedName::new();
    dn.push(DnType::CommonName, tls.domain.as_str());
    params.distinguished_name = dn;

    let now = OffsetDateTime::now_utc();
    params.not_before = now - time::Duration::seconds(60);
    params.not_after = now + time::Duration::days(i64::from(tls.duration_days));

    let key_pair =
        KeyPair::generate().map_err(|err| io::Error::new(io::ErrorKind::InvalidInput, err))?;
    let cert = params
        .self_signed(&key_pair)
        .map_err(|err| io::Error::new(io::ErrorKind::InvalidInput, err))?;

    fs::create_dir_all(certs_dir)?;
    fs::write(&files.cert_path, cert.pem())?;
    fs::write(&files.key_path, key_pair.serialize_pem())?;
    Ok(true)
}

pub fn cert_not_after(path: &Path) -> io::Result<OffsetDateTime> {
    let bytes = fs::read(path)?;
    let (_, pem) = parse_x509_pem(&bytes)
        .map_err(|err| io::Error::new(io::ErrorKind::InvalidInput, err.to_string()))?;
    let (_, cert) = X509Certificate::from_der(pem.contents.as_slice())
        .map_err(|err| io::Error::new(io::ErrorKind::InvalidInput, err.to_string()))?;
    Ok(cert.validity().not_after.to_datetime())
}

fn cert_is_expired(path: &Path) -> io::Result<bool> {
    Ok(OffsetDateTime::now_utc() >= cert_not_after(path)?)
}

fn load_cert_chain(path: &Path) -> io::Result<Vec<CertificateDer<'static>>> {
    let reader = BufReader::new(File::open(path)?);
    let certs = CertificateDer::pem_reader_iter(reader)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|err| io::Error::new(io::ErrorKind::InvalidInput, err.to_string()))?;

    if certs.is_empty() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("No certificates found in {}", path.display()),
        ));
    }
    Ok(certs)
}

fn load_private_key(path: &Path) -> io::Result<PrivateKeyDer<'static>> {
    let reader = BufReader::new(File::open(path)?);
    PrivateKeyDer::pem_reader_iter(reader)
        .next()
        .ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("No private keys found in {}", path.display()),
            )
        })?
        .map_err(|err| io::Error::new(io::ErrorKind::InvalidInput, err.to_string()))
}

/// Serves the certificate on disk, picking up replacements when their mtime moves forward.
#[derive(Debug)]
struct ReloadingCertResolver {
    files: CertificateFiles,
    state: RwLock<LoadedCert>,
}

#[derive(Debug)]
struct LoadedCert {
    certified_key: Arc<CertifiedKey>,
    modified: SystemTime,
    checked: SystemTime,
}

impl ReloadingCertResolver {
    fn new(files: CertificateFiles) -> io::Result<Self> {
        let certified_key = load_certified_key(&files)?;
        let modified = latest_modified(&files)?;
        Ok(Self {
            files,
            state: RwLock::new(LoadedCert {
                certified_key,
                modified,
                checked: SystemTime::UNIX_EPOCH,
            }),
        })
    }

    fn refresh(&self) -> io::Result<()> {
        let mut state = self
            .state
            .write()
            .map_err(|_| io::Error::other("TLS resolver lock poisoned"))?;

        let now = SystemTime::now();
        if let Ok(elapsed) = now.duration_since(state.checked)
            && elapsed < RELOAD_DEBOUNCE
        {
            return Ok(());
        }
        state.checked = now;

        let modified = latest_modified(&self.files)?;
        if modified <= state.modified {
            return Ok(());
        }

        state.certified_key = load_certified_key(&self.files)?;
        state.modified = modified;
        info!("Reloaded TLS certificate {:?}", self.files.cert_path);
        Ok(())
    }

    fn current(&self) -> Option<Arc<CertifiedKey>> {
        self.state
            .read()
            .ok()
            .map(|state| Arc::clone(&state.certified_key))
    }
}

impl ResolvesServerCert for ReloadingCertResolver {
    fn resolve(&self, _client_hello: ClientHello) -> Option<Arc<CertifiedKey>> {
        if let Err(err) = self.refresh() {
            warn!("TLS reload failed: {}", err);
        }
        self.current()
    }
}

fn load_certified_key(files: &CertificateFiles) -> io::Result<Arc<CertifiedKey>> {
    let cert_chain = load_cert_chain(&files.cert_path)?;
    let private_key = load_private_key(&files.key_path)?;
    let provider = rustls::crypto::ring::default_provider();
    CertifiedKey::from_der(cert_chain, private_key, &provider)
        .map(Arc::new)
        .map_err(|err| io::Error::new(io::ErrorKind::InvalidInput, err.to_string()))
}

fn latest_modified(files: &CertificateFiles) -> io::Result<SystemTime> {
    let cert_modified = fs::metadata(&files.cert_path)?.modified()?;
    let key_modified = fs::metadata(&files.key_path)?.modified()?;
    Ok(cert_modified.max(key_modified))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::test_fixtures::TestFixtureRoot;

    fn tls_for(domain: &str) -> TlsConfig {
        TlsConfig {
            domain: domain.to_string(),
            duration_days: 30,
        }
    }

    fn write_cert(files: &CertificateFiles, domain: &str, not_after_days: i64) {
        let mut params = CertificateParams::new(vec![domain.to_string()]).unwrap();
        let now = OffsetDateTime::now_utc();
        params.not_before = now - time::Duration::days(2);
        params.not_after = now + time::Duration::days(not_after_days);
        let key_pair = KeyPair::generate().unwrap();
        let cert = params.self_signed(&key_pair).unwrap();
        fs::write(&files.cert_path, cert.pem()).unwrap();
        fs::write(&files.key_path, key_pair.serialize_pem()).unwrap();
    }

    fn leaf(resolver: &ReloadingCertResolver) -> Vec<u8> {
        resolver.current().unwrap().cert.first().unwrap().as_ref().to_vec()
    }

    #[test]
    fn files_are_named_after_domain() {
        let files = CertificateFiles::for_domain(Path::new("/srv/certs"), "films.example");
        assert_eq!(files.cert_path, PathBuf::from("/srv/certs/films.example.crt"));
        assert_eq!(files.key_path, PathBuf::from("/srv/certs/films.example.key"));
    }

    #[test]
    fn generates_missing_certificate_with_configured_lifetime() {
        let fixture = TestFixtureRoot::new_unique("tls-generate").unwrap();
        let runtime_paths = fixture.runtime_paths().unwrap();

        assert!(load_rustls_config(&runtime_paths, &tls_for("films.example")).is_ok());

        let files = CertificateFiles::for_domain(&runtime_paths.certs_dir, "films.example");
        assert!(files.key_path.exists());
        let not_after = cert_not_after(&files.cert_path).unwrap();
        let remaining = not_after - OffsetDateTime::now_utc();
        assert!(remaining > time::Duration::days(29));
        assert!(remaining <= time::Duration::days(30));
    }

    #[test]
    fn keeps_valid_certificate() {
        let fixture = TestFixtureRoot::new_unique("tls-keep").unwrap();
        let runtime_paths = fixture.runtime_paths().unwrap();
        let files = CertificateFiles::for_domain(&runtime_paths.certs_dir, "films.example");
        write_cert(&files, "films.example", 10);
        let before = fs::read(&files.cert_path).unwrap();

        let generated =
            ensure_self_signed(&runtime_paths.certs_dir, &files, &tls_for("films.example"))
                .unwrap();
        assert!(!generated);
        assert_eq!(fs::read(&files.cert_path).unwrap(), before);
    }

    #[test]
    fn regenerates_expired_or_unreadable_certificate() {
        let fixture = TestFixtureRoot::new_unique("tls-regenerate").unwrap();
        let runtime_paths = fixture.runtime_paths().unwrap();
        let files = CertificateFiles::for_domain(&runtime_paths.certs_dir, "films.example");
        let tls = tls_for("films.example");

        write_cert(&files, "films.example", -1);
        assert!(ensure_self_signed(&runtime_paths.certs_dir, &files, &tls).unwrap());
        assert!(!cert_is_expired(&files.cert_path).unwrap());

        fs::write(&files.key_path, "not a key").unwrap();
        assert!(ensure_self_signed(&runtime_paths.certs_dir, &files, &tls).unwrap());
        assert!(load_private_key(&files.key_path).is_ok());
    }

    #[test]
    fn rejects_invalid_pem() {
        let fixture = TestFixtureRoot::new_unique("tls-invalid").unwrap();
        let runtime_paths = fixture.runtime_paths().unwrap();
        let files = CertificateFiles::for_domain(&runtime_paths.certs_dir, "films.example");
        fs::write(&files.cert_path, "not a cert").unwrap();
        fs::write(&files.key_path, "not a key").unwrap();

        assert!(load_cert_chain(&files.cert_path).is_err());
        assert!(load_private_key(&files.key_path).is_err());
    }

    #[test]
    fn resolver_picks_up_replaced_certificate() {
        let fixture = TestFixtureRoot::new_unique("tls-reload").unwrap();
        let runtime_paths = fixture.runtime_paths().unwrap();
        let files = CertificateFiles::for_domain(&runtime_paths.certs_dir, "films.example");
        write_cert(&files, "films.example", 30);

        let resolver = ReloadingCertResolver::new(files.clone()).unwrap();
        let initial = leaf(&resolver);

        std::thread::sleep(StdDuration::from_millis(1100));
        write_cert(&files, "films.example", 60);
        resolver.refresh().unwrap();

        assert_ne!(initial, leaf(&resolver));
    }
}
