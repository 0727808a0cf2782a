pub mod insecure;

use std::sync::Arc;

use anyhow::Context;
use rustls::crypto::ring::{default_provider, DEFAULT_CIPHER_SUITES};
use rustls::crypto::CryptoProvider;
use rustls::{ClientConfig, RootCertStore};

use crate::tls::insecure::InsecureVerifier;

/// Builds the client TLS configuration: webpki roots by default, a PEM
/// bundle when `-c` is given, and an accept-all verifier when `-k` is set.
pub fn build_client_config(
    certificate_path: Option<&str>,
    insecure: bool,
) -> Result<ClientConfig, anyhow::Error> {
    let mut root_store = RootCertStore::empty();
    if let Some(file_path) = certificate_path {
        let f = std::fs::File::open(file_path)
            .with_context(|| format!("Failed to open certificate bundle: {}", file_path))?;
        let mut rd = std::io::BufReader::new(f);
        for cert in rustls_pemfile::certs(&mut rd) {
            root_store.add(cert?)?;
        }
    } else {
        root_store.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
    }

    let provider = CryptoProvider {
        cipher_suites: DEFAULT_CIPHER_SUITES.to_vec(),
        ..default_provider()
    };
    let mut config = ClientConfig::builder_with_provider(provider.into())
        .with_protocol_versions(rustls::DEFAULT_VERSIONS)?
        .with_root_certificates(root_store)
        .with_no_client_auth();

    if insecure {
        config
            .dangerous()
            .set_certificate_verifier(Arc::new(InsecureVerifier::new(default_provider())));
    }

    Ok(config)
}
