//! TLS configuration and certificate loading.

use std::path::{Path, PathBuf};

use axum_server::tls_rustls::RustlsConfig;

/// Missing, unreadable or invalid TLS material.
#[derive(Debug, thiserror::Error)]
pub enum CertificateError {
    #[error("no {0} file configured")]
    NotConfigured(&'static str),

    #[error("unable to read {path}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{0} contains no PEM certificate")]
    NoCertificate(PathBuf),

    #[error("{0} contains no PEM private key")]
    NoPrivateKey(PathBuf),

    #[error("invalid TLS material in {path}: {source}")]
    Invalid {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Load TLS configuration from certificate and key files.
pub async fn load_tls_config(
    cert_path: Option<&Path>,
    key_path: Option<&Path>,
) -> Result<RustlsConfig, CertificateError> {
    let cert_path = cert_path.ok_or(CertificateError::NotConfigured("certificate"))?;
    let key_path = key_path.ok_or(CertificateError::NotConfigured("private key"))?;

    let cert = read(cert_path).await?;
    let key = read(key_path).await?;

    let invalid = |path: &Path| {
        let path = path.to_path_buf();
        move |source| CertificateError::Invalid { path, source }
    };

    // Check the PEM content first so the error names the offending file.
    let certs = rustls_pemfile::certs(&mut cert.as_slice())
        .collect::<Result<Vec<_>, _>>()
        .map_err(invalid(cert_path))?;
    if certs.is_empty() {
        return Err(CertificateError::NoCertificate(cert_path.to_path_buf()));
    }
    if rustls_pemfile::private_key(&mut key.as_slice())
        .map_err(invalid(key_path))?
        .is_none()
    {
        return Err(CertificateError::NoPrivateKey(key_path.to_path_buf()));
    }

    RustlsConfig::from_pem(cert, key)
        .await
        .map_err(invalid(cert_path))
}

async fn read(path: &Path) -> Result<Vec<u8>, CertificateError> {
    tokio::fs::read(path)
        .await
        .map_err(|source| CertificateError::Unreadable {
            path: path.to_path_buf(),
            source,
        })
}
