//! TLS configuration and certificate loading.

use std::path::Path;

use axum_server::tls_rustls::RustlsConfig;

use crate::config::schema::TlsConfig;
use crate::error::GatewayError;

/// Load the PEM certificate chain and private key named in the config.
pub async fn load_tls_config(tls: &TlsConfig) -> Result<RustlsConfig, GatewayError> {
    let cert_path = Path::new(&tls.cert_path);
    let key_path = Path::new(&tls.key_path);

    if !cert_path.exists() {
        return Err(GatewayError::Tls(format!("Certificate file not found: {:?}", cert_path)));
    }
    if !key_path.exists() {
        return Err(GatewayError::Tls(format!("Private key file not found: {:?}", key_path)));
    }

    RustlsConfig::from_pem_file(cert_path, key_path)
        .await
        .map_err(|e| GatewayError::Tls(e.to_string()))
}
