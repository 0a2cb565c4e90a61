//! TCP listener binding.
//!
//! # Responsibilities
//! - Normalise configured addresses (":8080" binds all interfaces)
//! - Bind the socket and hand it over in non-blocking mode
//! - Report failures as `ConnectorError::Bind`

use std::net::SocketAddr;

use tokio::net::TcpListener;

use crate::net::connector::ConnectorError;

/// Expand a bare `:port` into an all-interfaces address.
pub fn normalize_addr(addr: &str) -> String {
    if addr.starts_with(':') {
        format!("0.0.0.0{}", addr)
    } else {
        addr.to_string()
    }
}

/// Bind to `addr`, returning a std listener ready for `axum_server::from_tcp`.
pub async fn bind(addr: &str) -> Result<(std::net::TcpListener, SocketAddr), ConnectorError> {
    let bind_error = |source| ConnectorError::Bind {
        addr: addr.to_string(),
        source,
    };

    let listener = TcpListener::bind(normalize_addr(addr))
        .await
        .map_err(bind_error)?;
    let local_addr = listener.local_addr().map_err(bind_error)?;

    tracing::debug!(address = %local_addr, "Listener bound");

    // `into_std` keeps the socket in non-blocking mode.
    let listener = listener.into_std().map_err(bind_error)?;
    Ok((listener, local_addr))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_port_binds_all_interfaces() {
        assert_eq!(normalize_addr(":8080"), "0.0.0.0:8080");
        assert_eq!(normalize_addr("127.0.0.1:8080"), "127.0.0.1:8080");
        assert_eq!(normalize_addr("[::1]:8080"), "[::1]:8080");
    }

    #[tokio::test]
    async fn occupied_port_is_bind_error() {
        let (_held, addr) = bind("127.0.0.1:0").await.unwrap();
        let result = bind(&addr.to_string()).await;
        assert!(matches!(result, Err(ConnectorError::Bind { .. })));
    }

    #[tokio::test]
    async fn unresolvable_host_is_bind_error() {
        let result = bind("no-such-host.invalid:80").await;
        assert!(matches!(result, Err(ConnectorError::Bind { .. })));
    }
}
