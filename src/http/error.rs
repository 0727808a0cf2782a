use std::io;
use std::time::Duration;

/// Failures of a single request round trip. Everything up to and including
/// the response head is a network error; a failure while reading the body
/// is a transfer error and may leave status and headers already observed.
#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    #[error("DNS lookup failed for {host}: {source}")]
    Dns { host: String, source: io::Error },

    #[error("no IP addresses found for host {0}")]
    NoAddress(String),

    #[error("connection to {addr} failed: {source}")]
    Connect { addr: String, source: io::Error },

    #[error("TLS handshake with {host} failed: {source}")]
    Tls { host: String, source: io::Error },

    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("failed to send request: {0}")]
    Send(#[source] hyper::Error),

    #[error("failed to read response body: {0}")]
    Transfer(#[source] hyper::Error),
}

impl RequestError {
    /// True for every failure mode except a body-read failure.
    pub fn is_network(&self) -> bool {
        !matches!(self, RequestError::Transfer(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transfer_is_the_only_non_network_failure() {
        let dns = RequestError::Dns {
            host: "example.com".into(),
            source: io::Error::new(io::ErrorKind::NotFound, "nx"),
        };
        assert!(dns.is_network());
        assert!(RequestError::Timeout(Duration::from_secs(30)).is_network());
        assert!(RequestError::NoAddress("example.com".into()).is_network());
    }
}
