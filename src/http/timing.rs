use std::fmt;
use std::time::{Duration, Instant};

/// Raw timestamps collected by the lifecycle hooks of one request.
#[derive(Debug, Default, Clone)]
pub struct RequestTimings {
    pub dns_start: Option<Instant>,
    pub dns_end: Option<Instant>,
    pub tcp_connect_start: Option<Instant>,
    pub tcp_connect_end: Option<Instant>,
    pub tls_start: Option<Instant>,
    pub tls_end: Option<Instant>,
    pub request_sent: Option<Instant>,
    pub first_byte: Option<Instant>,
    pub transfer_start: Option<Instant>,
    pub transfer_end: Option<Instant>,
    pub total_start: Option<Instant>,
    pub total_end: Option<Instant>,
}

impl RequestTimings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start_total(&mut self) {
        self.total_start = Some(Instant::now());
    }

    pub fn end_total(&mut self) {
        self.total_end = Some(Instant::now());
    }

    pub fn start_dns(&mut self) {
        self.dns_start = Some(Instant::now());
    }

    pub fn end_dns(&mut self) {
        self.dns_end = Some(Instant::now());
    }

    pub fn start_tcp_connect(&mut self) {
        self.tcp_connect_start = Some(Instant::now());
    }

    pub fn end_tcp_connect(&mut self) {
        self.tcp_connect_end = Some(Instant::now());
    }

    pub fn start_tls(&mut self) {
        self.tls_start = Some(Instant::now());
    }

    pub fn end_tls(&mut self) {
        self.tls_end = Some(Instant::now());
    }

    pub fn mark_request_sent(&mut self) {
        self.request_sent = Some(Instant::now());
    }

    pub fn mark_first_byte(&mut self) {
        self.first_byte = Some(Instant::now());
    }

    pub fn start_transfer(&mut self) {
        self.transfer_start = Some(Instant::now());
    }

    pub fn end_transfer(&mut self) {
        self.transfer_end = Some(Instant::now());
    }

    pub fn dns_duration(&self) -> Option<Duration> {
        Some(self.dns_end?.duration_since(self.dns_start?))
    }

    pub fn tcp_connect_duration(&self) -> Option<Duration> {
        Some(self.tcp_connect_end?.duration_since(self.tcp_connect_start?))
    }

    pub fn tls_duration(&self) -> Option<Duration> {
        Some(self.tls_end?.duration_since(self.tls_start?))
    }

    /// Server processing time is not directly observable. It is derived as
    /// first byte minus connect start, minus the TLS handshake when one was
    /// performed, saturating at zero.
    pub fn server_duration(&self) -> Option<Duration> {
        let first_byte = self.first_byte?;
        let connect_start = self.tcp_connect_start?;
        let tls = self.tls_duration().unwrap_or_default();
        Some(first_byte.duration_since(connect_start).saturating_sub(tls))
    }

    pub fn transfer_duration(&self) -> Option<Duration> {
        Some(self.transfer_end?.duration_since(self.transfer_start?))
    }

    pub fn total_duration(&self) -> Option<Duration> {
        Some(self.total_end?.duration_since(self.total_start?))
    }

    pub fn snapshot(&self) -> Timings {
        Timings {
            dns_lookup: self.dns_duration().unwrap_or_default(),
            tcp_connection: self.tcp_connect_duration().unwrap_or_default(),
            tls_handshake: self.tls_duration().unwrap_or_default(),
            server_time: self.server_duration().unwrap_or_default(),
            transfer: self.transfer_duration().unwrap_or_default(),
            total: self.total_duration().unwrap_or_default(),
        }
    }
}

/// Final per-phase breakdown attached to the response.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Timings {
    pub dns_lookup: Duration,
    pub tcp_connection: Duration,
    pub tls_handshake: Duration,
    pub server_time: Duration,
    pub transfer: Duration,
    pub total: Duration,
}

impl fmt::Display for Timings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "\nDetailed Timings:")?;
        writeln!(f, "  DNS Lookup:        {:>10}", format!("{:?}", self.dns_lookup))?;
        writeln!(
            f,
            "  TCP Connection:    {:>10}",
            format!("{:?}", self.tcp_connection)
        )?;
        if self.tls_handshake > Duration::ZERO {
            writeln!(
                f,
                "  TLS Handshake:     {:>10}",
                format!("{:?}", self.tls_handshake)
            )?;
        }
        writeln!(
            f,
            "  Server Processing: {:>10}",
            format!("{:?}", self.server_time)
        )?;
        writeln!(f, "  Content Transfer:  {:>10}", format!("{:?}", self.transfer))?;
        writeln!(f, "  Total:             {:>10}", format!("{:?}", self.total))?;
        Ok(())
    }
}
