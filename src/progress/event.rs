use std::time::Duration;

/// One stage of the request lifecycle, in causal order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Phase {
    Dns,
    Connect,
    Tls,
    Server,
    Transfer,
}

impl Phase {
    pub const ALL: [Phase; 5] = [
        Phase::Dns,
        Phase::Connect,
        Phase::Tls,
        Phase::Server,
        Phase::Transfer,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Phase::Dns => "DNS Lookup",
            Phase::Connect => "TCP Connection",
            Phase::Tls => "TLS Handshake",
            Phase::Server => "Server Process",
            Phase::Transfer => "Content Transfer",
        }
    }

    pub(crate) fn index(&self) -> usize {
        *self as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseEventKind {
    Start,
    Complete,
}

/// Message published by the request executor's lifecycle hooks.
/// `duration` is meaningful only on `Complete`.
#[derive(Debug, Clone, Copy)]
pub struct PhaseEvent {
    pub phase: Phase,
    pub kind: PhaseEventKind,
    pub duration: Duration,
}

impl PhaseEvent {
    pub fn started(phase: Phase) -> Self {
        Self {
            phase,
            kind: PhaseEventKind::Start,
            duration: Duration::ZERO,
        }
    }

    pub fn completed(phase: Phase, duration: Duration) -> Self {
        Self {
            phase,
            kind: PhaseEventKind::Complete,
            duration,
        }
    }
}
