//! Pure rendering of a `PhaseState` snapshot into terminal text. No I/O
//! happens here, which is what keeps the waterfall output unit-testable.

use std::time::{Duration, Instant};

use super::event::Phase;
use super::state::PhaseState;

pub const RESET: &str = "\x1b[0m";
pub const NEUTRAL: &str = "\x1b[38;5;240m";
const WHITE: &str = "\x1b[37m";

const ERASE_LINE: &str = "\x1b[A\x1b[2K";

// One block per 20ms of phase time.
const NANOS_PER_BLOCK: u128 = 20_000_000;
const LABEL_WIDTH: usize = 16;

pub fn phase_color(phase: Phase) -> &'static str {
    match phase {
        Phase::Dns => "\x1b[38;5;39m",
        Phase::Connect => "\x1b[38;5;48m",
        Phase::Tls => "\x1b[38;5;118m",
        Phase::Server => "\x1b[38;5;226m",
        Phase::Transfer => "\x1b[38;5;208m",
    }
}

/// Width of a phase's own block run: `ceil(duration / 20ms)`, minimum one
/// block so that even a sub-millisecond phase stays visible.
pub fn block_width(duration: Duration) -> usize {
    blocks(duration).max(1)
}

// Offset runs have no minimum; a zero offset draws nothing.
fn blocks(duration: Duration) -> usize {
    duration.as_nanos().div_ceil(NANOS_PER_BLOCK) as usize
}

fn format_duration(duration: Duration) -> String {
    format!("{:?}", duration)
}

/// One waterfall line: colored label, duration, a neutral block run for the
/// cumulative duration of prior completed phases, then the phase's own run.
pub fn phase_line(phase: Phase, duration: Duration, offset: Duration) -> String {
    let color = phase_color(phase);
    let mut line = format!(
        "  {color}{label}{RESET}:{pad} {duration:>10} ",
        label = phase.label(),
        pad = " ".repeat(LABEL_WIDTH - phase.label().len()),
        duration = format_duration(duration),
    );
    let offset_blocks = blocks(offset);
    if offset_blocks > 0 {
        line.push_str(NEUTRAL);
        line.extend(std::iter::repeat('░').take(offset_blocks));
    }
    line.push_str(color);
    line.extend(std::iter::repeat('█').take(block_width(duration)));
    line.push_str(RESET);
    line
}

/// Live view: one line per started phase in causal order, in-flight phases
/// shown with their elapsed-so-far duration.
pub fn live_lines(state: &PhaseState, now: Instant) -> Vec<String> {
    state
        .started_phases()
        .map(|phase| {
            phase_line(
                phase,
                state.current_duration(phase, now),
                state.completed_before(phase),
            )
        })
        .collect()
}

/// Final waterfall: a header, one line per completed phase, and the total.
pub fn summary_lines(state: &PhaseState) -> Vec<String> {
    let mut lines = vec![String::from("HTTP Request Timings:")];
    for phase in Phase::ALL {
        let track = state.track(phase);
        if track.completed {
            lines.push(phase_line(phase, track.duration, state.completed_before(phase)));
        }
    }
    lines.push(format!(
        "  {WHITE}Total Duration{RESET}:   {:>10}",
        format_duration(state.completed_total()),
    ));
    lines
}

/// Description shown next to the overall progress bar: the most advanced
/// phase currently active, in its color.
pub fn bar_description(state: &PhaseState) -> String {
    let (label, color) = if state.track(Phase::Transfer).completed {
        ("Complete", phase_color(Phase::Transfer))
    } else if state.track(Phase::Transfer).started {
        ("Content Transfer", phase_color(Phase::Transfer))
    } else if state.track(Phase::Server).started {
        ("Server Processing", phase_color(Phase::Server))
    } else if state.track(Phase::Tls).started {
        ("TLS Handshake", phase_color(Phase::Tls))
    } else if state.track(Phase::Connect).started {
        ("TCP Connection", phase_color(Phase::Connect))
    } else if state.track(Phase::Dns).started {
        ("DNS Lookup", phase_color(Phase::Dns))
    } else {
        ("Waiting...", RESET)
    };
    format!("{color}{label:<17}{RESET}")
}

/// Cursor-up-and-erase for each previously drawn line.
pub fn erase_lines(count: usize) -> String {
    ERASE_LINE.repeat(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::event::PhaseEvent;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    #[test]
    fn block_width_is_ceil_of_twenty_ms_units() {
        assert_eq!(block_width(Duration::ZERO), 1);
        assert_eq!(block_width(Duration::from_micros(300)), 1);
        assert_eq!(block_width(ms(5)), 1);
        assert_eq!(block_width(ms(20)), 1);
        assert_eq!(block_width(Duration::from_micros(20_500)), 2);
        assert_eq!(block_width(ms(21)), 2);
        assert_eq!(block_width(ms(100)), 5);
        assert_eq!(block_width(ms(101)), 6);
    }

    #[test]
    fn phase_line_carries_color_offset_and_bar() {
        let line = phase_line(Phase::Connect, ms(10), ms(5));
        assert!(line.contains("TCP Connection"));
        assert!(line.contains(phase_color(Phase::Connect)));
        // 5ms of prior phases rounds up to one neutral block.
        assert!(line.contains(&format!("{NEUTRAL}░")));
        assert!(line.contains('█'));
        assert!(line.ends_with(RESET));
    }

    #[test]
    fn first_phase_has_no_offset_run() {
        let line = phase_line(Phase::Dns, ms(5), Duration::ZERO);
        assert!(!line.contains('░'));
        assert!(!line.contains(NEUTRAL));
    }

    #[test]
    fn summary_lists_completed_phases_in_causal_order() {
        let t0 = Instant::now();
        let mut state = PhaseState::new(t0);
        for (phase, duration) in [
            (Phase::Dns, ms(5)),
            (Phase::Connect, ms(10)),
            (Phase::Tls, ms(15)),
            (Phase::Server, ms(20)),
            (Phase::Transfer, ms(8)),
        ] {
            state.apply(PhaseEvent::started(phase), t0);
            state.apply(PhaseEvent::completed(phase, duration), t0);
        }

        let lines = summary_lines(&state);
        // Header, five phase lines, total.
        assert_eq!(lines.len(), 7);
        assert_eq!(lines[0], "HTTP Request Timings:");
        assert!(lines[1].contains("DNS Lookup"));
        assert!(lines[2].contains("TCP Connection"));
        assert!(lines[3].contains("TLS Handshake"));
        assert!(lines[4].contains("Server Process"));
        assert!(lines[5].contains("Content Transfer"));
        assert!(lines[6].contains("Total Duration"));
        assert!(lines[6].contains("58ms"));
        assert_eq!(state.progress_percent(t0), 100);
    }

    #[test]
    fn plain_http_summary_has_no_tls_line() {
        let t0 = Instant::now();
        let mut state = PhaseState::new(t0);
        for (phase, duration) in [
            (Phase::Dns, ms(5)),
            (Phase::Connect, ms(10)),
            (Phase::Server, ms(20)),
            (Phase::Transfer, ms(8)),
        ] {
            state.apply(PhaseEvent::started(phase), t0);
            state.apply(PhaseEvent::completed(phase, duration), t0);
        }

        let lines = summary_lines(&state);
        assert_eq!(lines.len(), 6);
        assert!(lines.iter().all(|l| !l.contains("TLS Handshake")));
        assert_eq!(live_lines(&state, t0).len(), 4);
    }

    #[test]
    fn zero_duration_transfer_still_renders_one_block() {
        let t0 = Instant::now();
        let mut state = PhaseState::new(t0);
        state.apply(PhaseEvent::started(Phase::Transfer), t0);
        state.apply(PhaseEvent::completed(Phase::Transfer, Duration::ZERO), t0);

        let lines = summary_lines(&state);
        let transfer = &lines[1];
        assert_eq!(transfer.matches('█').count(), 1);
    }

    #[test]
    fn live_lines_track_started_phases_only() {
        let t0 = Instant::now();
        let mut state = PhaseState::new(t0);
        assert!(live_lines(&state, t0).is_empty());

        state.apply(PhaseEvent::started(Phase::Dns), t0);
        state.apply(PhaseEvent::completed(Phase::Dns, ms(5)), t0);
        state.apply(PhaseEvent::started(Phase::Connect), t0);

        let lines = live_lines(&state, t0 + ms(30));
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("DNS Lookup"));
        // In-flight connect renders its elapsed-so-far width: 30ms -> 2 blocks.
        assert_eq!(lines[1].matches('█').count(), 2);
    }

    #[test]
    fn bar_description_follows_the_most_advanced_phase() {
        let t0 = Instant::now();
        let mut state = PhaseState::new(t0);
        assert!(bar_description(&state).contains("Waiting..."));

        state.apply(PhaseEvent::started(Phase::Dns), t0);
        assert!(bar_description(&state).contains("DNS Lookup"));

        state.apply(PhaseEvent::started(Phase::Server), t0);
        assert!(bar_description(&state).contains("Server Processing"));

        state.apply(PhaseEvent::started(Phase::Transfer), t0);
        state.apply(PhaseEvent::completed(Phase::Transfer, ms(8)), t0);
        assert!(bar_description(&state).contains("Complete"));
    }

    #[test]
    fn erase_sequence_repeats_per_line() {
        assert_eq!(erase_lines(0), "");
        assert_eq!(erase_lines(3), "\x1b[A\x1b[2K\x1b[A\x1b[2K\x1b[A\x1b[2K");
    }
}
