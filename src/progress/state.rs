use std::time::{Duration, Instant};

use super::event::{Phase, PhaseEvent, PhaseEventKind};

/// Progress record for a single phase. `duration` is valid only once
/// `completed` is set; before that the live view derives an elapsed-so-far
/// value from `started_at`.
#[derive(Debug, Clone, Copy, Default)]
pub struct PhaseTrack {
    pub started: bool,
    pub completed: bool,
    pub duration: Duration,
    pub started_at: Option<Instant>,
}

/// Mutable per-request progress state. Owned exclusively by the monitor
/// task, so no locking is involved anywhere. One instance per request;
/// a replayed request gets a fresh one.
#[derive(Debug, Clone)]
pub struct PhaseState {
    tracks: [PhaseTrack; Phase::ALL.len()],
    pub started_at: Instant,
}

impl PhaseState {
    pub fn new(started_at: Instant) -> Self {
        Self {
            tracks: [PhaseTrack::default(); Phase::ALL.len()],
            started_at,
        }
    }

    pub fn track(&self, phase: Phase) -> &PhaseTrack {
        &self.tracks[phase.index()]
    }

    /// Applies a lifecycle event. Transitions are single-shot: a second
    /// start or complete for the same phase is ignored, as is a complete
    /// for a phase that never started.
    pub fn apply(&mut self, event: PhaseEvent, now: Instant) {
        let track = &mut self.tracks[event.phase.index()];
        match event.kind {
            PhaseEventKind::Start => {
                if !track.started {
                    track.started = true;
                    track.started_at = Some(now);
                }
            }
            PhaseEventKind::Complete => {
                if track.started && !track.completed {
                    track.completed = true;
                    track.duration = event.duration;
                }
            }
        }
    }

    /// The final duration for a completed phase, or elapsed-so-far for one
    /// still in flight.
    pub fn current_duration(&self, phase: Phase, now: Instant) -> Duration {
        let track = self.track(phase);
        if track.completed {
            track.duration
        } else {
            track
                .started_at
                .map(|at| now.duration_since(at))
                .unwrap_or_default()
        }
    }

    /// Cumulative duration of completed phases preceding `phase` in causal
    /// order, used as the waterfall offset.
    pub fn completed_before(&self, phase: Phase) -> Duration {
        Phase::ALL
            .iter()
            .take_while(|p| **p != phase)
            .map(|p| self.track(*p))
            .filter(|t| t.completed)
            .map(|t| t.duration)
            .sum()
    }

    pub fn started_phases(&self) -> impl Iterator<Item = Phase> + '_ {
        Phase::ALL
            .into_iter()
            .filter(move |p| self.track(*p).started)
    }

    pub fn started_count(&self) -> usize {
        self.started_phases().count()
    }

    pub fn completed_total(&self) -> Duration {
        self.tracks
            .iter()
            .filter(|t| t.completed)
            .map(|t| t.duration)
            .sum()
    }

    /// Overall progress percentage. Monotonically non-decreasing over one
    /// request as long as events arrive in causal order: each branch's
    /// ceiling is the next branch's floor.
    pub fn progress_percent(&self, now: Instant) -> u64 {
        let elapsed_in = |phase: Phase| {
            self.track(phase)
                .started_at
                .map(|at| now.duration_since(at))
                .unwrap_or_default()
        };

        if self.track(Phase::Transfer).completed {
            100
        } else if self.track(Phase::Transfer).started {
            ramp(80.0, elapsed_in(Phase::Transfer), 95)
        } else if self.track(Phase::Server).started {
            ramp(60.0, elapsed_in(Phase::Server), 80)
        } else if self.track(Phase::Tls).started {
            if self.track(Phase::Tls).completed {
                60
            } else {
                40
            }
        } else if self.track(Phase::Connect).started {
            if self.track(Phase::Connect).completed {
                40
            } else {
                20
            }
        } else if self.track(Phase::Dns).started {
            if self.track(Phase::Dns).completed {
                20
            } else {
                10
            }
        } else {
            0
        }
    }
}

// 20 points over 5 seconds, capped.
fn ramp(base: f64, elapsed: Duration, cap: u64) -> u64 {
    let value = base + (elapsed.as_secs_f64() / 5.0) * 20.0;
    (value as u64).min(cap)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    #[test]
    fn complete_implies_started() {
        let t0 = Instant::now();
        let mut state = PhaseState::new(t0);

        // A stray complete for a phase that never started is a no-op.
        state.apply(PhaseEvent::completed(Phase::Tls, ms(10)), t0);
        assert!(!state.track(Phase::Tls).started);
        assert!(!state.track(Phase::Tls).completed);

        state.apply(PhaseEvent::started(Phase::Dns), t0);
        state.apply(PhaseEvent::completed(Phase::Dns, ms(5)), t0 + ms(5));
        for phase in Phase::ALL {
            let track = state.track(phase);
            assert!(!track.completed || track.started);
        }
    }

    #[test]
    fn transitions_are_single_shot() {
        let t0 = Instant::now();
        let mut state = PhaseState::new(t0);

        state.apply(PhaseEvent::started(Phase::Dns), t0);
        state.apply(PhaseEvent::completed(Phase::Dns, ms(5)), t0 + ms(5));
        // Neither a re-start nor a second complete may disturb the record.
        state.apply(PhaseEvent::started(Phase::Dns), t0 + ms(8));
        state.apply(PhaseEvent::completed(Phase::Dns, ms(99)), t0 + ms(9));

        let track = state.track(Phase::Dns);
        assert_eq!(track.duration, ms(5));
        assert_eq!(track.started_at, Some(t0));
    }

    #[test]
    fn current_duration_uses_elapsed_until_completed() {
        let t0 = Instant::now();
        let mut state = PhaseState::new(t0);

        state.apply(PhaseEvent::started(Phase::Connect), t0);
        assert_eq!(state.current_duration(Phase::Connect, t0 + ms(7)), ms(7));

        state.apply(PhaseEvent::completed(Phase::Connect, ms(10)), t0 + ms(10));
        assert_eq!(state.current_duration(Phase::Connect, t0 + ms(500)), ms(10));
    }

    #[test]
    fn waterfall_offset_sums_prior_completed_phases() {
        let t0 = Instant::now();
        let mut state = PhaseState::new(t0);

        state.apply(PhaseEvent::started(Phase::Dns), t0);
        state.apply(PhaseEvent::completed(Phase::Dns, ms(5)), t0);
        state.apply(PhaseEvent::started(Phase::Connect), t0);
        state.apply(PhaseEvent::completed(Phase::Connect, ms(10)), t0);
        state.apply(PhaseEvent::started(Phase::Tls), t0);

        assert_eq!(state.completed_before(Phase::Tls), ms(15));
        // TLS has started but not completed, so it contributes nothing yet.
        assert_eq!(state.completed_before(Phase::Server), ms(15));
        assert_eq!(state.completed_before(Phase::Dns), Duration::ZERO);
    }

    #[test]
    fn percent_ladder_matches_phase_milestones() {
        let t0 = Instant::now();
        let mut state = PhaseState::new(t0);
        assert_eq!(state.progress_percent(t0), 0);

        state.apply(PhaseEvent::started(Phase::Dns), t0);
        assert_eq!(state.progress_percent(t0), 10);
        state.apply(PhaseEvent::completed(Phase::Dns, ms(5)), t0);
        assert_eq!(state.progress_percent(t0), 20);

        state.apply(PhaseEvent::started(Phase::Connect), t0);
        assert_eq!(state.progress_percent(t0), 20);
        state.apply(PhaseEvent::completed(Phase::Connect, ms(10)), t0);
        assert_eq!(state.progress_percent(t0), 40);

        state.apply(PhaseEvent::started(Phase::Tls), t0);
        assert_eq!(state.progress_percent(t0), 40);
        state.apply(PhaseEvent::completed(Phase::Tls, ms(15)), t0);
        assert_eq!(state.progress_percent(t0), 60);

        state.apply(PhaseEvent::started(Phase::Server), t0);
        assert_eq!(state.progress_percent(t0), 60);
        // The 60..80 band ramps with elapsed time and caps at 80.
        assert_eq!(state.progress_percent(t0 + ms(2500)), 70);
        assert_eq!(state.progress_percent(t0 + Duration::from_secs(60)), 80);

        state.apply(PhaseEvent::completed(Phase::Server, ms(20)), t0);
        state.apply(PhaseEvent::started(Phase::Transfer), t0 + ms(50));
        assert_eq!(state.progress_percent(t0 + ms(50)), 80);
        assert_eq!(
            state.progress_percent(t0 + ms(50) + Duration::from_secs(60)),
            95
        );

        state.apply(PhaseEvent::completed(Phase::Transfer, ms(8)), t0 + ms(58));
        assert_eq!(state.progress_percent(t0 + ms(58)), 100);
    }

    #[test]
    fn percent_is_monotone_over_a_full_request() {
        let t0 = Instant::now();
        let mut state = PhaseState::new(t0);
        let script = [
            PhaseEvent::started(Phase::Dns),
            PhaseEvent::completed(Phase::Dns, ms(5)),
            PhaseEvent::started(Phase::Connect),
            PhaseEvent::completed(Phase::Connect, ms(10)),
            PhaseEvent::started(Phase::Tls),
            PhaseEvent::completed(Phase::Tls, ms(15)),
            PhaseEvent::started(Phase::Server),
            PhaseEvent::completed(Phase::Server, ms(20)),
            PhaseEvent::started(Phase::Transfer),
            PhaseEvent::completed(Phase::Transfer, ms(8)),
        ];

        let mut now = t0;
        let mut last = 0;
        for event in script {
            now += ms(3);
            state.apply(event, now);
            let percent = state.progress_percent(now);
            assert!(percent >= last, "{percent} < {last} after {event:?}");
            last = percent;
        }
        assert_eq!(last, 100);
    }
}
