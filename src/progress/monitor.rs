use std::io::{self, Write};
use std::time::{Duration, Instant};

use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::event::{Phase, PhaseEvent, PhaseEventKind};
use super::render;
use super::state::PhaseState;

// Deep enough that a single request's hooks never hit the bound.
const EVENT_QUEUE_DEPTH: usize = 64;
const TICK_INTERVAL: Duration = Duration::from_millis(10);

/// Owner of the live request display. The render loop runs on its own task
/// and is the only mutator of `PhaseState`; lifecycle hooks publish events
/// through a bounded channel and never block on rendering.
///
/// Lifecycle: `new(enabled)` → `start()` → zero or more `update(..)` →
/// `complete()` exactly once. Every call is a no-op when disabled.
pub struct ProgressMonitor {
    enabled: bool,
    events: Option<mpsc::Sender<PhaseEvent>>,
    complete: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl ProgressMonitor {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            events: None,
            complete: None,
            task: None,
        }
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn start(&mut self) {
        if !self.enabled || self.task.is_some() {
            return;
        }
        let (event_tx, event_rx) = mpsc::channel(EVENT_QUEUE_DEPTH);
        let (complete_tx, complete_rx) = oneshot::channel();
        self.events = Some(event_tx);
        self.complete = Some(complete_tx);
        self.task = Some(tokio::spawn(run(event_rx, complete_rx)));
    }

    /// Publishes a phase transition. Called from the request's lifecycle
    /// hooks; must stay cheap. A full queue drops the event rather than
    /// slowing the request.
    pub fn update(&self, phase: Phase, kind: PhaseEventKind, duration: Duration) {
        let Some(events) = &self.events else {
            return;
        };
        let event = PhaseEvent {
            phase,
            kind,
            duration,
        };
        if events.try_send(event).is_err() {
            trace!("progress queue full, dropping {:?}", event);
        }
    }

    /// Signals the end of the request (success or failure), waits for the
    /// final waterfall to be printed, and stops the render task.
    pub async fn complete(&mut self) {
        if let Some(complete) = self.complete.take() {
            let _ = complete.send(());
        }
        self.events = None;
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

async fn run(mut events: mpsc::Receiver<PhaseEvent>, mut complete: oneshot::Receiver<()>) {
    let mut state = PhaseState::new(Instant::now());
    let bar = ProgressBar::new(100);
    if let Ok(style) = ProgressStyle::with_template("{msg} [{wide_bar:.cyan/blue}] {pos:>3}/100")
    {
        bar.set_style(style.progress_chars("#>-"));
    }

    let mut drawn = 0usize;
    let mut events_open = true;
    let mut ticker = tokio::time::interval(TICK_INTERVAL);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            biased;
            done = &mut complete => {
                // Producers never block, so events published just before the
                // completion signal may still sit in the queue; apply them
                // before the summary.
                while let Ok(event) = events.try_recv() {
                    state.apply(event, Instant::now());
                }
                bar.finish_and_clear();
                // A dropped (never-signalled) handle stops the loop without
                // printing a summary; only an explicit complete finalizes.
                if done.is_ok() {
                    finalize(&state, &mut drawn);
                }
                break;
            }
            event = events.recv(), if events_open => {
                match event {
                    Some(event) => {
                        state.apply(event, Instant::now());
                        redraw(&state, &bar, &mut drawn);
                    }
                    None => events_open = false,
                }
            }
            _ = ticker.tick() => {
                redraw(&state, &bar, &mut drawn);
            }
        }
    }
}

fn redraw(state: &PhaseState, bar: &ProgressBar, drawn: &mut usize) {
    let now = Instant::now();
    bar.set_message(render::bar_description(state));
    bar.set_position(state.progress_percent(now));

    let lines = render::live_lines(state, now);
    if lines.is_empty() && *drawn == 0 {
        return;
    }
    let mut frame = render::erase_lines(*drawn);
    for line in &lines {
        frame.push_str(line);
        frame.push('\n');
    }
    print_frame(&frame);
    *drawn = lines.len();
}

fn finalize(state: &PhaseState, drawn: &mut usize) {
    let mut frame = render::erase_lines(*drawn);
    if state.started_count() > 0 {
        for line in render::summary_lines(state) {
            frame.push_str(&line);
            frame.push('\n');
        }
    }
    print_frame(&frame);
    *drawn = 0;
}

// Display defects must never fail the request; write errors are dropped.
fn print_frame(frame: &str) {
    if frame.is_empty() {
        return;
    }
    let mut stdout = io::stdout().lock();
    let _ = stdout.write_all(frame.as_bytes());
    let _ = stdout.flush();
}
