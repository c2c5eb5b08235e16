use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use nanorelax::engine::progress::{Progress, ProgressCallback};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::warn;

const SPINNER_TICK_MS: u64 = 100;

/// Running view of the total system force over a relaxation.
#[derive(Debug, Clone, Copy, PartialEq)]
struct ForceTrack {
    last: f64,
    best: f64,
    falling: bool,
}

impl ForceTrack {
    fn new(force: f64) -> Self {
        Self {
            last: force,
            best: force,
            falling: false,
        }
    }

    fn record(&mut self, force: f64) {
        self.falling = force < self.last;
        self.last = force;
        self.best = self.best.min(force);
    }

    fn summary(&self) -> String {
        let arrow = if self.falling { '↓' } else { '↑' };
        format!(
            "F {:.3e} {} (best {:.3e})",
            self.last, arrow, self.best
        )
    }
}

struct RelaxBar {
    bar: ProgressBar,
    phase: usize,
    force: Option<ForceTrack>,
    notices: usize,
}

impl RelaxBar {
    fn handle(&mut self, progress: Progress) {
        match progress {
            Progress::PhaseStart { name } => {
                self.phase += 1;
                self.bar.reset();
                self.bar.set_length(0);
                self.bar.set_style(phase_style());
                self.bar.set_prefix(format!("[{}]", self.phase));
                self.bar
                    .enable_steady_tick(Duration::from_millis(SPINNER_TICK_MS));
                self.bar.set_message(name.to_string());
            }
            Progress::PhaseFinish => {
                self.bar.disable_steady_tick();
                let mut message = match &self.force {
                    Some(track) => format!("✓ {}", track.summary()),
                    None => "✓ Done".to_string(),
                };
                if self.notices > 0 {
                    message.push_str(&format!(", {} notice(s)", self.notices));
                }
                self.bar.finish_with_message(message);
            }
            Progress::TaskStart { total_steps } => {
                self.bar.disable_steady_tick();
                self.bar.reset();
                self.bar.set_length(total_steps);
                self.bar.set_position(0);
                self.bar.set_style(relax_style());
                self.force = None;
                self.notices = 0;
            }
            Progress::StepCompleted { step, total_force } => {
                let track = self
                    .force
                    .get_or_insert_with(|| ForceTrack::new(total_force));
                track.record(total_force);
                self.bar.set_position(step);
                self.bar.set_message(track.summary());
            }
            Progress::TaskFinish => {
                // An early stop leaves the bar where the simulation ended.
                let early = self.bar.position() < self.bar.length().unwrap_or(0);
                let summary = self
                    .force
                    .map(|track| track.summary())
                    .unwrap_or_default();
                if early {
                    self.bar.abandon_with_message(format!("stopped early, {summary}"));
                } else {
                    self.bar.finish_with_message(summary);
                }
            }
            Progress::Message(text) => {
                self.notices += 1;
                if self.bar.is_finished() {
                    self.bar.set_message(text);
                } else {
                    self.bar.println(format!("  • {text}"));
                }
            }
        }
    }
}

fn phase_style() -> ProgressStyle {
    ProgressStyle::with_template("{prefix:.bold.dim} {spinner:.yellow} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
}

fn relax_style() -> ProgressStyle {
    ProgressStyle::with_template(
        "{prefix:.bold.dim} relaxing [{bar:32.green/white}] {pos:>6}/{len} steps  {msg}",
    )
    .unwrap_or_else(|_| ProgressStyle::default_bar())
    .progress_chars("=> ")
}

/// Terminal progress display for the relax and cluster workflows.
#[derive(Clone)]
pub struct CliProgressHandler {
    state: Arc<Mutex<RelaxBar>>,
}

impl CliProgressHandler {
    pub fn new() -> Self {
        let bar = ProgressBar::with_draw_target(Some(0), ProgressDrawTarget::stderr())
            .with_style(phase_style());
        bar.finish_and_clear();

        Self {
            state: Arc::new(Mutex::new(RelaxBar {
                bar,
                phase: 0,
                force: None,
                notices: 0,
            })),
        }
    }

    pub fn get_callback(&self) -> ProgressCallback<'static> {
        let state = self.state.clone();

        Box::new(move |progress: Progress| {
            let Ok(mut state) = state.lock() else {
                warn!("Progress display mutex was poisoned. Cannot update progress.");
                return;
            };
            state.handle(progress);
        })
    }
}

impl Default for CliProgressHandler {
    fn default() -> Self {
        Self::new()
    }
}
