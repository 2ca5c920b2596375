use foldpost::core::catalog::Rank;
use foldpost::engine::progress::{Progress, ProgressCallback};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::warn;

const SPINNER_TICK_MS: u64 = 80;

struct PhaseBar {
    bar: ProgressBar,
    phase: &'static str,
}

impl PhaseBar {
    fn start(&mut self, phase: &'static str) {
        self.phase = phase;
        self.bar.reset();
        self.bar.set_length(0);
        self.bar.set_style(spinner_style());
        self.bar.enable_steady_tick(Duration::from_millis(SPINNER_TICK_MS));
        self.bar.set_message(phase);
    }

    fn size(&mut self, ranks: u64) {
        self.bar.disable_steady_tick();
        self.bar.set_length(ranks);
        self.bar.set_position(0);
        self.bar.set_style(bar_style());
    }

    fn rank_done(&mut self, rank: Rank) {
        self.bar.set_message(format!("{} (rank {rank})", self.phase));
    }

    fn complete(&mut self) {
        let length = self.bar.length().unwrap_or(0);
        self.bar.set_position(length);
        self.bar.set_message(self.phase);
    }

    fn finish(&mut self) {
        self.bar.disable_steady_tick();
        self.bar.finish_with_message(format!("✓ {}", self.phase));
    }

    fn note(&self, message: String) {
        if self.bar.is_finished() {
            self.bar.set_message(message);
        } else {
            self.bar.println(format!("  {message}"));
        }
    }
}

/// Renders workflow progress as one spinner per phase that turns into a rank bar.
#[derive(Clone)]
pub struct CliProgressHandler {
    state: Arc<Mutex<PhaseBar>>,
}

impl CliProgressHandler {
    pub fn new() -> Self {
        Self::with_draw_target(ProgressDrawTarget::stderr())
    }

    fn with_draw_target(target: ProgressDrawTarget) -> Self {
        let bar = ProgressBar::new(0).with_style(spinner_style());
        bar.set_draw_target(target);
        bar.finish_and_clear();
        Self {
            state: Arc::new(Mutex::new(PhaseBar { bar, phase: "" })),
        }
    }

    pub fn get_callback(&self) -> ProgressCallback<'static> {
        let state = self.state.clone();

        Box::new(move |progress: Progress| {
            let Ok(mut phase_bar) = state.lock() else {
                warn!("Progress bar mutex was poisoned. Cannot update progress.");
                return;
            };

            match progress {
                Progress::PhaseStart { name } => phase_bar.start(name),
                Progress::TaskStart { total_steps } => phase_bar.size(total_steps),
                Progress::RankDone { rank } => phase_bar.rank_done(rank),
                Progress::TaskIncrement => phase_bar.bar.inc(1),
                Progress::TaskFinish => phase_bar.complete(),
                Progress::PhaseFinish => phase_bar.finish(),
                Progress::Message(msg) => phase_bar.note(msg),
            }
        })
    }
}

impl Default for CliProgressHandler {
    fn default() -> Self {
        Self::new()
    }
}

fn spinner_style() -> ProgressStyle {
    ProgressStyle::with_template("{spinner:.green} {msg}")
        .expect("Failed to create spinner style template")
}

fn bar_style() -> ProgressStyle {
    ProgressStyle::with_template("{msg:<28} [{bar:40.cyan/blue}] {pos}/{len} ranks ({elapsed})")
        .expect("Failed to create bar style template")
        .progress_chars("##-")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn hidden_handler() -> CliProgressHandler {
        CliProgressHandler::with_draw_target(ProgressDrawTarget::hidden())
    }

    fn snapshot(handler: &CliProgressHandler) -> (String, u64, Option<u64>, bool) {
        let state = handler.state.lock().unwrap();
        (
            state.bar.message(),
            state.bar.position(),
            state.bar.length(),
            state.bar.is_finished(),
        )
    }

    #[test]
    fn handler_starts_finished_and_empty() {
        let (_, position, length, finished) = snapshot(&hidden_handler());
        assert_eq!((position, length, finished), (0, Some(0), true));
    }

    #[test]
    fn callback_follows_a_rank_walk() {
        let handler = hidden_handler();
        let callback = handler.get_callback();

        callback(Progress::PhaseStart { name: "Relax" });
        assert_eq!(snapshot(&handler).0, "Relax");

        callback(Progress::TaskStart { total_steps: 3 });
        assert_eq!(snapshot(&handler).2, Some(3));

        callback(Progress::RankDone { rank: 2 });
        callback(Progress::TaskIncrement);
        let (message, position, _, _) = snapshot(&handler);
        assert_eq!(message, "Relax (rank 2)");
        assert_eq!(position, 1);

        callback(Progress::TaskFinish);
        let (message, position, _, _) = snapshot(&handler);
        assert_eq!((message.as_str(), position), ("Relax", 3));

        callback(Progress::PhaseFinish);
        let (message, _, _, finished) = snapshot(&handler);
        assert_eq!(message, "✓ Relax");
        assert!(finished);
    }

    #[test]
    fn callback_can_run_on_another_thread() {
        let handler = hidden_handler();
        let callback = handler.get_callback();

        thread::spawn(move || {
            callback(Progress::PhaseStart { name: "Constrain" });
            callback(Progress::TaskIncrement);
            callback(Progress::PhaseFinish);
        })
        .join()
        .unwrap();

        assert_eq!(snapshot(&handler).0, "✓ Constrain");
    }
}
