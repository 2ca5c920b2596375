use crate::core::catalog::Rank;

/// Events emitted while a workflow walks the ranks of a pose group.
#[derive(Debug, Clone, PartialEq)]
pub enum Progress {
    PhaseStart { name: &'static str },
    PhaseFinish,

    /// A per-rank loop begins; one increment follows per rank.
    TaskStart { total_steps: u64 },
    TaskIncrement,
    TaskFinish,

    RankDone { rank: Rank },

    Message(String),
}

pub type ProgressCallback<'a> = Box<dyn Fn(Progress) + Send + Sync + 'a>;

/// Forwards progress events to an optional callback; silent without one.
#[derive(Default)]
pub struct ProgressReporter<'a> {
    callback: Option<ProgressCallback<'a>>,
}

impl<'a> ProgressReporter<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_callback(callback: ProgressCallback<'a>) -> Self {
        Self {
            callback: Some(callback),
        }
    }

    #[inline]
    pub fn report(&self, event: Progress) {
        if let Some(cb) = &self.callback {
            cb(event);
        }
    }

    /// Reports a phase start and a task sized to `steps`.
    pub fn begin(&self, name: &'static str, steps: usize) {
        self.report(Progress::PhaseStart { name });
        self.report(Progress::TaskStart {
            total_steps: steps as u64,
        });
    }

    pub fn step(&self, rank: Rank) {
        self.report(Progress::RankDone { rank });
        self.report(Progress::TaskIncrement);
    }

    pub fn end(&self) {
        self.report(Progress::TaskFinish);
        self.report(Progress::PhaseFinish);
    }
}

impl std::fmt::Debug for ProgressReporter<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressReporter")
            .field("callback", &self.callback.as_ref().map(|_| "<callback>"))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn reporter_without_callback_is_silent() {
        let reporter = ProgressReporter::new();
        reporter.begin("Relax", 2);
        reporter.end();
    }

    #[test]
    fn begin_step_end_emit_events_in_order() {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        let reporter = ProgressReporter::with_callback(Box::new(move |e| sink.lock().unwrap().push(e)));
        reporter.begin("Relax", 1);
        reporter.step(4);
        reporter.end();
        assert_eq!(
            *events.lock().unwrap(),
            vec![
                Progress::PhaseStart { name: "Relax" },
                Progress::TaskStart { total_steps: 1 },
                Progress::RankDone { rank: 4 },
                Progress::TaskIncrement,
                Progress::TaskFinish,
                Progress::PhaseFinish,
            ]
        );
    }
}
