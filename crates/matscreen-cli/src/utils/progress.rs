use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use matscreen::engine::progress::{Progress, ProgressCallback};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::warn;

const SPINNER_TICK_MS: u64 = 80;

/// Bar plus the bookkeeping shown next to it for the current phase.
struct RunDisplay {
    bar: ProgressBar,
    phase: &'static str,
    skipped: usize,
}

impl RunDisplay {
    fn apply(&mut self, progress: Progress) {
        match progress {
            Progress::PhaseStart { name } => {
                self.phase = name;
                self.skipped = 0;
                self.bar.reset();
                self.bar.set_length(0);
                self.bar.set_style(spinner_style());
                self.bar.set_prefix(name);
                self.bar.set_message("");
                self.bar
                    .enable_steady_tick(Duration::from_millis(SPINNER_TICK_MS));
            }
            Progress::TaskStart { total_steps } => {
                self.bar.disable_steady_tick();
                self.bar.set_length(total_steps);
                self.bar.set_position(0);
                self.bar.set_style(rows_style());
            }
            Progress::TaskIncrement => self.bar.inc(1),
            Progress::Item(label) => self.bar.set_message(label),
            Progress::RowSkipped { row, reason } => {
                self.skipped += 1;
                self.bar
                    .println(format!("  ⚠ {} row {} skipped: {}", self.phase, row, reason));
            }
            Progress::TaskFinish => {
                let length = self.bar.length().unwrap_or(0);
                self.bar.set_position(length);
            }
            Progress::PhaseFinish => {
                self.bar.disable_steady_tick();
                let summary = match self.skipped {
                    0 => format!("✓ {}", self.phase),
                    n => format!("✓ {} ({} row(s) skipped)", self.phase, n),
                };
                self.bar.set_prefix("");
                self.bar.finish_with_message(summary);
            }
        }
    }
}

fn spinner_style() -> ProgressStyle {
    ProgressStyle::with_template("{spinner:.green} {prefix} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
}

fn rows_style() -> ProgressStyle {
    ProgressStyle::with_template("{prefix:<12} [{bar:40.cyan/blue}] {pos}/{len} rows {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("##-")
}

/// Renders screening and generation progress on stderr.
#[derive(Clone)]
pub struct CliProgressHandler {
    display: Arc<Mutex<RunDisplay>>,
}

impl CliProgressHandler {
    pub fn new() -> Self {
        let bar = ProgressBar::new(0).with_style(spinner_style());
        bar.set_draw_target(ProgressDrawTarget::stderr());
        bar.finish_and_clear();

        Self {
            display: Arc::new(Mutex::new(RunDisplay {
                bar,
                phase: "",
                skipped: 0,
            })),
        }
    }

    pub fn get_callback(&self) -> ProgressCallback<'static> {
        let display = self.display.clone();

        Box::new(move |progress: Progress| {
            let Ok(mut display) = display.lock() else {
                warn!("Progress display mutex was poisoned. Cannot update progress.");
                return;
            };
            display.apply(progress);
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn handler_initializes_in_a_clean_state() {
        let handler = CliProgressHandler::new();
        let display = handler.display.lock().unwrap();
        assert_eq!(display.bar.length(), Some(0));
        assert!(display.bar.is_finished());
        assert_eq!(display.skipped, 0);
    }

    #[test]
    fn screening_phase_counts_skipped_rows() {
        let handler = CliProgressHandler::new();
        let callback = handler.get_callback();

        callback(Progress::PhaseStart { name: "Screening" });
        callback(Progress::TaskStart { total_steps: 4 });
        callback(Progress::TaskIncrement);
        callback(Progress::RowSkipped {
            row: 2,
            reason: "Unknown element symbol 'Xx'".to_string(),
        });
        callback(Progress::TaskIncrement);
        {
            let display = handler.display.lock().unwrap();
            assert_eq!(display.phase, "Screening");
            assert_eq!(display.skipped, 1);
            assert_eq!(display.bar.length(), Some(4));
            assert_eq!(display.bar.position(), 2);
        }

        callback(Progress::TaskFinish);
        callback(Progress::PhaseFinish);
        let display = handler.display.lock().unwrap();
        assert!(display.bar.is_finished());
        assert_eq!(display.bar.position(), 4);
        assert_eq!(display.bar.message(), "✓ Screening (1 row(s) skipped)");
    }

    #[test]
    fn new_phase_resets_skip_count_and_shows_current_seed() {
        let handler = CliProgressHandler::new();
        let callback = handler.get_callback();

        callback(Progress::PhaseStart { name: "Loading" });
        callback(Progress::RowSkipped {
            row: 1,
            reason: "bad".to_string(),
        });
        callback(Progress::PhaseFinish);

        callback(Progress::PhaseStart { name: "Generating" });
        callback(Progress::TaskStart { total_steps: 2 });
        callback(Progress::Item("CsPbI3".to_string()));
        {
            let display = handler.display.lock().unwrap();
            assert_eq!(display.skipped, 0);
            assert_eq!(display.bar.message(), "CsPbI3");
        }
        callback(Progress::PhaseFinish);
        assert_eq!(handler.display.lock().unwrap().bar.message(), "✓ Generating");
    }

    #[test]
    fn callback_is_thread_safe() {
        let handler = CliProgressHandler::new();
        let callback = handler.get_callback();

        thread::spawn(move || {
            callback(Progress::PhaseStart { name: "Generating" });
            callback(Progress::TaskIncrement);
            callback(Progress::PhaseFinish);
        })
        .join()
        .unwrap();

        let display = handler.display.lock().unwrap();
        assert!(display.bar.is_finished());
        assert_eq!(display.bar.message(), "✓ Generating");
    }
}
