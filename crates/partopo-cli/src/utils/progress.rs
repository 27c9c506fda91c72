use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use partopo::engine::progress::{Progress, ProgressCallback};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::warn;

const SPINNER_TICK_MS: u64 = 80;

struct BarState {
    pb: ProgressBar,
    phase: Option<&'static str>,
}

/// Renders engine progress events as a spinner per phase and a bar per
/// counted task on stderr.
#[derive(Clone)]
pub struct CliProgressHandler {
    state: Arc<Mutex<BarState>>,
}

impl CliProgressHandler {
    pub fn new() -> Self {
        Self::with_draw_target(ProgressDrawTarget::stderr())
    }

    #[cfg(test)]
    pub fn hidden() -> Self {
        Self::with_draw_target(ProgressDrawTarget::hidden())
    }

    fn with_draw_target(target: ProgressDrawTarget) -> Self {
        let pb = ProgressBar::with_draw_target(Some(0), target).with_style(Self::spinner_style());
        pb.finish_and_clear();
        Self {
            state: Arc::new(Mutex::new(BarState { pb, phase: None })),
        }
    }

    pub fn get_callback(&self) -> ProgressCallback<'static> {
        let state = self.state.clone();

        Box::new(move |progress: Progress| {
            let Ok(mut state) = state.lock() else {
                warn!("Progress bar mutex was poisoned. Cannot update progress.");
                return;
            };
            Self::apply(&mut state, progress);
        })
    }

    fn apply(state: &mut BarState, progress: Progress) {
        let pb = &state.pb;
        match progress {
            Progress::PhaseStart { name } => {
                pb.reset();
                pb.set_length(0);
                pb.set_style(Self::spinner_style());
                pb.enable_steady_tick(Duration::from_millis(SPINNER_TICK_MS));
                pb.set_message(name);
                state.phase = Some(name);
            }
            Progress::PhaseFinish => {
                pb.disable_steady_tick();
                let name = state.phase.take().unwrap_or("Done");
                pb.finish_with_message(format!("✓ {}", name));
            }
            Progress::TaskStart { total_steps } => {
                pb.disable_steady_tick();
                pb.reset();
                pb.set_length(total_steps);
                pb.set_position(0);
                pb.set_style(Self::bar_style());
            }
            Progress::TaskIncrement => pb.inc(1),
            Progress::TaskFinish => {
                let length = pb.length().unwrap_or(0);
                if pb.position() < length {
                    pb.set_position(length);
                }
            }
            Progress::Message(msg) => {
                if pb.is_finished() {
                    pb.set_message(msg);
                } else {
                    pb.println(format!("  {}", msg));
                }
            }
        }
    }

    fn spinner_style() -> ProgressStyle {
        ProgressStyle::with_template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
    }

    fn bar_style() -> ProgressStyle {
        ProgressStyle::with_template("{msg:<24} [{bar:40.cyan/blue}] {pos}/{len}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("##-")
    }
}

impl Default for CliProgressHandler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn bar(handler: &CliProgressHandler) -> ProgressBar {
        handler.state.lock().unwrap().pb.clone()
    }

    #[test]
    fn handler_initializes_in_a_clean_state() {
        let handler = CliProgressHandler::hidden();
        let pb = bar(&handler);
        assert_eq!(pb.length(), Some(0));
        assert!(pb.is_finished());
    }

    #[test]
    fn callback_tracks_phase_and_task() {
        let handler = CliProgressHandler::hidden();
        let callback = handler.get_callback();

        callback(Progress::PhaseStart {
            name: "Merging bonds",
        });
        assert_eq!(bar(&handler).message(), "Merging bonds");
        assert!(!bar(&handler).is_finished());

        callback(Progress::TaskStart { total_steps: 10 });
        assert_eq!(bar(&handler).length(), Some(10));
        assert_eq!(bar(&handler).position(), 0);

        callback(Progress::TaskIncrement);
        assert_eq!(bar(&handler).position(), 1);

        callback(Progress::TaskFinish);
        assert_eq!(bar(&handler).position(), 10);

        callback(Progress::PhaseFinish);
        let pb = bar(&handler);
        assert!(pb.is_finished());
        assert_eq!(pb.message(), "✓ Merging bonds");
    }

    #[test]
    fn message_after_finish_replaces_status_line() {
        let handler = CliProgressHandler::hidden();
        let callback = handler.get_callback();

        callback(Progress::Message("Appended 2 of 3 candidate bonds.".to_string()));
        assert_eq!(bar(&handler).message(), "Appended 2 of 3 candidate bonds.");
    }

    #[test]
    fn callback_is_thread_safe() {
        let handler = CliProgressHandler::hidden();
        let callback = handler.get_callback();

        thread::spawn(move || {
            callback(Progress::PhaseStart {
                name: "Sorting particles",
            });
            callback(Progress::TaskIncrement);
            callback(Progress::PhaseFinish);
        })
        .join()
        .unwrap();

        let pb = bar(&handler);
        assert!(pb.is_finished());
        assert_eq!(pb.message(), "✓ Sorting particles");
    }

    #[test]
    fn dataset_merge_drives_task_bar() {
        use crate::snapshot::fixtures;
        use partopo::core::models::topology::Bond;
        use partopo::engine::appearance::StandardAppearance;
        use partopo::engine::config::MergeOptions;
        use partopo::engine::progress::ProgressReporter;

        let handler = CliProgressHandler::hidden();
        let reporter = ProgressReporter::with_callback(handler.get_callback());
        let mut dataset = fixtures::chain(4);

        dataset
            .merge_bonds(
                &[Bond::new(0, 3), Bond::new(1, 0), Bond::new(3, 0)],
                &[],
                &MergeOptions::default(),
                &StandardAppearance::default(),
                &reporter,
            )
            .unwrap();

        let pb = bar(&handler);
        assert_eq!(pb.length(), Some(3));
        assert_eq!(pb.position(), 3);
        assert!(pb.is_finished());
        assert_eq!(pb.message(), "✓ Merging bonds");
    }
}
