//! Spinner-backed progress reporting

use crate::progress::{ProgressReporter, Stage, StageStatus};
use cliclack::ProgressBar;

/// Renders pipeline events as one cliclack spinner per stage.
///
/// Warnings raised while a spinner is running are held back and printed once
/// it stops, so they don't tear the spinner line.
#[derive(Default)]
pub struct SpinnerReporter {
    active: Option<(Stage, ProgressBar)>,
    pending: Vec<String>,
}

impl SpinnerReporter {
    pub fn new() -> Self {
        Self::default()
    }

    fn flush_pending(&mut self) {
        for warning in self.pending.drain(..) {
            let _ = cliclack::log::warning(warning);
        }
    }

    fn finish(&mut self, stage: Stage, status: &StageStatus) -> bool {
        let Some((active_stage, spinner)) = self.active.take() else {
            return false;
        };
        if active_stage != stage {
            spinner.stop(format!("{}", active_stage));
        }
        match status {
            StageStatus::Succeeded(msg) => spinner.stop(msg),
            StageStatus::Failed(msg) => spinner.error(msg),
            StageStatus::Skipped(msg) => spinner.stop(format!("{} (skipped: {})", stage, msg)),
            StageStatus::Started | StageStatus::Warning(_) => {}
        }
        self.flush_pending();
        true
    }
}

impl ProgressReporter for SpinnerReporter {
    fn report(&mut self, stage: Stage, status: StageStatus) {
        match status {
            StageStatus::Started => {
                if let Some((previous, spinner)) = self.active.take() {
                    spinner.stop(format!("{}", previous));
                    self.flush_pending();
                }
                let spinner = cliclack::spinner();
                spinner.start(format!("{}...", stage));
                self.active = Some((stage, spinner));
            }
            StageStatus::Warning(msg) => {
                if self.active.is_some() {
                    self.pending.push(msg);
                } else {
                    let _ = cliclack::log::warning(msg);
                }
            }
            ref done => {
                if !self.finish(stage, done) {
                    let _ = match done {
                        StageStatus::Succeeded(msg) => cliclack::log::success(msg),
                        StageStatus::Failed(msg) => cliclack::log::error(msg),
                        StageStatus::Skipped(msg) => {
                            cliclack::log::info(format!("{} skipped: {}", stage, msg))
                        }
                        StageStatus::Started | StageStatus::Warning(_) => Ok(()),
                    };
                }
            }
        }
    }
}
