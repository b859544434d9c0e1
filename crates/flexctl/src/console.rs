//! Terminal rendering of lifecycle progress
//!
//! Step lines go to stdout in human mode and to stderr when stdout carries
//! a JSON/YAML document. Long-running operations get a spinner on stderr.

use colored::Colorize;
use flexctl_core::lifecycle::{CleanupOutcome, LifecycleHooks, LoggingHooks, Step, StepOutcome};
use flexctl_core::{CoreError, ProgressCallback, ProgressEvent};
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

/// Prints one line per step and mirrors every event to the log
pub struct ConsoleHooks {
    to_stderr: bool,
    log: LoggingHooks,
}

impl ConsoleHooks {
    pub fn new(to_stderr: bool) -> Self {
        Self {
            to_stderr,
            log: LoggingHooks,
        }
    }

    fn line(&self, text: &str) {
        if self.to_stderr {
            eprintln!("{}", text);
        } else {
            println!("{}", text);
        }
    }
}

impl LifecycleHooks for ConsoleHooks {
    fn on_step_start(&self, step: Step) {
        self.log.on_step_start(step);
    }

    fn on_step_complete(&self, step: Step, outcome: &StepOutcome) {
        self.log.on_step_complete(step, outcome);
        self.line(&outcome.summary());
    }

    fn on_step_failed(&self, step: Step, error: &CoreError) {
        self.log.on_step_failed(step, error);
        eprintln!(
            "{} step {} ({}) failed: {}",
            "✗".red().bold(),
            step.number(),
            step,
            error
        );
    }

    fn on_cleanup(&self, resource_group: &str, outcome: &CleanupOutcome) {
        self.log.on_cleanup(resource_group, outcome);
        match outcome {
            CleanupOutcome::Deleted => {
                eprintln!(
                    "{} resource group {} deleted after failure",
                    "✓".green().bold(),
                    resource_group
                );
            }
            CleanupOutcome::Failed(e) => {
                eprintln!(
                    "{} could not delete resource group {}: {}",
                    "✗".red().bold(),
                    resource_group,
                    e
                );
            }
        }
    }
}

fn spinner_style() -> ProgressStyle {
    ProgressStyle::default_spinner()
        .template("{spinner:.green} {msg} [{elapsed_precise}]")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
}

/// Progress callback that shows one spinner per long-running operation
pub fn spinner_callback() -> ProgressCallback {
    let current: Arc<Mutex<Option<ProgressBar>>> = Arc::default();

    Box::new(move |event: ProgressEvent| {
        let mut slot = current.lock().unwrap_or_else(PoisonError::into_inner);
        match &event {
            ProgressEvent::Started { operation } => {
                let pb = ProgressBar::new_spinner();
                pb.set_style(spinner_style());
                pb.enable_steady_tick(Duration::from_millis(120));
                pb.set_message(format!("Waiting for {}", operation));
                *slot = Some(pb);
            }
            ProgressEvent::Polling {
                operation, status, ..
            } => {
                if let Some(pb) = slot.as_ref() {
                    pb.set_message(format!("{}: {}", operation, status));
                }
            }
            ProgressEvent::Completed { .. } | ProgressEvent::Failed { .. } => {
                if let Some(pb) = slot.take() {
                    pb.finish_and_clear();
                }
            }
        }
    })
}
