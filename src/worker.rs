//! Background upscale jobs
//!
//! [`spawn`] runs [`upscale`] on a dedicated thread. The caller receives
//! zero or more [`JobEvent::Progress`] events followed by exactly one
//! terminal event, in the order they were produced.

use std::sync::mpsc::{self, Receiver};
use std::thread::{self, JoinHandle};

use crate::config::UpscaleConfig;
use crate::error::UpscaleError;
use crate::pipeline::{upscale, UpscaleOutput, UpscaleRequest};
use crate::progress::{ChannelProgress, ProgressUpdate};

/// Message sent from a running job.
#[derive(Debug, Clone, PartialEq)]
pub enum JobEvent {
    Progress(ProgressUpdate),
    Completed(UpscaleOutput),
    Failed(UpscaleError),
}

impl JobEvent {
    /// Whether this event ends the job.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, JobEvent::Progress(_))
    }
}

impl From<ProgressUpdate> for JobEvent {
    fn from(update: ProgressUpdate) -> Self {
        JobEvent::Progress(update)
    }
}

/// Handle to a running job.
#[derive(Debug)]
pub struct JobHandle {
    events: Receiver<JobEvent>,
    thread: Option<JoinHandle<()>>,
}

/// Start an upscale job on a new thread.
pub fn spawn(request: UpscaleRequest, config: UpscaleConfig) -> JobHandle {
    let (tx, rx) = mpsc::channel();
    let thread = thread::spawn(move || {
        let sink = ChannelProgress::new(tx.clone());
        let event = match upscale(&request, &config, &sink) {
            Ok(output) => JobEvent::Completed(output),
            Err(e) => {
                tracing::warn!(error = %e, "upscale job failed");
                JobEvent::Failed(e)
            }
        };
        let _ = tx.send(event);
    });

    JobHandle { events: rx, thread: Some(thread) }
}

impl JobHandle {
    /// Receiver of the job's events, for callers that poll.
    pub fn events(&self) -> &Receiver<JobEvent> {
        &self.events
    }

    /// Block until the job ends, passing every progress update to `on_progress`.
    ///
    /// Returns the terminal outcome: the output, or the error the pipeline
    /// failed with. A worker that exits without a terminal event (a panic
    /// inside a stage) yields [`UpscaleError::Worker`].
    pub fn wait(mut self, mut on_progress: impl FnMut(ProgressUpdate)) -> Result<UpscaleOutput, UpscaleError> {
        let outcome = loop {
            match self.events.recv() {
                Ok(JobEvent::Progress(update)) => on_progress(update),
                Ok(JobEvent::Completed(output)) => break Ok(output),
                Ok(JobEvent::Failed(err)) => break Err(err),
                Err(_) => break Err(UpscaleError::Worker("worker exited without a result".to_string())),
            }
        };

        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() && outcome.is_ok() {
                return Err(UpscaleError::Worker("worker thread panicked".to_string()));
            }
        }
        outcome
    }
}
