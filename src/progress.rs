//! Upscale progress reporting.
//!
//! The pipeline reports fractional progress through a [`ProgressSink`].
//! Sinks are fire-and-forget: they never influence the run and never fail it.
//!
//! # Example
//!
//! ```
//! use finescale::progress::{ProgressSink, ProgressUpdate, RecordingProgress};
//!
//! let sink = RecordingProgress::new();
//! sink.report(ProgressUpdate::new(5.0, Some("Running adaptive denoise…")));
//! sink.report(ProgressUpdate::new(100.0, Some("Done.")));
//! assert_eq!(sink.percents(), vec![5.0, 100.0]);
//! ```

use std::cell::Cell;
use std::io::Write;
use std::sync::mpsc::Sender;
use std::sync::Mutex;

use serde::Serialize;

/// One progress notification.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ProgressUpdate {
    /// Completion in percent, within `[0, 100]`
    #[serde(rename = "value")]
    pub percent: f32,
    /// Human-readable stage label
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<&'static str>,
}

impl ProgressUpdate {
    /// Create an update, clamping `percent` into `[0, 100]`.
    pub fn new(percent: f32, label: Option<&'static str>) -> Self {
        Self { percent: percent.clamp(0.0, 100.0), label }
    }
}

/// Receiver of progress notifications.
pub trait ProgressSink: Send + Sync {
    /// Report a progress update.
    fn report(&self, update: ProgressUpdate);
}

/// A progress sink that discards all updates.
#[derive(Debug, Default)]
pub struct NullProgress;

impl NullProgress {
    /// Create a new null progress sink.
    pub fn new() -> Self {
        Self
    }
}

impl ProgressSink for NullProgress {
    fn report(&self, _update: ProgressUpdate) {}
}

/// Console progress sink with optional colors.
///
/// Prints one line per whole-percent step or label change.
pub struct ConsoleProgress {
    /// Whether to use colors
    use_colors: bool,
    /// Last printed (whole percent, label)
    last: Mutex<Option<(u32, Option<&'static str>)>>,
    /// Output writer (for testing)
    output: Mutex<Box<dyn Write + Send>>,
}

impl std::fmt::Debug for ConsoleProgress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConsoleProgress").field("use_colors", &self.use_colors).finish()
    }
}

impl ConsoleProgress {
    /// Create a console progress sink writing to stderr.
    pub fn new() -> Self {
        Self {
            use_colors: true,
            last: Mutex::new(None),
            output: Mutex::new(Box::new(std::io::stderr())),
        }
    }

    /// Create a console progress sink that writes to a custom output.
    pub fn with_output<W: Write + Send + 'static>(output: W) -> Self {
        Self {
            use_colors: false,
            last: Mutex::new(None),
            output: Mutex::new(Box::new(output)),
        }
    }

    /// Set whether to use colors.
    pub fn with_colors(mut self, use_colors: bool) -> Self {
        self.use_colors = use_colors;
        self
    }

    fn cyan(&self, text: &str) -> String {
        if self.use_colors {
            format!("\x1b[36m{}\x1b[0m", text)
        } else {
            text.to_string()
        }
    }

    fn writeln(&self, line: &str) {
        if let Ok(mut output) = self.output.lock() {
            let _ = writeln!(output, "{}", line);
        }
    }
}

impl Default for ConsoleProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressSink for ConsoleProgress {
    fn report(&self, update: ProgressUpdate) {
        let whole = update.percent.floor() as u32;
        {
            let Ok(mut last) = self.last.lock() else {
                return;
            };
            if *last == Some((whole, update.label)) {
                return;
            }
            *last = Some((whole, update.label));
        }

        let line = format!(
            "{} {} {:>3}%{}",
            self.cyan("[upscale]"),
            render_bar(update.percent, 20),
            whole,
            update.label.map(|l| format!(" {}", l)).unwrap_or_default()
        );
        self.writeln(&line);
    }
}

/// JSON-lines progress sink for machine-readable output.
///
/// Each update becomes `{"event":"progress","value":<percent>,"label":<label>}`.
pub struct JsonProgress {
    output: Mutex<Box<dyn Write + Send>>,
}

impl std::fmt::Debug for JsonProgress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonProgress").finish()
    }
}

#[derive(Serialize)]
struct JsonEvent<'a> {
    event: &'static str,
    #[serde(flatten)]
    update: &'a ProgressUpdate,
}

impl JsonProgress {
    /// Create a JSON progress sink writing to stderr.
    pub fn new() -> Self {
        Self { output: Mutex::new(Box::new(std::io::stderr())) }
    }

    /// Create a JSON progress sink that writes to a custom output.
    pub fn with_output<W: Write + Send + 'static>(output: W) -> Self {
        Self { output: Mutex::new(Box::new(output)) }
    }
}

impl Default for JsonProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressSink for JsonProgress {
    fn report(&self, update: ProgressUpdate) {
        let event = JsonEvent { event: "progress", update: &update };
        let Ok(json) = serde_json::to_string(&event) else {
            return;
        };
        if let Ok(mut output) = self.output.lock() {
            let _ = writeln!(output, "{}", json);
        }
    }
}

/// Progress sink forwarding updates over an mpsc channel.
///
/// Send failures (receiver dropped) are ignored.
pub struct ChannelProgress<T> {
    sender: Mutex<Sender<T>>,
}

impl<T> ChannelProgress<T> {
    /// Wrap a channel sender.
    pub fn new(sender: Sender<T>) -> Self {
        Self { sender: Mutex::new(sender) }
    }
}

impl<T> ProgressSink for ChannelProgress<T>
where
    T: From<ProgressUpdate> + Send,
{
    fn report(&self, update: ProgressUpdate) {
        if let Ok(sender) = self.sender.lock() {
            let _ = sender.send(update.into());
        }
    }
}

/// Progress sink that records every update in memory.
#[derive(Debug, Default)]
pub struct RecordingProgress {
    updates: Mutex<Vec<ProgressUpdate>>,
}

impl RecordingProgress {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// All updates received so far.
    pub fn updates(&self) -> Vec<ProgressUpdate> {
        self.updates.lock().map(|u| u.clone()).unwrap_or_default()
    }

    /// Percent values received so far.
    pub fn percents(&self) -> Vec<f32> {
        self.updates().iter().map(|u| u.percent).collect()
    }
}

impl ProgressSink for RecordingProgress {
    fn report(&self, update: ProgressUpdate) {
        if let Ok(mut updates) = self.updates.lock() {
            updates.push(update);
        }
    }
}

/// Forwards updates to a sink while keeping percent values non-decreasing.
///
/// A value lower than the highest one already forwarded is raised to it.
pub struct ProgressGate<'a> {
    sink: &'a dyn ProgressSink,
    high_water: Cell<f32>,
}

impl<'a> ProgressGate<'a> {
    pub fn new(sink: &'a dyn ProgressSink) -> Self {
        Self { sink, high_water: Cell::new(0.0) }
    }

    /// Forward `percent` with `label`.
    pub fn report(&self, percent: f32, label: Option<&'static str>) {
        let percent = percent.max(self.high_water.get());
        let update = ProgressUpdate::new(percent, label);
        self.high_water.set(update.percent);
        self.sink.report(update);
    }

    /// Highest percent forwarded so far.
    pub fn current(&self) -> f32 {
        self.high_water.get()
    }
}

/// Render a fixed-width text bar for `percent`.
fn render_bar(percent: f32, width: usize) -> String {
    let filled = ((percent.clamp(0.0, 100.0) / 100.0) * width as f32).round() as usize;
    format!("[{}{}]", "#".repeat(filled), ".".repeat(width - filled))
}

/// Format a duration in milliseconds to a human-readable string.
pub fn format_duration(ms: u64) -> String {
    if ms < 1000 {
        format!("{}ms", ms)
    } else if ms < 60_000 {
        format!("{:.1}s", ms as f64 / 1000.0)
    } else {
        let minutes = ms / 60_000;
        let seconds = (ms % 60_000) / 1000;
        format!("{}m {}s", minutes, seconds)
    }
}
