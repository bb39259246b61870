//! Result sinks.
//!
//! The comparator and orchestrator report every outcome through a
//! [`ResultSink`]; the sink alone decides how it surfaces. All sinks share
//! one lifecycle: `start` resets per-interaction state, any number of
//! `warn`/`fail` calls follow, and `end` finalizes.

use std::io::{self, Write};
use tracing::Level;

use crate::contract::Interaction;
use crate::path::Path;

/// Observer of verification outcomes.
///
/// Sinks hold per-interaction buffers without synchronization; give each
/// concurrent verification its own instance.
pub trait ResultSink {
    /// Begin an interaction: reset `success` and buffers, emit a banner.
    fn start(&mut self, consumer: &str, interaction: &Interaction);

    /// Record a non-fatal note.
    fn warn(&mut self, message: &str);

    /// Record a mismatch, optionally located at `path`, and mark the
    /// interaction failed.
    ///
    /// Always returns `false` so matchers can `return sink.fail(..)`.
    fn fail(&mut self, message: &str, path: Option<&Path>) -> bool;

    /// Finish the interaction.
    fn end(&mut self);

    /// Whether no failure was recorded since the last `start`.
    fn success(&self) -> bool;
}

/// `message` with ` at <path>` appended when a path is given.
#[must_use]
pub fn render(message: &str, path: Option<&Path>) -> String {
    match path {
        Some(path) if !path.is_empty() => format!("{message} at {path}"),
        _ => message.to_string(),
    }
}

/// Whether a message of `severity` passes a `threshold`.
fn admits(threshold: Level, severity: Level) -> bool {
    verbosity(severity) <= verbosity(threshold)
}

fn verbosity(level: Level) -> u8 {
    if level == Level::ERROR {
        0
    } else if level == Level::WARN {
        1
    } else if level == Level::INFO {
        2
    } else if level == Level::DEBUG {
        3
    } else {
        4
    }
}

/// Console sink: buffers messages per interaction and prints a
/// `PASSED`/`FAILED` line followed by them at `end`.
pub struct CaptureResult<W: Write = io::Stdout> {
    writer: W,
    level: Level,
    messages: Vec<String>,
    current_consumer: Option<String>,
    success: bool,
}

impl CaptureResult<io::Stdout> {
    /// Console sink writing to stdout.
    #[must_use]
    pub fn new(level: Level) -> Self {
        Self::with_writer(io::stdout(), level)
    }
}

impl<W: Write> CaptureResult<W> {
    /// Console sink writing to `writer`.
    pub const fn with_writer(writer: W, level: Level) -> Self {
        Self {
            writer,
            level,
            messages: Vec::new(),
            current_consumer: None,
            success: true,
        }
    }

    /// Messages buffered for the current interaction.
    #[must_use]
    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    /// Consume the sink and return its writer.
    pub fn into_inner(self) -> W {
        self.writer
    }

    fn emit(&mut self, text: &str) {
        if let Err(e) = self.writer.write_all(text.as_bytes()) {
            tracing::warn!(error = %e, "failed to write verification output");
        }
    }
}

impl<W: Write> ResultSink for CaptureResult<W> {
    fn start(&mut self, consumer: &str, interaction: &Interaction) {
        self.success = true;
        self.messages.clear();
        if self.current_consumer.as_deref() != Some(consumer) {
            self.emit(&format!("Consumer: {consumer}\n"));
            self.current_consumer = Some(consumer.to_string());
        }
        self.emit(&format!("Request: \"{}\" ... ", interaction.description));
    }

    fn warn(&mut self, message: &str) {
        if admits(self.level, Level::WARN) {
            self.messages.push(format!(" {message}"));
        }
    }

    fn fail(&mut self, message: &str, path: Option<&Path>) -> bool {
        self.success = false;
        self.messages.push(format!(" {}", render(message, path)));
        false
    }

    fn end(&mut self) {
        let verdict = if self.success { "PASSED\n" } else { "FAILED\n" };
        self.emit(verdict);
        if !self.messages.is_empty() {
            let body = format!("{}\n", self.messages.join("\n"));
            self.emit(&body);
        }
        if let Err(e) = self.writer.flush() {
            tracing::warn!(error = %e, "failed to flush verification output");
        }
    }

    fn success(&self) -> bool {
        self.success
    }
}

/// Sink that forwards everything to `tracing`.
#[derive(Debug, Clone)]
pub struct LoggedResult {
    level: Level,
    success: bool,
}

impl LoggedResult {
    /// Log-forwarding sink; banners are logged when `level` admits INFO.
    #[must_use]
    pub const fn new(level: Level) -> Self {
        Self {
            level,
            success: true,
        }
    }
}

impl Default for LoggedResult {
    fn default() -> Self {
        Self::new(Level::INFO)
    }
}

impl ResultSink for LoggedResult {
    fn start(&mut self, consumer: &str, interaction: &Interaction) {
        self.success = true;
        if admits(self.level, Level::INFO) {
            tracing::info!(consumer, "Verifying {interaction}");
        }
    }

    fn warn(&mut self, message: &str) {
        if admits(self.level, Level::WARN) {
            tracing::warn!(" {message}");
        }
    }

    fn fail(&mut self, message: &str, path: Option<&Path>) -> bool {
        self.success = false;
        tracing::warn!(" {}", render(message, path));
        false
    }

    fn end(&mut self) {}

    fn success(&self) -> bool {
        self.success
    }
}

/// Test-harness sink: collects failures and panics with all of them at
/// `end`, failing the enclosing test.
#[derive(Debug, Clone)]
pub struct AssertResult {
    level: Level,
    description: String,
    failures: Vec<String>,
    success: bool,
}

impl AssertResult {
    /// Assertion sink.
    #[must_use]
    pub const fn new(level: Level) -> Self {
        Self {
            level,
            description: String::new(),
            failures: Vec::new(),
            success: true,
        }
    }

    /// Failures recorded for the current interaction.
    #[must_use]
    pub fn failures(&self) -> &[String] {
        &self.failures
    }
}

impl Default for AssertResult {
    fn default() -> Self {
        Self::new(Level::WARN)
    }
}

impl ResultSink for AssertResult {
    fn start(&mut self, _consumer: &str, interaction: &Interaction) {
        self.success = true;
        self.failures.clear();
        self.description = interaction.to_string();
    }

    fn warn(&mut self, message: &str) {
        if admits(self.level, Level::WARN) {
            tracing::warn!("{message}");
        }
    }

    fn fail(&mut self, message: &str, path: Option<&Path>) -> bool {
        self.success = false;
        let message = render(message, path);
        tracing::error!("{message}");
        self.failures.push(message);
        false
    }

    /// # Panics
    ///
    /// Panics listing every recorded failure if the interaction failed.
    fn end(&mut self) {
        if !self.success {
            panic!(
                "pact verification failed for {}:\n  {}",
                self.description,
                self.failures.join("\n  ")
            );
        }
    }

    fn success(&self) -> bool {
        self.success
    }
}

#[cfg(test)]
#[derive(Debug)]
pub(crate) struct CollectingResult {
    pub(crate) failures: Vec<String>,
    pub(crate) warnings: Vec<String>,
    success: bool,
}

#[cfg(test)]
impl Default for CollectingResult {
    fn default() -> Self {
        Self {
            failures: Vec::new(),
            warnings: Vec::new(),
            success: true,
        }
    }
}

#[cfg(test)]
impl ResultSink for CollectingResult {
    fn start(&mut self, _consumer: &str, _interaction: &Interaction) {
        self.success = true;
        self.failures.clear();
        self.warnings.clear();
    }

    fn warn(&mut self, message: &str) {
        self.warnings.push(message.to_string());
    }

    fn fail(&mut self, message: &str, path: Option<&Path>) -> bool {
        self.success = false;
        self.failures.push(render(message, path));
        false
    }

    fn end(&mut self) {}

    fn success(&self) -> bool {
        self.success
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::{Request, Response};

    fn interaction(description: &str) -> Interaction {
        Interaction::new(description, Request::new("GET", "/"), Response::new(200))
    }

    #[test]
    fn test_render_appends_path() {
        let path = Path::root("body").key("a");
        assert_eq!(render("boom", Some(&path)), "boom at body.a");
        assert_eq!(render("boom", None), "boom");
    }

    #[test]
    fn test_capture_output() {
        let mut sink = CaptureResult::with_writer(Vec::new(), Level::INFO);
        sink.start("web", &interaction("get user"));
        sink.end();
        sink.start("web", &interaction("delete user"));
        assert!(!sink.fail("expected 200 but got 500", Some(&Path::root("status"))));
        sink.end();
        sink.start("app", &interaction("list users"));
        sink.end();

        let out = String::from_utf8(sink.into_inner()).unwrap();
        assert_eq!(
            out,
            "Consumer: web\n\
             Request: \"get user\" ... PASSED\n\
             Request: \"delete user\" ... FAILED\n expected 200 but got 500 at status\n\
             Consumer: app\n\
             Request: \"list users\" ... PASSED\n"
        );
    }

    #[test]
    fn test_capture_start_resets_state() {
        let mut sink = CaptureResult::with_writer(Vec::new(), Level::INFO);
        sink.start("web", &interaction("a"));
        sink.fail("bad", None);
        assert!(!sink.success());
        assert_eq!(sink.messages().len(), 1);

        sink.start("web", &interaction("b"));
        assert!(sink.success());
        assert!(sink.messages().is_empty());
    }

    #[test]
    fn test_capture_level_filters_warnings() {
        let mut sink = CaptureResult::with_writer(Vec::new(), Level::ERROR);
        sink.start("web", &interaction("a"));
        sink.warn("just a note");
        assert!(sink.messages().is_empty());
        assert!(sink.success());
    }

    #[test]
    fn test_logged_result_tracks_success() {
        let mut sink = LoggedResult::default();
        sink.start("web", &interaction("a"));
        sink.warn("note");
        assert!(sink.success());
        sink.fail("bad", None);
        assert!(!sink.success());
        sink.end();
        sink.start("web", &interaction("b"));
        assert!(sink.success());
    }

    #[test]
    fn test_assert_result_passes_quietly() {
        let mut sink = AssertResult::default();
        sink.start("web", &interaction("a"));
        sink.warn("note");
        sink.end();
        assert!(sink.success());
    }

    #[test]
    #[should_panic(expected = "missing key \"b\" at body.b")]
    fn test_assert_result_panics_with_failures() {
        let mut sink = AssertResult::default();
        sink.start("web", &interaction("a"));
        sink.fail("missing key \"b\"", Some(&Path::root("body").key("b")));
        assert_eq!(sink.failures().len(), 1);
        sink.end();
    }
}
