//! Sinks for task failures isolated during a cycle.

use crate::error::TaskError;
use std::sync::{Arc, Mutex};
use tracing::warn;

/// Receives every [`TaskError`] the runner swallows.
pub trait Notifier {
    fn notify(&self, error: &TaskError);
}

/// Logs failures through `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, error: &TaskError) {
        warn!(task = %error.task, "{}", error);
    }
}

/// Records failures in a shared buffer without logging them.
///
/// Hosts use it to report failures per tick; clones observe the same buffer.
/// Whoever drains the buffer is responsible for surfacing the errors.
#[derive(Debug, Clone, Default)]
pub struct CollectingNotifier {
    errors: Arc<Mutex<Vec<TaskError>>>,
}

impl CollectingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything recorded so far.
    pub fn errors(&self) -> Vec<TaskError> {
        self.errors
            .lock()
            .map(|errors| errors.clone())
            .unwrap_or_default()
    }

    /// Remove and return everything recorded so far.
    pub fn drain(&self) -> Vec<TaskError> {
        self.errors
            .lock()
            .map(|mut errors| std::mem::take(&mut *errors))
            .unwrap_or_default()
    }
}

impl Notifier for CollectingNotifier {
    fn notify(&self, error: &TaskError) {
        if let Ok(mut errors) = self.errors.lock() {
            errors.push(error.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use tracing_subscriber::fmt::MakeWriter;

    /// Log sink shared between the subscriber and the test.
    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl CapturedLogs {
        fn text(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    impl io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for CapturedLogs {
        type Writer = CapturedLogs;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    fn logs_while(f: impl FnOnce()) -> String {
        let logs = CapturedLogs::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(logs.clone())
            .with_ansi(false)
            .finish();
        tracing::subscriber::with_default(subscriber, f);
        logs.text()
    }

    #[test]
    fn test_collecting_notifier_does_not_log() {
        let notifier = CollectingNotifier::new();

        let output = logs_while(|| notifier.notify(&TaskError::new("cpu", "boom")));

        assert!(output.is_empty(), "unexpected log output: {}", output);
        assert_eq!(notifier.errors().len(), 1);
    }

    #[test]
    fn test_tracing_notifier_logs_warning() {
        let output = logs_while(|| TracingNotifier.notify(&TaskError::new("cpu", "boom")));

        assert!(output.contains("WARN"));
        assert!(output.contains("task 'cpu' failed: boom"));
    }

    #[test]
    fn test_collecting_notifier_records_and_drains() {
        let notifier = CollectingNotifier::new();
        let handle = notifier.clone();

        notifier.notify(&TaskError::new("cpu", "boom"));
        notifier.notify(&TaskError::new("mem", "bang"));

        assert_eq!(handle.errors().len(), 2);
        assert_eq!(handle.errors()[0].task, "cpu");

        let drained = handle.drain();
        assert_eq!(drained.len(), 2);
        assert!(notifier.errors().is_empty());
    }
}
