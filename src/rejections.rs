use crate::domain::{Error, RejectionLog};

/// Emits every rejected ledger operation as a `warn!` event.
#[derive(Default, Debug)]
pub struct TracingRejectionLog {}

impl RejectionLog for TracingRejectionLog {
    fn report(&self, operation: &str, error: &Error) {
        tracing::warn!(operation, code = error.code(), "rejected: {}", error);
    }
}

/// Keeps rejections in memory so tests can assert on them.
#[cfg(test)]
#[derive(Default, Debug)]
pub(crate) struct RecordingRejectionLog {
    entries: std::sync::Mutex<Vec<(String, String)>>,
}

#[cfg(test)]
impl RecordingRejectionLog {
    pub fn entries(&self) -> Vec<(String, String)> {
        self.entries
            .lock()
            .map(|e| e.clone())
            .unwrap_or_default()
    }
}

#[cfg(test)]
impl RejectionLog for RecordingRejectionLog {
    fn report(&self, operation: &str, error: &Error) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.push((operation.to_string(), error.code().to_string()));
        }
    }
}
