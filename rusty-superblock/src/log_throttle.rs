use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Emits a given (section, key) message at most once per time span.
///
/// Malformed triggers are re-offered every time they are relayed, and the
/// construction failures would otherwise flood the log. Keys are fixed call
/// sites, never message text, so the table stays as small as the number of
/// call sites.
#[derive(Debug)]
pub struct LogThrottle {
    span: Duration,
    last_emitted: HashMap<(&'static str, &'static str), Instant>,
}

impl Default for LogThrottle {
    fn default() -> Self {
        Self::new(Duration::from_secs(300))
    }
}

impl LogThrottle {
    pub fn new(span: Duration) -> Self {
        Self {
            span,
            last_emitted: HashMap::new(),
        }
    }

    /// Returns true if `section`/`key` has not been emitted within the span, and records it.
    pub fn should_log(&mut self, section: &'static str, key: &'static str) -> bool {
        self.should_log_at(section, key, Instant::now())
    }

    /// Number of (section, key) pairs tracked.
    pub fn len(&self) -> usize {
        self.last_emitted.len()
    }

    pub fn is_empty(&self) -> bool {
        self.last_emitted.is_empty()
    }

    fn should_log_at(&mut self, section: &'static str, key: &'static str, now: Instant) -> bool {
        match self.last_emitted.get(&(section, key)) {
            Some(last) if now.saturating_duration_since(*last) < self.span => false,
            _ => {
                self.last_emitted.insert((section, key), now);
                true
            }
        }
    }
}
