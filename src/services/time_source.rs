//! Clock abstraction so cache expiry can be tested without sleeping

use std::fmt::Debug;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Source of the current time
pub trait TimeSource: Debug + Send + Sync {
    fn now(&self) -> Instant;
}

/// Shared handle to a time source
pub type SharedTimeSource = Arc<dyn TimeSource>;

/// Wall clock
#[derive(Debug, Default, Clone, Copy)]
pub struct RealTimeSource;

impl TimeSource for RealTimeSource {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

impl RealTimeSource {
    pub fn shared() -> SharedTimeSource {
        Arc::new(RealTimeSource)
    }
}

/// Manually advanced clock for tests
#[derive(Debug)]
pub struct TestTimeSource {
    start: Instant,
    offset: Mutex<Duration>,
}

impl TestTimeSource {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
            offset: Mutex::new(Duration::ZERO),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut offset = self.offset.lock().unwrap_or_else(|e| e.into_inner());
        *offset += by;
    }
}

impl Default for TestTimeSource {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for TestTimeSource {
    fn now(&self) -> Instant {
        let offset = *self.offset.lock().unwrap_or_else(|e| e.into_inner());
        self.start + offset
    }
}
