//! External services for the coordinator.
//!
//! Services provide external dependencies (time, the download side effect)
//! to the coordinator without coupling it to specific implementations.

use crate::coordinator::saver::ImageSaver;
use crate::domain::types::UsageDay;
use std::fmt::Debug;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex};

/// Source of wall-clock time and of the process-local calendar day.
pub trait Clock: Send + Sync + Debug {
    /// Milliseconds since the Unix epoch.
    fn now_millis(&self) -> i64;

    /// Today's calendar day in process-local time.
    fn today(&self) -> UsageDay;
}

/// The real clock.
#[derive(Debug, Clone, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }

    fn today(&self) -> UsageDay {
        UsageDay(chrono::Local::now().format("%Y-%m-%d").to_string())
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    millis: AtomicI64,
    day: Mutex<UsageDay>,
}

impl ManualClock {
    pub fn new(millis: i64, day: &str) -> Self {
        Self {
            millis: AtomicI64::new(millis),
            day: Mutex::new(UsageDay::from(day)),
        }
    }

    pub fn advance_millis(&self, delta: i64) {
        self.millis.fetch_add(delta, Ordering::SeqCst);
    }

    pub fn set_day(&self, day: &str) {
        if let Ok(mut current) = self.day.lock() {
            *current = UsageDay::from(day);
        }
    }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> i64 {
        self.millis.load(Ordering::SeqCst)
    }

    fn today(&self) -> UsageDay {
        self.day
            .lock()
            .map(|day| day.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }
}

/// Services injected into the coordinator.
#[derive(Clone)]
pub struct CoordinatorServices {
    pub clock: Arc<dyn Clock>,
    pub saver: Arc<dyn ImageSaver>,
}

impl CoordinatorServices {
    pub fn new(clock: Arc<dyn Clock>, saver: Arc<dyn ImageSaver>) -> Self {
        Self { clock, saver }
    }
}
