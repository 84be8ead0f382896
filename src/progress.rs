// src/progress.rs

//! Progress reporting for batch archive processing
//!
//! `Migrator::extract_and_transform` walks every archive matched by a
//! pattern and reports through `ProgressTracker`. The CLI draws an
//! indicatif bar (`commands::progress`) on a terminal and falls back to
//! `LogProgress` otherwise; tests pass `SilentProgress`.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tracing::{info, warn};

/// Sink for progress updates
///
/// Implementations are `Send + Sync` so a tracker can be shared with a
/// rendering thread.
pub trait ProgressTracker: Send + Sync {
    /// Describe the item currently being worked on
    fn set_message(&self, message: &str);

    fn increment(&self, amount: u64);

    fn set_length(&self, length: u64);

    fn position(&self) -> u64;

    fn length(&self) -> u64;

    fn finish_with_message(&self, message: &str);

    fn finish_with_error(&self, message: &str);

    fn is_finished(&self) -> bool;
}

/// Position bookkeeping shared by the trackers below
#[derive(Debug, Default)]
struct Counter {
    position: AtomicU64,
    length: AtomicU64,
    finished: AtomicBool,
}

impl Counter {
    fn with_length(length: u64) -> Self {
        Self {
            length: AtomicU64::new(length),
            ..Default::default()
        }
    }

    fn advance(&self, amount: u64) -> u64 {
        self.position.fetch_add(amount, Ordering::Relaxed) + amount
    }

    fn finish(&self) {
        self.finished.store(true, Ordering::Relaxed);
    }
}

/// No-op tracker
#[derive(Debug, Default)]
pub struct SilentProgress {
    counter: Counter,
}

impl SilentProgress {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_length(length: u64) -> Self {
        Self {
            counter: Counter::with_length(length),
        }
    }
}

impl ProgressTracker for SilentProgress {
    fn set_message(&self, _message: &str) {}

    fn increment(&self, amount: u64) {
        self.counter.advance(amount);
    }

    fn set_length(&self, length: u64) {
        self.counter.length.store(length, Ordering::Relaxed);
    }

    fn position(&self) -> u64 {
        self.counter.position.load(Ordering::Relaxed)
    }

    fn length(&self) -> u64 {
        self.counter.length.load(Ordering::Relaxed)
    }

    fn finish_with_message(&self, _message: &str) {
        self.counter.finish();
    }

    fn finish_with_error(&self, _message: &str) {
        self.counter.finish();
    }

    fn is_finished(&self) -> bool {
        self.counter.finished.load(Ordering::Relaxed)
    }
}

/// Tracker that writes each step to the tracing log
#[derive(Debug)]
pub struct LogProgress {
    name: String,
    counter: Counter,
}

impl LogProgress {
    pub fn new(name: impl Into<String>, length: u64) -> Self {
        Self {
            name: name.into(),
            counter: Counter::with_length(length),
        }
    }
}

impl ProgressTracker for LogProgress {
    fn set_message(&self, message: &str) {
        info!("{}: {}", self.name, message);
    }

    fn increment(&self, amount: u64) {
        let position = self.counter.advance(amount);
        let length = self.length();
        if length > 0 {
            info!("{}: {}/{}", self.name, position.min(length), length);
        }
    }

    fn set_length(&self, length: u64) {
        self.counter.length.store(length, Ordering::Relaxed);
    }

    fn position(&self) -> u64 {
        self.counter.position.load(Ordering::Relaxed)
    }

    fn length(&self) -> u64 {
        self.counter.length.load(Ordering::Relaxed)
    }

    fn finish_with_message(&self, message: &str) {
        self.counter.finish();
        info!("{}: {}", self.name, message);
    }

    fn finish_with_error(&self, message: &str) {
        self.counter.finish();
        warn!("{}: {}", self.name, message);
    }

    fn is_finished(&self) -> bool {
        self.counter.finished.load(Ordering::Relaxed)
    }
}
