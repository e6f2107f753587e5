//! Observability and Metrics
//!
//! Counters for monitoring codec throughput and failure rates.
//!
//! Uses atomic counters for thread-safe metrics collection. Every
//! [`CodecManager`](crate::protocol::manager::CodecManager) owns one
//! [`CodecMetrics`].

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tracing::{debug, info};

/// Metrics collector for marshal and unmarshal calls
#[derive(Debug)]
pub struct CodecMetrics {
    /// Total marshal calls
    pub marshal_total: AtomicU64,
    /// Failed marshal calls
    pub marshal_failed: AtomicU64,
    /// Total unmarshal calls
    pub unmarshal_total: AtomicU64,
    /// Failed unmarshal calls
    pub unmarshal_failed: AtomicU64,
    /// Bytes produced by successful marshal calls
    pub bytes_encoded: AtomicU64,
    /// Bytes consumed by successful unmarshal calls
    pub bytes_decoded: AtomicU64,
    /// Calls naming a version with no registered codec
    pub unknown_versions: AtomicU64,
    /// Start time for uptime calculation
    start_time: Instant,
}

impl CodecMetrics {
    /// Create a new metrics collector
    pub fn new() -> Self {
        Self {
            marshal_total: AtomicU64::new(0),
            marshal_failed: AtomicU64::new(0),
            unmarshal_total: AtomicU64::new(0),
            unmarshal_failed: AtomicU64::new(0),
            bytes_encoded: AtomicU64::new(0),
            bytes_decoded: AtomicU64::new(0),
            unknown_versions: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    /// Record a successful marshal
    pub fn marshal_success(&self, byte_count: u64) {
        self.marshal_total.fetch_add(1, Ordering::Relaxed);
        self.bytes_encoded.fetch_add(byte_count, Ordering::Relaxed);
    }

    /// Record a failed marshal
    pub fn marshal_failure(&self) {
        self.marshal_total.fetch_add(1, Ordering::Relaxed);
        self.marshal_failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a successful unmarshal
    pub fn unmarshal_success(&self, byte_count: u64) {
        self.unmarshal_total.fetch_add(1, Ordering::Relaxed);
        self.bytes_decoded.fetch_add(byte_count, Ordering::Relaxed);
    }

    /// Record a failed unmarshal
    pub fn unmarshal_failure(&self) {
        self.unmarshal_total.fetch_add(1, Ordering::Relaxed);
        self.unmarshal_failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a lookup of an unregistered version
    pub fn unknown_version(&self) {
        self.unknown_versions.fetch_add(1, Ordering::Relaxed);
    }

    /// Get current metrics snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            marshal_total: self.marshal_total.load(Ordering::Relaxed),
            marshal_failed: self.marshal_failed.load(Ordering::Relaxed),
            unmarshal_total: self.unmarshal_total.load(Ordering::Relaxed),
            unmarshal_failed: self.unmarshal_failed.load(Ordering::Relaxed),
            bytes_encoded: self.bytes_encoded.load(Ordering::Relaxed),
            bytes_decoded: self.bytes_decoded.load(Ordering::Relaxed),
            unknown_versions: self.unknown_versions.load(Ordering::Relaxed),
            uptime_seconds: self.start_time.elapsed().as_secs(),
        }
    }

    /// Log current metrics
    pub fn log_metrics(&self) {
        let snapshot = self.snapshot();
        info!(
            marshal_total = snapshot.marshal_total,
            marshal_failed = snapshot.marshal_failed,
            unmarshal_total = snapshot.unmarshal_total,
            unmarshal_failed = snapshot.unmarshal_failed,
            bytes_encoded = snapshot.bytes_encoded,
            bytes_decoded = snapshot.bytes_decoded,
            unknown_versions = snapshot.unknown_versions,
            uptime_seconds = snapshot.uptime_seconds,
            "Codec metrics snapshot"
        );
    }
}

impl Default for CodecMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of metrics at a point in time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub marshal_total: u64,
    pub marshal_failed: u64,
    pub unmarshal_total: u64,
    pub unmarshal_failed: u64,
    pub bytes_encoded: u64,
    pub bytes_decoded: u64,
    pub unknown_versions: u64,
    pub uptime_seconds: u64,
}

/// Timer for measuring operation duration
pub struct Timer {
    start: Instant,
    operation: &'static str,
}

impl Timer {
    /// Start timing an operation
    pub fn start(operation: &'static str) -> Self {
        Self {
            start: Instant::now(),
            operation,
        }
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        let duration = self.start.elapsed();
        debug!(
            operation = self.operation,
            duration_us = duration.as_micros() as u64,
            "Operation completed"
        );
    }
}
