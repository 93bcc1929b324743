//! Device buffer accounting
//!
//! Buffers are charged against a [`MemoryTracker`] when created and released
//! when dropped, so a buffer held by a scope is returned on every exit path.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[derive(Debug, Default)]
struct Counters {
    live_bytes: AtomicUsize,
    live_buffers: AtomicUsize,
    peak_bytes: AtomicUsize,
    total_allocations: AtomicUsize,
}

/// Shared memory counters of one device
#[derive(Debug, Clone, Default)]
pub struct MemoryTracker {
    counters: Arc<Counters>,
}

/// Snapshot of a [`MemoryTracker`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MemoryStats {
    /// Bytes currently allocated
    pub live_bytes: usize,
    /// Buffers currently allocated
    pub live_buffers: usize,
    /// Highest `live_bytes` seen
    pub peak_bytes: usize,
    /// Buffers allocated over the tracker's lifetime
    pub total_allocations: usize,
}

impl MemoryTracker {
    /// Create an empty tracker
    pub fn new() -> Self {
        Self::default()
    }

    /// Upload `data` into a new tracked buffer
    pub fn upload(&self, label: impl Into<String>, data: Vec<u8>) -> DeviceBuffer {
        let size = data.len();
        let live = self.counters.live_bytes.fetch_add(size, Ordering::Relaxed) + size;
        self.counters.live_buffers.fetch_add(1, Ordering::Relaxed);
        self.counters.total_allocations.fetch_add(1, Ordering::Relaxed);
        self.counters.peak_bytes.fetch_max(live, Ordering::Relaxed);

        let label = label.into();
        log::trace!("Allocated device buffer '{}' ({} bytes)", label, size);
        DeviceBuffer {
            tracker: self.clone(),
            label,
            data,
        }
    }

    /// Current counters
    pub fn stats(&self) -> MemoryStats {
        MemoryStats {
            live_bytes: self.counters.live_bytes.load(Ordering::Relaxed),
            live_buffers: self.counters.live_buffers.load(Ordering::Relaxed),
            peak_bytes: self.counters.peak_bytes.load(Ordering::Relaxed),
            total_allocations: self.counters.total_allocations.load(Ordering::Relaxed),
        }
    }

    fn release(&self, size: usize) {
        self.counters.live_bytes.fetch_sub(size, Ordering::Relaxed);
        self.counters.live_buffers.fetch_sub(1, Ordering::Relaxed);
    }
}

/// Raw buffer owned by a device, released on drop
#[derive(Debug)]
pub struct DeviceBuffer {
    tracker: MemoryTracker,
    label: String,
    data: Vec<u8>,
}

impl DeviceBuffer {
    /// Debug label
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Raw contents
    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    /// Size in bytes
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the buffer holds no bytes
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl Drop for DeviceBuffer {
    fn drop(&mut self) {
        log::trace!("Released device buffer '{}' ({} bytes)", self.label, self.data.len());
        self.tracker.release(self.data.len());
    }
}
